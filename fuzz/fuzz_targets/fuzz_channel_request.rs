//! Fuzz target: `CommandChannel` request building
//!
//! Any address and ventilation position must yield a URL that fits the
//! fixed buffer and a body that parses back as JSON.
//!
//! cargo fuzz run fuzz_channel_request

#![no_main]

use std::net::Ipv4Addr;

use libfuzzer_sys::fuzz_target;
use shutterpad::shutter::ActuatorAddress;
use shutterpad::shutter::channel::{CoverOperation, ShutterCommand, URL_CAP, rpc_body, rpc_url};

fuzz_target!(|input: ([u8; 4], u8)| {
    let (octets, pos) = input;
    let address = ActuatorAddress::new(Ipv4Addr::from(octets));

    for op in [
        CoverOperation::Open,
        CoverOperation::Close,
        CoverOperation::Stop,
        CoverOperation::GoToPosition,
        CoverOperation::GetStatus,
    ] {
        let url = rpc_url(address, op).expect("dotted quad always fits");
        assert!(url.len() <= URL_CAP);
    }

    let body = rpc_body(ShutterCommand::GoToPosition(pos));
    let value: serde_json::Value = serde_json::from_slice(&body).expect("valid JSON body");
    assert_eq!(value["pos"].as_u64(), Some(u64::from(pos)));
});

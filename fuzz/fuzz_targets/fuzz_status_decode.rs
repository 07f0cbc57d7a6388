//! Fuzz target: `status::decode`
//!
//! Drives arbitrary bytes through the status decoder and asserts that it
//! never panics and agrees with `try_decode`.  The body is first clipped
//! to the response buffer capacity, as the channel does.
//!
//! cargo fuzz run fuzz_status_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use shutterpad::shutter::channel::STATUS_BODY_CAP;
use shutterpad::shutter::status::{self, ActuatorStatus};

fuzz_target!(|data: &[u8]| {
    let body = &data[..data.len().min(STATUS_BODY_CAP)];

    let status = status::decode(body);
    match status::try_decode(body) {
        Ok(s) => {
            assert_eq!(s, status);
            assert_ne!(
                s, ActuatorStatus::Unknown,
                "Unknown is never a decoded literal"
            );
        }
        Err(_) => assert_eq!(status, ActuatorStatus::Unknown),
    }
});

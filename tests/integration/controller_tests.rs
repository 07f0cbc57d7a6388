//! End-to-end controller scenarios: buttons in, RPC traffic and NVS writes
//! out, all against mock ports.

use std::net::Ipv4Addr;

use shutterpad::app::commands::{Button, ButtonSet, InputEvent};
use shutterpad::app::events::{AddressSource, AppEvent};
use shutterpad::app::ports::HttpMethod;
use shutterpad::error::TransportError;
use shutterpad::power::PowerState;
use shutterpad::shutter::channel::{CommandChannel, STATUS_BODY_CAP, ShutterCommand};
use shutterpad::shutter::status::{self, ActuatorStatus};
use shutterpad::shutter::{ActuatorAddress, ShutterId, ShutterPair};

use crate::mocks::{
    LOCAL, MockNetwork, MockStorage, Rig, SHUTTER_1_IP, SHUTTER_2_IP, ScriptedButtons,
};

fn set(buttons: &[Button]) -> ButtonSet {
    buttons.iter().copied().collect()
}

fn resolved_pair() -> ShutterPair<ActuatorAddress> {
    ShutterPair::new(
        ActuatorAddress::new(SHUTTER_1_IP),
        ActuatorAddress::new(SHUTTER_2_IP),
    )
}

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn cached_start_does_not_probe_or_write() {
    let mut rig = Rig::cached();
    rig.start(ButtonSet::EMPTY);

    assert_eq!(rig.network.probe_count(), 0);
    assert_eq!(rig.storage.commits(), 0);
    assert_eq!(rig.controller.addresses(), &resolved_pair());
    assert_eq!(
        rig.sink.events,
        vec![
            AppEvent::Started(ButtonSet::EMPTY),
            AppEvent::AddressesResolved {
                source: AddressSource::Cached,
                addresses: resolved_pair(),
            },
        ]
    );
}

#[test]
fn cold_start_discovers_both_and_commits_once() {
    let mut rig = Rig::new(Rig::lan(), MockStorage::default());
    rig.start(ButtonSet::EMPTY);

    assert_eq!(rig.controller.addresses(), &resolved_pair());
    assert_eq!(
        rig.storage.commits(),
        1,
        "pair must be written in one commit"
    );
    assert_eq!(rig.storage.address("ip1"), Some(SHUTTER_1_IP));
    assert_eq!(rig.storage.address("ip2"), Some(SHUTTER_2_IP));
    assert!(rig.sink.events.contains(&AppEvent::AddressesResolved {
        source: AddressSource::ColdStart,
        addresses: resolved_pair(),
    }));

    // .23 found at the checkpoint after host 30, .77 after host 80; our own
    // address is never probed.
    assert_eq!(rig.network.probe_count(), 30 + 79);
    assert!(!rig.network.probes().contains(&LOCAL));
}

#[test]
fn partial_cache_only_discovers_the_missing_shutter() {
    let storage = MockStorage::with_pair(SHUTTER_1_IP, SHUTTER_2_IP);
    storage
        .store
        .borrow_mut()
        .values
        .retain(|(_, key), _| key == "ip1");

    let mut rig = Rig::new(Rig::lan(), storage);
    rig.start(ButtonSet::EMPTY);

    assert_eq!(rig.network.probe_count(), 79);
    assert_eq!(rig.storage.commits(), 1);
    assert_eq!(rig.storage.address("ip2"), Some(SHUTTER_2_IP));
    assert_eq!(rig.controller.addresses(), &resolved_pair());
}

#[test]
fn unresolved_shutter_is_stored_as_sentinel() {
    let network = MockNetwork::new(Some(LOCAL))
        .with_host(SHUTTER_1_IP, shutterpad::config::SHUTTER_1);
    let mut rig = Rig::new(network, MockStorage::default());
    rig.start(ButtonSet::EMPTY);

    assert_eq!(rig.controller.addresses().second, ActuatorAddress::SENTINEL);
    assert_eq!(rig.storage.address("ip2"), Some(Ipv4Addr::BROADCAST));
    assert_eq!(rig.storage.commits(), 1);
}

#[test]
fn no_local_address_resolves_sentinels_without_probing() {
    let mut rig = Rig::new(MockNetwork::new(None), MockStorage::default());
    rig.start(ButtonSet::EMPTY);

    assert_eq!(rig.network.probe_count(), 0);
    assert!(rig.controller.addresses().first.is_sentinel());
    assert!(rig.controller.addresses().second.is_sentinel());
}

#[test]
fn boot_buttons_dispatch_on_first_tick_without_polling() {
    let mut rig = Rig::cached();
    rig.start(ButtonSet::from(Button::Up));
    assert_eq!(rig.controller.pending(), ButtonSet::from(Button::Up));

    let mut buttons = ScriptedButtons::default();
    rig.tick(&mut buttons);

    assert_eq!(buttons.polls, 0);
    let ops: Vec<_> = rig
        .transport
        .posts()
        .iter()
        .map(|r| (r.target(), r.operation().to_owned()))
        .collect();
    assert_eq!(
        ops,
        vec![
            (SHUTTER_1_IP, "Open".to_owned()),
            (SHUTTER_2_IP, "Open".to_owned()),
        ]
    );
    assert!(rig.controller.pending().is_empty());
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn up_and_down_drive_both_shutters() {
    let mut rig = Rig::cached();
    rig.start(ButtonSet::EMPTY);

    let mut buttons = ScriptedButtons::new([ButtonSet::from(Button::Down)]);
    rig.tick(&mut buttons);

    let posts = rig.transport.posts();
    assert_eq!(posts.len(), 2);
    for (req, ip) in posts.iter().zip([SHUTTER_1_IP, SHUTTER_2_IP]) {
        assert_eq!(req.url, format!("http://{ip}/rpc/Cover.Close"));
        assert_eq!(req.body, r#"{"id":0}"#);
    }
    // Each exchange is followed by the 200 ms settle delay.
    assert_eq!(rig.clock.now.get(), 400);
}

#[test]
fn stop_snapshots_both_then_acts_per_shutter() {
    let mut rig = Rig::cached();
    rig.transport.serve_status(SHUTTER_1_IP, "open");
    rig.transport.serve_status(SHUTTER_2_IP, "closing");
    rig.start(ButtonSet::EMPTY);
    rig.sink.take();

    let mut buttons = ScriptedButtons::new([ButtonSet::from(Button::Stop)]);
    rig.tick(&mut buttons);

    let requests = rig.transport.requests();
    let summary: Vec<_> = requests
        .iter()
        .map(|r| (r.method, r.target(), r.operation().to_owned(), r.body.clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (
                HttpMethod::Get,
                SHUTTER_1_IP,
                "GetStatus".to_owned(),
                String::new()
            ),
            (
                HttpMethod::Get,
                SHUTTER_2_IP,
                "GetStatus".to_owned(),
                String::new()
            ),
            (
                HttpMethod::Post,
                SHUTTER_1_IP,
                "GoToPosition".to_owned(),
                r#"{"id":0,"pos":17}"#.to_owned()
            ),
            (
                HttpMethod::Post,
                SHUTTER_2_IP,
                "Stop".to_owned(),
                r#"{"id":0}"#.to_owned()
            ),
        ]
    );
    assert!(requests[0].url.ends_with("?id=0"));

    assert_eq!(
        rig.sink.events,
        vec![
            AppEvent::Dispatched(InputEvent::Pressed(Button::Stop)),
            AppEvent::StatusPolled {
                shutter: ShutterId::First,
                status: ActuatorStatus::Open,
            },
            AppEvent::StatusPolled {
                shutter: ShutterId::Second,
                status: ActuatorStatus::Closing,
            },
            AppEvent::CommandIssued {
                shutter: ShutterId::First,
                command: ShutterCommand::GoToPosition(17),
            },
            AppEvent::CommandIssued {
                shutter: ShutterId::Second,
                command: ShutterCommand::Stop,
            },
        ]
    );
}

#[test]
fn stop_twice_follows_each_shutters_own_status() {
    let mut rig = Rig::cached();
    rig.transport.serve_status(SHUTTER_1_IP, "open");
    rig.transport.serve_status(SHUTTER_2_IP, "open");
    rig.start(ButtonSet::EMPTY);

    let mut buttons = ScriptedButtons::new([ButtonSet::from(Button::Stop)]);
    rig.tick(&mut buttons);
    let posts = rig.transport.posts();
    let first: Vec<_> = posts.iter().map(|r| r.body.clone()).collect();
    assert_eq!(first, vec![r#"{"id":0,"pos":17}"#; 2]);

    // Shutter 2 starts closing from its own remote.
    rig.transport.serve_status(SHUTTER_2_IP, "closing");
    rig.transport.wire.borrow_mut().requests.clear();
    buttons.push(ButtonSet::from(Button::Stop));
    rig.tick(&mut buttons);

    let second: Vec<_> = rig
        .transport
        .posts()
        .iter()
        .map(|r| (r.target(), r.operation().to_owned()))
        .collect();
    assert_eq!(
        second,
        vec![
            (SHUTTER_1_IP, "GoToPosition".to_owned()),
            (SHUTTER_2_IP, "Stop".to_owned()),
        ]
    );
}

#[test]
fn stop_with_unknown_status_skips_that_shutter() {
    let mut rig = Rig::cached();
    rig.transport.serve_raw(SHUTTER_1_IP, "<html>busy</html>");
    rig.transport.serve_status(SHUTTER_2_IP, "stopped");
    rig.start(ButtonSet::EMPTY);

    let mut buttons = ScriptedButtons::new([ButtonSet::from(Button::Stop)]);
    rig.tick(&mut buttons);

    let posts = rig.transport.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].target(), SHUTTER_2_IP);
    assert_eq!(posts[0].operation(), "GoToPosition");
    let skipped = AppEvent::StopSkipped(ShutterId::First);
    assert!(rig.sink.events.contains(&skipped));
}

#[test]
fn stop_with_oversized_status_body_is_unknown() {
    let mut rig = Rig::cached();
    let padded = format!(r#"{{"state":"open","pad":"{}"}}"#, "x".repeat(600));
    assert!(padded.len() > STATUS_BODY_CAP);
    rig.transport.serve_raw(SHUTTER_1_IP, &padded);
    rig.transport.serve_status(SHUTTER_2_IP, "open");

    // Only the first STATUS_BODY_CAP bytes survive, which no longer parse.
    let mut channel = CommandChannel::new(rig.transport.clone(), rig.clock.delay(), 0);
    let body = channel.query(ActuatorAddress::new(SHUTTER_1_IP)).unwrap();
    assert_eq!(body.len(), STATUS_BODY_CAP);
    assert_eq!(&body[..], &padded.as_bytes()[..STATUS_BODY_CAP]);
    assert_eq!(status::decode(&body), ActuatorStatus::Unknown);
    rig.transport.wire.borrow_mut().requests.clear();

    rig.start(ButtonSet::EMPTY);
    rig.sink.take();
    let mut buttons = ScriptedButtons::new([ButtonSet::from(Button::Stop)]);
    rig.tick(&mut buttons);

    let posts = rig.transport.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].target(), SHUTTER_2_IP);
    assert_eq!(posts[0].body, r#"{"id":0,"pos":17}"#);
    assert_eq!(
        rig.sink.events,
        vec![
            AppEvent::Dispatched(InputEvent::Pressed(Button::Stop)),
            AppEvent::StatusPolled {
                shutter: ShutterId::First,
                status: ActuatorStatus::Unknown,
            },
            AppEvent::StatusPolled {
                shutter: ShutterId::Second,
                status: ActuatorStatus::Open,
            },
            AppEvent::StopSkipped(ShutterId::First),
            AppEvent::CommandIssued {
                shutter: ShutterId::Second,
                command: ShutterCommand::GoToPosition(17),
            },
        ]
    );
}

#[test]
fn ventilation_position_follows_config() {
    let config = shutterpad::config::ControllerConfig {
        ventilation_position: 40,
        ..Default::default()
    };
    let mut rig = Rig::with_config(
        config,
        Rig::lan(),
        MockStorage::with_pair(SHUTTER_1_IP, SHUTTER_2_IP),
    );
    rig.transport.serve_status(SHUTTER_1_IP, "closed");
    rig.transport.serve_status(SHUTTER_2_IP, "closed");
    rig.start(ButtonSet::EMPTY);

    let mut buttons = ScriptedButtons::new([ButtonSet::from(Button::Stop)]);
    rig.tick(&mut buttons);

    let bodies: Vec<_> = rig.transport.posts().into_iter().map(|r| r.body).collect();
    assert_eq!(bodies, vec![r#"{"id":0,"pos":40}"#; 2]);
}

#[test]
fn buttons_in_one_tick_run_up_stop_down_in_order() {
    let mut rig = Rig::cached();
    rig.transport.serve_status(SHUTTER_1_IP, "opening");
    rig.transport.serve_status(SHUTTER_2_IP, "opening");
    rig.start(ButtonSet::EMPTY);

    let mut buttons = ScriptedButtons::new([set(&[Button::Stop, Button::Up])]);
    rig.tick(&mut buttons);

    let ops: Vec<_> = rig
        .transport
        .requests()
        .iter()
        .map(|r| r.operation().to_owned())
        .collect();
    assert_eq!(
        ops,
        vec!["Open", "Open", "GetStatus", "GetStatus", "Stop", "Stop"]
    );
    assert!(rig.controller.pending().is_empty());
}

#[test]
fn transport_failure_is_reported_and_ignored() {
    let mut rig = Rig::cached();
    rig.transport.fail(SHUTTER_2_IP, TransportError::Timeout);
    rig.transport
        .wire
        .borrow_mut()
        .http_status
        .insert(SHUTTER_1_IP, 503);
    rig.start(ButtonSet::EMPTY);
    rig.sink.take();

    let mut buttons = ScriptedButtons::new([ButtonSet::from(Button::Up)]);
    assert_eq!(rig.tick(&mut buttons), PowerState::Awake);

    assert_eq!(
        rig.sink.events[1..],
        [
            AppEvent::CommandFailed {
                shutter: ShutterId::First,
                command: ShutterCommand::Open,
                error: TransportError::Status(503),
            },
            AppEvent::CommandFailed {
                shutter: ShutterId::Second,
                command: ShutterCommand::Open,
                error: TransportError::Timeout,
            },
        ]
    );
    // No retries.
    assert_eq!(rig.transport.requests().len(), 2);
}

// ── Re-pair gesture ───────────────────────────────────────────

#[test]
fn repair_rediscovers_and_never_moves_shutters() {
    let stale = Ipv4Addr::new(192, 168, 1, 10);
    let mut rig = Rig::new(Rig::lan(), MockStorage::with_pair(stale, stale));
    rig.start(ButtonSet::EMPTY);
    assert_eq!(rig.controller.addresses().first.ip(), stale);
    rig.sink.take();

    let mut buttons = ScriptedButtons::new([set(&[Button::Up, Button::Down])]);
    rig.tick(&mut buttons);

    assert!(
        rig.transport.requests().is_empty(),
        "re-pair must not send Open/Close"
    );
    assert_eq!(rig.controller.addresses(), &resolved_pair());
    assert_eq!(rig.storage.commits(), 1);
    assert_eq!(rig.storage.address("ip1"), Some(SHUTTER_1_IP));
    assert_eq!(rig.storage.address("ip2"), Some(SHUTTER_2_IP));
    assert_eq!(
        rig.sink.events,
        vec![
            AppEvent::Dispatched(InputEvent::Repair),
            AppEvent::AddressesResolved {
                source: AddressSource::Repair,
                addresses: resolved_pair(),
            },
        ]
    );
}

#[test]
fn stop_held_through_repair_runs_on_next_tick() {
    let mut rig = Rig::cached();
    rig.transport.serve_status(SHUTTER_1_IP, "stopped");
    rig.transport.serve_status(SHUTTER_2_IP, "stopped");
    rig.start(ButtonSet::EMPTY);

    let mut buttons = ScriptedButtons::new([
        set(&[Button::Up, Button::Stop, Button::Down]),
        ButtonSet::from(Button::Down),
    ]);

    rig.tick(&mut buttons);
    assert_eq!(rig.controller.pending(), ButtonSet::from(Button::Stop));
    assert!(rig.transport.requests().is_empty());

    // Pending input is not re-read.
    rig.tick(&mut buttons);
    assert_eq!(buttons.polls, 1);
    let ops: Vec<_> = rig
        .transport
        .posts()
        .iter()
        .map(|r| r.operation().to_owned())
        .collect();
    assert_eq!(ops, vec!["GoToPosition", "GoToPosition"]);

    rig.tick(&mut buttons);
    assert_eq!(buttons.polls, 2);
    let last = rig.transport.posts().pop();
    assert_eq!(
        last.map(|r| r.operation().to_owned()),
        Some("Close".to_owned())
    );
}

// ── Awake window ──────────────────────────────────────────────

#[test]
fn idle_past_window_sleeps_and_press_resumes() {
    let mut rig = Rig::cached();
    rig.start(ButtonSet::EMPTY);
    let mut buttons = ScriptedButtons::default();

    rig.clock.set(20_000);
    assert_eq!(rig.tick(&mut buttons), PowerState::Awake);
    assert_eq!(rig.power.sleeps, 0);

    rig.clock.set(20_001);
    assert_eq!(rig.tick(&mut buttons), PowerState::Asleep);
    assert_eq!(rig.power.sleeps, 1);
    assert_eq!(rig.sink.events.last(), Some(&AppEvent::SleepEntered));

    // Nothing pressed: stays asleep, no second sleep entry.
    rig.clock.advance(60_000);
    assert_eq!(rig.tick(&mut buttons), PowerState::Asleep);
    assert_eq!(rig.power.sleeps, 1);

    rig.sink.take();
    buttons.push(ButtonSet::from(Button::Up));
    assert_eq!(rig.tick(&mut buttons), PowerState::Awake);
    assert_eq!(rig.sink.events[0], AppEvent::Resumed);
    assert_eq!(
        rig.sink.events[1],
        AppEvent::Dispatched(InputEvent::Pressed(Button::Up))
    );
    assert_eq!(rig.transport.posts().len(), 2);
    assert_eq!(
        rig.controller.sleep_deadline_ms(),
        rig.clock.now.get() + 20_000
    );
}

#[test]
fn activity_extends_the_window() {
    let mut rig = Rig::cached();
    rig.start(ButtonSet::EMPTY);
    let mut buttons = ScriptedButtons::default();

    rig.clock.set(15_000);
    buttons.push(ButtonSet::from(Button::Down));
    rig.tick(&mut buttons);

    rig.clock.set(30_000);
    assert_eq!(rig.tick(&mut buttons), PowerState::Awake);
    assert_eq!(rig.power.sleeps, 0);
}

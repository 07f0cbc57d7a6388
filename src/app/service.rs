//! Shutter controller — the hexagonal core.
//!
//! [`ShutterController`] owns the two working actuator addresses, the
//! pending button set and the awake window.  Each [`tick`](ShutterController::tick)
//! polls input, applies the duty-cycle gate, and dispatches at most one
//! round of commands.  All I/O flows through port traits, so the whole loop
//! runs against mocks on the host.
//!
//! ```text
//!  ButtonSource ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!  Clock ─────────▶ │      ShutterController       │
//!                   │ AwakeWindow · CommandPolicy  │ ──▶ PowerPort
//!                   └──────┬────────┬────────┬─────┘
//!                   Discovery  AddressCache  CommandChannel
//!                   (Network)   (Storage)    (HttpTransport)
//! ```

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::power::{AwakeWindow, PowerState};
use crate::shutter::cache::AddressCache;
use crate::shutter::channel::{CommandChannel, ShutterCommand};
use crate::shutter::discovery::Discovery;
use crate::shutter::policy::CommandPolicy;
use crate::shutter::{ActuatorAddress, ShutterId, ShutterPair};

use super::commands::{Button, ButtonSet, InputEvent};
use super::events::{AddressSource, AppEvent};
use super::ports::{
    ButtonSource, Clock, EventSink, HttpTransport, NetworkPort, PowerPort, StoragePort,
};

// ───────────────────────────────────────────────────────────────
// ShutterController
// ───────────────────────────────────────────────────────────────

/// Turns button activity into actuator commands and gates deep sleep.
pub struct ShutterController<N, T, S, D> {
    config: ControllerConfig,
    discovery: Discovery<N, D>,
    channel: CommandChannel<T, D>,
    cache: AddressCache<S>,
    policy: CommandPolicy,
    /// Working copy used for every command.
    addresses: ShutterPair<ActuatorAddress>,
    window: AwakeWindow,
    pending: ButtonSet,
    state: PowerState,
}

impl<N, T, S, D> ShutterController<N, T, S, D>
where
    N: NetworkPort,
    T: HttpTransport,
    S: StoragePort,
    D: DelayNs + Clone,
{
    /// Wire the controller to its collaborators.
    ///
    /// Does **not** resolve addresses; call [`start`](Self::start) next.
    pub fn new(config: ControllerConfig, network: N, transport: T, storage: S, delay: D) -> Self {
        let discovery = Discovery::new(network, delay.clone(), config.sweep_params());
        let channel = CommandChannel::new(transport, delay, config.settle_ms);
        let cache = AddressCache::new(storage, config.nvs_namespace);
        let policy = CommandPolicy::new(config.ventilation_position);
        let window = AwakeWindow::new(config.awake_ms, 0);
        Self {
            config,
            discovery,
            channel,
            cache,
            policy,
            addresses: ShutterPair::new(ActuatorAddress::SENTINEL, ActuatorAddress::SENTINEL),
            window,
            pending: ButtonSet::EMPTY,
            state: PowerState::Awake,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load (or discover) the address pair and open the awake window.
    ///
    /// `boot` is the button state sampled right after reset; it seeds the
    /// pending set so the press that woke the device is dispatched.
    pub fn start(&mut self, boot: ButtonSet, clock: &impl Clock, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started(boot));
        info!("Controller: starting, boot buttons [{}]", boot);

        self.resolve_cold_start(sink);
        self.pending = boot;
        self.state = PowerState::Awake;
        self.window.touch(clock.now_ms());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one loop iteration.  Returns the power state afterwards.
    ///
    /// While asleep, the tick only watches for a wake press; a press
    /// resumes and is dispatched in the same tick.
    pub fn tick(
        &mut self,
        buttons: &mut impl ButtonSource,
        clock: &impl Clock,
        power: &mut impl PowerPort,
        sink: &mut impl EventSink,
    ) -> PowerState {
        if self.state == PowerState::Asleep {
            let woke = buttons.poll();
            if woke.is_empty() {
                return self.state;
            }
            self.pending = woke;
            self.resume(clock.now_ms(), sink);
        }

        // Re-read only when nothing is left over from the previous tick.
        if self.pending.is_empty() {
            self.pending = buttons.poll();
        }

        let now = clock.now_ms();
        if !self.pending.is_empty() {
            self.window.touch(now);
        }

        if self.window.expired(now) {
            self.sleep(power, sink);
            return self.state;
        }

        if self.pending.is_empty() {
            return self.state;
        }

        self.dispatch_pending(sink);
        self.window.touch(clock.now_ms());
        self.state
    }

    /// Leave the low-power state and restart the awake window.
    pub fn resume(&mut self, now_ms: u64, sink: &mut impl EventSink) {
        self.state = PowerState::Awake;
        self.window.touch(now_ms);
        sink.emit(&AppEvent::Resumed);
        info!(
            "Controller: resumed, awake until {} ms",
            self.window.deadline()
        );
    }

    // ── Commands ──────────────────────────────────────────────

    /// Re-discover both actuators and persist the pair in one commit.
    pub fn repair(&mut self, sink: &mut impl EventSink) {
        info!("Controller: re-pairing both shutters");
        let discovered = self
            .config
            .shutters
            .map(|_, identity| self.discovery.resolve(identity));
        self.addresses = discovered;
        if self.cache.store_pair(&discovered).is_err() {
            warn!("Controller: re-pair not persisted, using the new addresses until reboot");
        }
        sink.emit(&AppEvent::AddressesResolved {
            source: AddressSource::Repair,
            addresses: discovered,
        });
    }

    pub fn open_all(&mut self, sink: &mut impl EventSink) {
        for id in ShutterId::ALL {
            self.issue(id, ShutterCommand::Open, sink);
        }
    }

    pub fn close_all(&mut self, sink: &mut impl EventSink) {
        for id in ShutterId::ALL {
            self.issue(id, ShutterCommand::Close, sink);
        }
    }

    /// Snapshot both statuses, then act on each shutter by its own status.
    pub fn stop_all(&mut self, sink: &mut impl EventSink) {
        let statuses = self.addresses.map(|shutter, address| {
            let status = self.channel.status(address);
            debug!("Controller: {} status {:?}", shutter, status);
            sink.emit(&AppEvent::StatusPolled { shutter, status });
            status
        });

        for (shutter, status) in statuses.iter() {
            match self.policy.stop(*status) {
                Some(action) => self.issue(shutter, action.command(), sink),
                None => {
                    info!("Controller: {} status unknown, Stop ignored", shutter);
                    sink.emit(&AppEvent::StopSkipped(shutter));
                }
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn addresses(&self) -> &ShutterPair<ActuatorAddress> {
        &self.addresses
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    pub fn pending(&self) -> ButtonSet {
        self.pending
    }

    /// Time after which the controller sleeps if nothing happens.
    pub fn sleep_deadline_ms(&self) -> u64 {
        self.window.deadline()
    }

    // ── Internal ──────────────────────────────────────────────

    fn resolve_cold_start(&mut self, sink: &mut impl EventSink) {
        let cached = ShutterPair::new(
            self.cache.load(ShutterId::First),
            self.cache.load(ShutterId::Second),
        );
        let missing = cached.first.is_none() || cached.second.is_none();

        let shutters = self.config.shutters;
        self.addresses = cached.map(|id, hit| {
            hit.unwrap_or_else(|| self.discovery.resolve(*shutters.get(id)))
        });

        if missing && self.cache.store_pair(&self.addresses).is_err() {
            warn!("Controller: resolved addresses not persisted, will rediscover next boot");
        }

        let source = if missing {
            AddressSource::ColdStart
        } else {
            AddressSource::Cached
        };
        info!(
            "Controller: {} at {}, {} at {} ({:?})",
            ShutterId::First,
            self.addresses.first,
            ShutterId::Second,
            self.addresses.second,
            source
        );
        sink.emit(&AppEvent::AddressesResolved {
            source,
            addresses: self.addresses,
        });
    }

    fn dispatch_pending(&mut self, sink: &mut impl EventSink) {
        if self.pending.is_repair_gesture() {
            // Only Up and Down are consumed; a held Stop runs next tick.
            sink.emit(&AppEvent::Dispatched(InputEvent::Repair));
            self.repair(sink);
            self.pending.remove(Button::Up);
            self.pending.remove(Button::Down);
            return;
        }

        for button in self.pending.iter() {
            sink.emit(&AppEvent::Dispatched(InputEvent::Pressed(button)));
            match button {
                Button::Up => self.open_all(sink),
                Button::Stop => self.stop_all(sink),
                Button::Down => self.close_all(sink),
            }
        }
        self.pending.clear();
    }

    fn issue(&mut self, shutter: ShutterId, command: ShutterCommand, sink: &mut impl EventSink) {
        let address = *self.addresses.get(shutter);
        match self.channel.send(address, command) {
            Ok(()) => sink.emit(&AppEvent::CommandIssued { shutter, command }),
            Err(error) => sink.emit(&AppEvent::CommandFailed {
                shutter,
                command,
                error,
            }),
        }
    }

    fn sleep(&mut self, power: &mut impl PowerPort, sink: &mut impl EventSink) {
        info!(
            "Controller: idle past {} ms, sleeping",
            self.window.deadline()
        );
        self.state = PowerState::Asleep;
        sink.emit(&AppEvent::SleepEntered);
        power.enter_low_power();
    }
}

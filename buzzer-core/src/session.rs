//! Device session: all mutable device state in one explicit record, plus the
//! deferred work queue that carries radio operations out of callback context.
//!
//! The radio stack delivers connection lifecycle events from a context that
//! forbids reentrant radio calls, and timer handlers may not block. Both
//! therefore only enqueue work here; [`DeviceSession::run_pending`] drains
//! the queue from an ordinary schedulable context where advertising restarts
//! and blocking LED sequences are allowed.

use buzzer_proto::{battery_level_to_wire, ButtonState, BuzzerId, Rgb};
use embedded_hal::delay::DelayNs;
use heapless::Deque;

use crate::battery::{BatterySense, PowerMonitor};
use crate::button::DebounceFilter;
use crate::led::{IlluminationController, LedDriver, CONNECT_ACK_BLINKS, CONNECT_ACK_STEP_MS};
use crate::service::{BuzzerService, GattError, NotifyOutcome};

/// Depth of the deferred work queue. Four kinds of work exist and none is
/// enqueued faster than it drains; eight slots is generous.
pub const WORK_QUEUE_DEPTH: usize = 8;

/// Settle time before restarting advertising after a link loss.
pub const ADV_RESTART_SETTLE_MS: u32 = 100;

/// Notifiable characteristics, as seen by the [`Radio`] implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Characteristic {
    ButtonState,
    BatteryLevel,
}

/// Radio stack operations the deferred executor needs. Implemented by the
/// board support layer on top of the actual BLE stack.
pub trait Radio {
    type Error: core::fmt::Debug;

    /// (Re)start connectable advertising. Must tolerate being called while
    /// advertising is already active.
    fn start_advertising(&mut self) -> Result<(), Self::Error>;

    /// Push a characteristic value to the connected central.
    fn notify(&mut self, characteristic: Characteristic, payload: &[u8])
        -> Result<(), Self::Error>;
}

/// A unit of deferred work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Work {
    /// Restart advertising after a link loss.
    ResumeAdvertising,
    /// Blink the feedback light to acknowledge a new connection.
    ConnectAck,
    /// Send a button state notification.
    NotifyButton(ButtonState),
    /// Send a battery level notification.
    NotifyBattery(u8),
}

/// Fixed-capacity FIFO of deferred work.
#[derive(Default)]
pub struct WorkQueue {
    items: Deque<Work, WORK_QUEUE_DEPTH>,
}

impl WorkQueue {
    #[must_use]
    pub fn new() -> Self {
        Self { items: Deque::new() }
    }

    /// Enqueue work. A full queue drops the item; the queue is sized so that
    /// only a stuck executor can fill it, and then losing a notification is
    /// the least of the device's problems.
    pub fn push(&mut self, work: Work) {
        if self.items.push_back(work).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("work queue full, dropping {}", work);
        }
    }

    pub fn pop(&mut self) -> Option<Work> {
        self.items.pop_front()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Work> {
        self.items.iter()
    }
}

/// All mutable state of one buzzer, passed by reference to every component
/// instead of living in hidden statics.
pub struct DeviceSession<D, S> {
    pub service: BuzzerService,
    pub button: DebounceFilter,
    pub battery: PowerMonitor<S>,
    pub led: IlluminationController<D>,
    work: WorkQueue,
}

impl<D: LedDriver, S: BatterySense> DeviceSession<D, S> {
    #[must_use]
    pub fn new(
        identity: BuzzerId,
        button: DebounceFilter,
        battery: PowerMonitor<S>,
        led: IlluminationController<D>,
    ) -> Self {
        Self {
            service: BuzzerService::new(identity),
            button,
            battery,
            led,
            work: WorkQueue::new(),
        }
    }

    /// Interrupt-tier entry point for a raw button edge. Returns the
    /// deadline to arm the debounce timer with, or `None` if coalesced.
    #[must_use]
    pub fn on_button_edge(&mut self, now_ms: u64) -> Option<u64> {
        self.button.on_edge(now_ms)
    }

    /// Timer-tier entry point for debounce window expiry. The caller reads
    /// the settled pin level and passes it in. Confirmed transitions light
    /// the dome while held and queue a notification if a subscribed central
    /// is connected.
    pub fn on_debounce_expired(&mut self, now_ms: u64, settled_pressed: bool) {
        let Some(event) = self.button.on_window_expired(now_ms, settled_pressed) else {
            return;
        };

        // Local feedback independent of any host: lit while held.
        let local = if event.state.is_pressed() {
            Rgb::WHITE
        } else {
            Rgb::OFF
        };
        self.led.set(local, now_ms);

        if let NotifyOutcome::Notify = self.service.update_button(event.state) {
            self.work.push(Work::NotifyButton(event.state));
        }
    }

    /// Timer-tier entry point for the LED auto-off timer.
    pub fn on_led_tick(&mut self, now_ms: u64) {
        let _ = self.led.tick(now_ms);
    }

    /// Connection established. Runs in the radio stack's lifecycle callback
    /// context, so the acknowledgment blink (which sleeps) is deferred.
    pub fn on_connected(&mut self) {
        self.service.on_connect();
        self.work.push(Work::ConnectAck);
    }

    /// Link lost. Runs in the radio stack's lifecycle callback context; the
    /// advertising restart must not happen here and is deferred instead.
    pub fn on_disconnected(&mut self) {
        self.service.on_disconnect();
        self.work.push(Work::ResumeAdvertising);
    }

    /// Host write to the illumination characteristic. Returns the number of
    /// bytes consumed, or a protocol error for a malformed write.
    pub fn on_illumination_write(
        &mut self,
        offset: usize,
        data: &[u8],
        now_ms: u64,
    ) -> Result<usize, GattError> {
        let color = self.service.write_illumination(offset, data)?;
        self.led.set(color, now_ms);
        Ok(data.len())
    }

    /// Host toggled the button state CCC.
    pub fn on_button_subscribe(&mut self, enabled: bool) {
        self.service.set_button_notify(enabled);
    }

    /// Host toggled the battery level CCC.
    pub fn on_battery_subscribe(&mut self, enabled: bool) {
        self.service.set_battery_notify(enabled);
    }

    /// Main-loop battery poll; rate limiting and hysteresis live in the
    /// monitor, so this is cheap to call every wakeup.
    pub fn poll_battery(&mut self, now_ms: u64) {
        if let Some(level) = self.battery.poll(now_ms) {
            if let NotifyOutcome::Notify = self.service.update_battery(level) {
                self.work.push(Work::NotifyBattery(level));
            }
        }
    }

    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        !self.work.is_empty()
    }

    /// Inspect queued work without draining it.
    pub fn pending_work(&self) -> impl Iterator<Item = &Work> {
        self.work.iter()
    }

    /// Work-queue-tier executor: the only place radio operations and
    /// blocking delays happen.
    pub fn run_pending<R: Radio, T: DelayNs>(&mut self, radio: &mut R, delay: &mut T) {
        while let Some(work) = self.work.pop() {
            match work {
                Work::ResumeAdvertising => {
                    // Let the stack settle after the disconnect before
                    // asking it to advertise again.
                    delay.delay_ms(ADV_RESTART_SETTLE_MS);
                    if let Err(_err) = radio.start_advertising() {
                        #[cfg(feature = "defmt")]
                        defmt::error!("failed to restart advertising: {:?}",
                            defmt::Debug2Format(&_err));
                    }
                }
                Work::ConnectAck => {
                    let driver = self.led.driver_mut();
                    for _ in 0..CONNECT_ACK_BLINKS {
                        driver.apply(Rgb::WHITE);
                        delay.delay_ms(CONNECT_ACK_STEP_MS);
                        driver.apply(Rgb::OFF);
                        delay.delay_ms(CONNECT_ACK_STEP_MS);
                    }
                }
                Work::NotifyButton(state) => {
                    if let Err(_err) =
                        radio.notify(Characteristic::ButtonState, &state.to_wire())
                    {
                        #[cfg(feature = "defmt")]
                        defmt::warn!("button notify failed: {:?}", defmt::Debug2Format(&_err));
                    }
                }
                Work::NotifyBattery(level) => {
                    if let Err(_err) =
                        radio.notify(Characteristic::BatteryLevel, &battery_level_to_wire(level))
                    {
                        #[cfg(feature = "defmt")]
                        defmt::warn!("battery notify failed: {:?}", defmt::Debug2Format(&_err));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::battery::SenseError;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec;
    use std::vec::Vec;

    struct NoSense;

    impl BatterySense for NoSense {
        fn sample(&mut self) -> Result<u16, SenseError> {
            Err(SenseError::Unavailable)
        }
    }

    #[derive(Default)]
    struct RecordingDriver {
        applied: Rc<RefCell<Vec<Rgb>>>,
    }

    impl LedDriver for RecordingDriver {
        fn apply(&mut self, color: Rgb) {
            self.applied.borrow_mut().push(color);
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum RadioOp {
        Advertise,
        Notify(Characteristic, u8),
    }

    #[derive(Default)]
    struct MockRadio {
        ops: Vec<RadioOp>,
    }

    impl Radio for MockRadio {
        type Error = ();

        fn start_advertising(&mut self) -> Result<(), ()> {
            self.ops.push(RadioOp::Advertise);
            Ok(())
        }

        fn notify(&mut self, characteristic: Characteristic, payload: &[u8]) -> Result<(), ()> {
            self.ops.push(RadioOp::Notify(characteristic, payload[0]));
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockDelay {
        slept_ms: u32,
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.slept_ms += ns / 1_000_000;
        }
    }

    fn session() -> DeviceSession<RecordingDriver, NoSense> {
        DeviceSession::new(
            BuzzerId::A,
            DebounceFilter::new(50),
            PowerMonitor::stub(),
            IlluminationController::new(RecordingDriver::default()),
        )
    }

    #[test]
    fn disconnect_defers_advertising_restart() {
        let mut session = session();
        session.on_connected();
        session.on_disconnected();

        // The lifecycle callbacks themselves never touched the radio; the
        // restart sits in the queue until the executor runs.
        assert!(session
            .pending_work()
            .any(|w| *w == Work::ResumeAdvertising));

        let mut radio = MockRadio::default();
        let mut delay = MockDelay::default();
        session.run_pending(&mut radio, &mut delay);
        assert!(radio.ops.contains(&RadioOp::Advertise));
        assert!(delay.slept_ms >= ADV_RESTART_SETTLE_MS);
        assert!(!session.has_pending_work());
    }

    #[test]
    fn connect_queues_ack_blink() {
        let mut session = session();
        let applied = session.led.driver_mut().applied.clone();
        session.on_connected();
        assert!(session.pending_work().any(|w| *w == Work::ConnectAck));

        session.run_pending(&mut MockRadio::default(), &mut MockDelay::default());
        let blinks = applied.borrow();
        assert_eq!(blinks.len(), usize::from(CONNECT_ACK_BLINKS) * 2);
        assert_eq!(blinks[0], Rgb::WHITE);
        assert_eq!(blinks[1], Rgb::OFF);
    }

    #[test]
    fn press_notifies_only_when_subscribed() {
        let mut session = session();
        session.on_connected();
        session.run_pending(&mut MockRadio::default(), &mut MockDelay::default());

        // Not subscribed: confirmed press stays local.
        let _ = session.on_button_edge(0);
        session.on_debounce_expired(50, true);
        assert!(!session.has_pending_work());

        session.on_button_subscribe(true);
        let _ = session.on_button_edge(100);
        session.on_debounce_expired(150, false);

        let mut radio = MockRadio::default();
        session.run_pending(&mut radio, &mut MockDelay::default());
        assert_eq!(
            radio.ops,
            vec![RadioOp::Notify(Characteristic::ButtonState, 0)]
        );
    }

    #[test]
    fn press_lights_dome_locally() {
        let mut session = session();
        let applied = session.led.driver_mut().applied.clone();

        let _ = session.on_button_edge(0);
        session.on_debounce_expired(50, true);
        assert_eq!(applied.borrow().last(), Some(&Rgb::WHITE));

        let _ = session.on_button_edge(100);
        session.on_debounce_expired(150, false);
        assert_eq!(applied.borrow().last(), Some(&Rgb::OFF));
    }

    #[test]
    fn stub_battery_notifies_full_once_when_subscribed() {
        let mut session = session();
        session.on_connected();
        session.run_pending(&mut MockRadio::default(), &mut MockDelay::default());
        session.on_battery_subscribe(true);

        session.poll_battery(0);
        let mut radio = MockRadio::default();
        session.run_pending(&mut radio, &mut MockDelay::default());
        assert_eq!(
            radio.ops,
            vec![RadioOp::Notify(Characteristic::BatteryLevel, 100)]
        );

        // Stub value never changes, so nothing further is queued.
        session.poll_battery(BATTERY_POLL_LATER);
        assert!(!session.has_pending_work());
    }

    const BATTERY_POLL_LATER: u64 = 10 * crate::battery::BATTERY_UPDATE_INTERVAL_MS;

    #[test]
    fn malformed_illumination_write_is_rejected() {
        let mut session = session();
        let applied = session.led.driver_mut().applied.clone();

        assert_eq!(
            session.on_illumination_write(0, &[1, 2], 0),
            Err(GattError::InvalidLength {
                expected: 3,
                actual: 2
            })
        );
        assert!(applied.borrow().is_empty());

        assert_eq!(session.on_illumination_write(0, &[9, 8, 7], 0), Ok(3));
        assert_eq!(applied.borrow().last(), Some(&Rgb::new(9, 8, 7)));
    }

    #[test]
    fn work_queue_drops_when_full() {
        let mut queue = WorkQueue::new();
        for _ in 0..WORK_QUEUE_DEPTH + 3 {
            queue.push(Work::ConnectAck);
        }
        let mut drained = 0;
        while queue.pop().is_some() {
            drained += 1;
        }
        assert_eq!(drained, WORK_QUEUE_DEPTH);
    }
}

//! Traffic light driver
//!
//! Executes the cycle planned by [`TrafficTiming::plan`] on a worker thread.
//! Lamp pins, the current phase and the phase callback are shared with the
//! worker; the caller side only ever swaps the callback or reads the phase.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::digital::{ErrorType, OutputPin, PinState};
use log::{debug, info};
use pilight_core::traffic::{CycleStep, Lamp};
use pilight_core::{TrafficPhase, TrafficTiming};

use crate::error::Error;
use crate::task::BackgroundTask;

/// Called with the phase and its length in seconds when a phase begins
///
/// Runs on the worker thread. The blink tail of green is not announced.
pub type PhaseCallback = Box<dyn FnMut(TrafficPhase, u32) + Send>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Lamps<P> {
    red: P,
    amber: P,
    green: P,
    /// Last level driven, indexed like `Lamp::ALL`
    lit: [bool; 3],
}

const fn slot(lamp: Lamp) -> usize {
    match lamp {
        Lamp::Red => 0,
        Lamp::Amber => 1,
        Lamp::Green => 2,
    }
}

impl<P: OutputPin> Lamps<P> {
    fn switch(&mut self, lamp: Lamp, on: bool) -> Result<(), P::Error> {
        let pin = match lamp {
            Lamp::Red => &mut self.red,
            Lamp::Amber => &mut self.amber,
            Lamp::Green => &mut self.green,
        };
        pin.set_state(PinState::from(on))?;
        self.lit[slot(lamp)] = on;
        Ok(())
    }

    fn all_off(&mut self) -> Result<(), P::Error> {
        for lamp in Lamp::ALL {
            self.switch(lamp, false)?;
        }
        Ok(())
    }
}

struct Shared<P> {
    lamps: Mutex<Lamps<P>>,
    phase: Mutex<Option<TrafficPhase>>,
    callback: Mutex<Option<PhaseCallback>>,
}

impl<P, E> Shared<P>
where
    P: OutputPin<Error = E>,
{
    fn enter(&self, phase: TrafficPhase, timing: &TrafficTiming) {
        *lock(&self.phase) = Some(phase);
        debug!("traffic light: {}", phase);

        if !phase.is_announced() {
            return;
        }
        if let Some(callback) = lock(&self.callback).as_mut() {
            callback(phase, timing.phase_seconds(phase));
        }
    }

    fn switch(&self, lamp: Lamp, on: bool) -> Result<(), Error<E>> {
        lock(&self.lamps).switch(lamp, on).map_err(Error::Pin)
    }
}

/// Red, amber and green lamps cycling on a worker thread
pub struct TrafficLight<P>
where
    P: ErrorType,
{
    shared: Arc<Shared<P>>,
    task: Option<BackgroundTask<P::Error>>,
}

impl<P, E> TrafficLight<P>
where
    P: OutputPin<Error = E> + Send + 'static,
    E: fmt::Debug + Send + 'static,
{
    /// Take the lamp pins and switch every lamp off
    pub fn new(red: P, amber: P, green: P) -> Result<Self, Error<E>> {
        let mut lamps = Lamps {
            red,
            amber,
            green,
            lit: [false; 3],
        };
        lamps.all_off().map_err(Error::Pin)?;

        Ok(Self {
            shared: Arc::new(Shared {
                lamps: Mutex::new(lamps),
                phase: Mutex::new(None),
                callback: Mutex::new(None),
            }),
            task: None,
        })
    }

    /// Set the callback invoked whenever red, green or amber begins
    pub fn on_phase_change<F>(&mut self, callback: F)
    where
        F: FnMut(TrafficPhase, u32) + Send + 'static,
    {
        *lock(&self.shared.callback) = Some(Box::new(callback));
    }

    /// Phase the cycle entered last, `None` when no cycle has run
    pub fn current_phase(&self) -> Option<TrafficPhase> {
        *lock(&self.shared.phase)
    }

    /// Check if a cycle is running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start cycling red → green → green blink → amber
    ///
    /// `timing` is validated before anything else happens, so a rejected
    /// timing leaves a running cycle untouched. Otherwise a running cycle is
    /// stopped first, and an error it ended with is logged rather than
    /// returned.
    ///
    /// With `background` unset this blocks the caller until the cycle ends.
    /// The cycle only ends on a pin failure, so in practice this never
    /// returns `Ok`.
    pub fn start(&mut self, timing: TrafficTiming, background: bool) -> Result<(), Error<E>> {
        let plan = timing.plan()?;
        if let Some(task) = self.task.take() {
            // Its error, if any, is logged; it does not fail this start
            task.cancel();
        }

        info!(
            "traffic light cycle: red {}s, green {}s, amber {}s",
            timing.red_s, timing.green_s, timing.amber_s
        );

        let shared = Arc::clone(&self.shared);
        let task = BackgroundTask::spawn("traffic-light", move |stop| loop {
            for step in &plan {
                match *step {
                    CycleStep::Switch { lamp, on } => shared.switch(lamp, on)?,
                    CycleStep::Enter(phase) => shared.enter(phase, &timing),
                    CycleStep::Wait(duration) => {
                        if stop.wait(duration) {
                            return Ok(());
                        }
                    }
                }
            }
        })?;

        if background {
            self.task = Some(task);
            Ok(())
        } else {
            task.join()
        }
    }

    /// Stop the cycle and wait for the worker to exit
    ///
    /// Lamps keep their last state. Hands back the error the cycle ended
    /// with, if any.
    pub fn stop(&mut self) -> Result<(), Error<E>> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        let result = task.stop();
        *lock(&self.shared.phase) = None;
        info!("traffic light stopped");
        result
    }

    /// Switch every lamp off
    pub fn all_off(&mut self) -> Result<(), Error<E>> {
        lock(&self.shared.lamps).all_off().map_err(Error::Pin)
    }

    /// Switch one lamp on or off
    ///
    /// A running cycle keeps driving the lamps and overrides this at its
    /// next step.
    pub fn set_lamp(&mut self, lamp: Lamp, on: bool) -> Result<(), Error<E>> {
        self.shared.switch(lamp, on)
    }

    /// Check if a lamp was last driven on
    pub fn is_lit(&self, lamp: Lamp) -> bool {
        lock(&self.shared.lamps).lit[slot(lamp)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilight_hal_sim::{PinAction, PinEvent, SimBoard, SimPin};
    use std::sync::mpsc;
    use std::thread;
    use std::time::{Duration, Instant};

    const RED: u8 = 9;
    const AMBER: u8 = 10;
    const GREEN: u8 = 11;

    fn light(board: &SimBoard) -> TrafficLight<SimPin> {
        TrafficLight::new(board.pin(RED), board.pin(AMBER), board.pin(GREEN)).unwrap()
    }

    fn wait_for(mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() {
            if Instant::now() > deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        true
    }

    #[test]
    fn test_new_switches_all_off() {
        let board = SimBoard::new();
        let _light = light(&board);
        for pin in [RED, AMBER, GREEN] {
            assert_eq!(board.is_high(pin), Some(false));
        }
    }

    #[test]
    fn test_rejects_short_green() {
        let board = SimBoard::new();
        let mut light = light(&board);
        board.clear_events();

        let err = light.start(TrafficTiming::new(10, 3, 3), true).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(!light.is_running());
        assert_eq!(board.event_count(), 0);
    }

    #[test]
    fn test_starts_with_red() {
        let board = SimBoard::new();
        let mut light = light(&board);
        let (tx, rx) = mpsc::channel();
        light.on_phase_change(move |phase, secs| {
            let _ = tx.send((phase, secs));
        });

        light.start(TrafficTiming::new(7, 3, 5), true).unwrap();
        assert!(light.is_running());

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first, (TrafficPhase::Red, 7));
        assert_eq!(light.current_phase(), Some(TrafficPhase::Red));
        assert_eq!(board.is_high(RED), Some(true));
        assert_eq!(board.is_high(GREEN), Some(false));

        light.stop().unwrap();
        assert!(!light.is_running());
        assert_eq!(light.current_phase(), None);
    }

    #[test]
    fn test_stop_is_prompt_and_keeps_lamps() {
        let board = SimBoard::new();
        let mut light = light(&board);
        light.start(TrafficTiming::new(60, 3, 5), true).unwrap();
        assert!(wait_for(|| board.is_high(RED) == Some(true)));

        let started = Instant::now();
        light.stop().unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(board.is_high(RED), Some(true));

        // Idempotent
        assert!(light.stop().is_ok());

        light.all_off().unwrap();
        assert_eq!(board.is_high(RED), Some(false));
    }

    #[test]
    fn test_restart_keeps_one_cycle() {
        let board = SimBoard::new();
        let mut light = light(&board);
        let timing = TrafficTiming::new(60, 3, 5);

        light.start(timing, true).unwrap();
        assert!(wait_for(|| board.is_high(RED) == Some(true)));
        light.start(timing, true).unwrap();
        assert!(wait_for(|| board.is_high(RED) == Some(true)));

        // One red switch-on per cycle, none from a leftover worker
        thread::sleep(Duration::from_millis(50));
        let red_on = board
            .events()
            .iter()
            .filter(|e| **e == PinEvent { pin: RED, action: PinAction::High })
            .count();
        assert_eq!(red_on, 2);

        light.stop().unwrap();
    }

    #[test]
    fn test_single_lamp_control() {
        let board = SimBoard::new();
        let mut light = light(&board);
        assert!(Lamp::ALL.iter().all(|&lamp| !light.is_lit(lamp)));

        light.set_lamp(Lamp::Amber, true).unwrap();
        assert!(light.is_lit(Lamp::Amber));
        assert!(!light.is_lit(Lamp::Red));
        assert_eq!(board.is_high(AMBER), Some(true));
        assert_eq!(board.is_high(RED), Some(false));

        light.set_lamp(Lamp::Amber, false).unwrap();
        assert!(!light.is_lit(Lamp::Amber));
        assert_eq!(board.is_high(AMBER), Some(false));
    }

    #[test]
    fn test_lamp_control_after_stop() {
        let board = SimBoard::new();
        let mut light = light(&board);
        light.start(TrafficTiming::new(60, 3, 5), true).unwrap();
        assert!(wait_for(|| light.is_lit(Lamp::Red)));
        light.stop().unwrap();

        light.set_lamp(Lamp::Red, false).unwrap();
        light.set_lamp(Lamp::Green, true).unwrap();
        assert!(!light.is_lit(Lamp::Red));
        assert!(light.is_lit(Lamp::Green));
        assert_eq!(board.is_high(RED), Some(false));
        assert_eq!(board.is_high(GREEN), Some(true));
    }

    #[test]
    fn test_failed_lamp_switch_keeps_state() {
        let board = SimBoard::new();
        let mut light = light(&board);
        board.fail_after(0);

        assert!(light.set_lamp(Lamp::Red, true).unwrap_err().is_pin_failure());
        assert!(!light.is_lit(Lamp::Red));
    }

    #[test]
    fn test_start_after_failed_cycle() {
        let board = SimBoard::new();
        let mut light = light(&board);
        board.fail_after(0);

        light.start(TrafficTiming::default(), true).unwrap();
        assert!(wait_for(|| !light.is_running()));
        board.heal();

        // The old failure does not block the new cycle
        light.start(TrafficTiming::new(60, 3, 5), true).unwrap();
        assert!(light.is_running());
        assert!(wait_for(|| board.is_high(RED) == Some(true)));
        light.stop().unwrap();
    }

    #[test]
    fn test_pin_failure_ends_cycle() {
        let board = SimBoard::new();
        let mut light = light(&board);
        board.fail_after(0);

        light.start(TrafficTiming::default(), true).unwrap();
        assert!(wait_for(|| !light.is_running()));
        assert!(light.stop().unwrap_err().is_pin_failure());
    }

    #[test]
    fn test_blocking_start_returns_pin_failure() {
        let board = SimBoard::new();
        let mut light = light(&board);
        board.fail_after(0);

        let err = light.start(TrafficTiming::default(), false).unwrap_err();
        assert!(err.is_pin_failure());
        assert!(!light.is_running());
    }

    #[test]
    fn test_green_blink_is_not_announced() {
        let board = SimBoard::new();
        let mut light = light(&board);
        let (tx, rx) = mpsc::channel();
        light.on_phase_change(move |phase, secs| {
            let _ = tx.send((phase, secs));
        });

        // Shortest valid cycle: 1s red, 2s green, 3s blink, 1s amber
        light.start(TrafficTiming::new(1, 1, 5), true).unwrap();

        let recv = || rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(recv(), (TrafficPhase::Red, 1));
        assert_eq!(recv(), (TrafficPhase::Green, 5));
        assert_eq!(recv(), (TrafficPhase::Amber, 1));
        light.stop().unwrap();
    }
}

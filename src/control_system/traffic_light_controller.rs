use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::LightTiming;
use crate::control_system::phase_queue::PhaseQueue;
use crate::error::{IntersectionError, Result};
use crate::global_variables::MAX_PENDING_PHASES;

/// The two states of a traffic light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Red,
    Green,
}

impl Phase {
    pub fn toggled(self) -> Self {
        match self {
            Phase::Red => Phase::Green,
            Phase::Green => Phase::Red,
        }
    }

    fn from_bits(bits: u8) -> Self {
        if bits & 1 == 0 {
            Phase::Red
        } else {
            Phase::Green
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Phase::Red => write!(f, "red"),
            Phase::Green => write!(f, "green"),
        }
    }
}

/// A single traffic light that flips between red and green at random
/// intervals and publishes every flip through a [`PhaseQueue`].
pub struct TrafficLightController {
    name: String,
    // Phase::Red = 0, Phase::Green = 1
    current_phase: AtomicU8,
    queue: PhaseQueue<Phase>,
    timing: LightTiming,
    started: AtomicBool,
    running: AtomicBool,
}

impl TrafficLightController {
    /// Creates a light in the red phase. `name` only shows up in log lines.
    pub fn new(name: impl Into<String>, timing: LightTiming) -> Self {
        Self {
            name: name.into(),
            current_phase: AtomicU8::new(Phase::Red as u8),
            queue: PhaseQueue::with_send_delay(timing.send_delay()),
            timing,
            started: AtomicBool::new(false),
            running: AtomicBool::new(true),
        }
    }

    pub fn timing(&self) -> &LightTiming {
        &self.timing
    }

    /// Starts cycling on a detached thread. Only one cycler is allowed per light,
    /// and the timing must be valid.
    pub fn simulate(self: &Arc<Self>) -> Result<()> {
        if let Err(err) = self.timing.validate() {
            log::error!("{}: traffic light not started: {}", self.name, err);
            return Err(err);
        }
        if self.started.swap(true, Ordering::AcqRel) {
            log::error!("{}: traffic light simulate() called twice", self.name);
            return Err(IntersectionError::AlreadySimulating {
                component: "traffic light",
            });
        }
        let light = Arc::clone(self);
        thread::spawn(move || light.cycle_through_phases());
        Ok(())
    }

    /// Stops the cycler at its next poll. The current phase is left as is.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn current_phase(&self) -> Phase {
        Phase::from_bits(self.current_phase.load(Ordering::Acquire))
    }

    pub fn is_green(&self) -> bool {
        self.current_phase() == Phase::Green
    }

    /// Blocks until the light is green.
    ///
    /// Returns straight away if the light already is green. Otherwise it keeps
    /// pulling phase changes off the queue until it gets a green one while the
    /// light actually is green; reds and greens left over from earlier cycles
    /// are dropped. Waiters compete for deliveries: each green wakes only one
    /// of them.
    pub fn wait_for_green(&self) {
        if self.is_green() {
            return;
        }
        loop {
            if self.queue.receive() == Phase::Green && self.is_green() {
                return;
            }
        }
    }

    /// Flips the phase and publishes the new one. Called by the cycler on
    /// every tick; also usable to drive a light that is not simulating.
    pub fn toggle_phase(&self) -> Phase {
        let previous = Phase::from_bits(self.current_phase.fetch_xor(1, Ordering::AcqRel));
        let next = previous.toggled();
        log::info!("{}: traffic light switched to {}", self.name, next);
        self.queue.send_bounded(next, MAX_PENDING_PHASES);
        next
    }

    fn next_cycle(&self, rng: &mut SmallRng) -> Duration {
        Duration::from_millis(rng.random_range(self.timing.min_cycle_ms..=self.timing.max_cycle_ms))
    }

    fn cycle_through_phases(&self) {
        let mut rng = match self.timing.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let poll = self.timing.poll_interval();
        let mut phase_duration = self.next_cycle(&mut rng);
        let mut phase_start = Instant::now();
        log::info!(
            "{}: traffic light cycling, first phase lasts {:?}",
            self.name,
            phase_duration
        );

        while self.running.load(Ordering::Acquire) {
            thread::sleep(poll);
            if phase_start.elapsed() >= phase_duration {
                self.toggle_phase();
                phase_start = Instant::now();
                phase_duration = self.next_cycle(&mut rng);
            }
        }
        log::info!("{}: traffic light stopped", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn fast_light(cycle_ms: u64) -> Arc<TrafficLightController> {
        Arc::new(TrafficLightController::new(
            "test light",
            LightTiming::fixed(cycle_ms),
        ))
    }

    #[test]
    fn starts_red() {
        let light = fast_light(10);
        assert_eq!(light.current_phase(), Phase::Red);
        assert!(!light.is_green());
        assert!(light.queue.is_empty());
    }

    #[test]
    fn toggle_alternates_and_publishes() {
        let light = fast_light(10);
        assert_eq!(light.toggle_phase(), Phase::Green);
        assert_eq!(light.toggle_phase(), Phase::Red);
        assert_eq!(light.toggle_phase(), Phase::Green);
        assert_eq!(light.current_phase(), Phase::Green);
        // only the newest flips stay queued
        assert_eq!(light.queue.len(), MAX_PENDING_PHASES);
        let published: Vec<Phase> = (0..2).map(|_| light.queue.receive()).collect();
        assert_eq!(published, vec![Phase::Red, Phase::Green]);
    }

    #[test]
    fn wait_for_green_returns_immediately_when_green() {
        let light = fast_light(10);
        light.toggle_phase();
        // drain so only the fast path can let us through
        light.queue.receive();
        let start = Instant::now();
        light.wait_for_green();
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn wait_for_green_skips_red_deliveries() {
        let light = fast_light(10);
        light.toggle_phase();
        light.queue.receive();
        light.toggle_phase(); // red, left queued

        let (tx, rx) = mpsc::channel();
        let waiter = {
            let light = Arc::clone(&light);
            thread::spawn(move || {
                light.wait_for_green();
                tx.send(()).unwrap();
            })
        };

        // the queued red is consumed but does not release the waiter
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        light.toggle_phase();
        rx.recv_timeout(Duration::from_secs(1)).unwrap();
        waiter.join().unwrap();
        assert!(light.queue.is_empty());
    }

    #[test]
    fn stale_green_does_not_release_on_red() {
        let light = fast_light(10);
        light.toggle_phase();
        light.toggle_phase(); // queue: green, red; light is red

        let (tx, rx) = mpsc::channel();
        let waiter = {
            let light = Arc::clone(&light);
            thread::spawn(move || {
                light.wait_for_green();
                tx.send(light.current_phase()).unwrap();
            })
        };

        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        light.toggle_phase();
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), Phase::Green);
        waiter.join().unwrap();
    }

    #[test]
    fn backlog_stays_bounded_without_waiters() {
        let light = fast_light(10);
        for _ in 0..1_000 {
            light.toggle_phase();
        }
        assert!(light.queue.len() <= MAX_PENDING_PHASES);
        // the newest flips are kept, oldest first
        assert_eq!(light.queue.receive(), Phase::Green);
        assert_eq!(light.queue.receive(), Phase::Red);
    }

    #[test]
    fn simulate_rejects_inverted_cycle_bounds() {
        let light = Arc::new(TrafficLightController::new(
            "inverted",
            LightTiming {
                min_cycle_ms: 50,
                max_cycle_ms: 10,
                ..LightTiming::default()
            },
        ));
        let err = light.simulate().unwrap_err();
        assert!(matches!(err, IntersectionError::ConfigInvalid(_)));
        thread::sleep(Duration::from_millis(30));
        assert_eq!(light.current_phase(), Phase::Red);
        assert!(light.queue.is_empty());
    }

    #[test]
    fn simulate_rejects_zero_poll_interval() {
        let light = Arc::new(TrafficLightController::new(
            "busy",
            LightTiming {
                poll_interval_ms: 0,
                ..LightTiming::fixed(10)
            },
        ));
        assert!(matches!(
            light.simulate(),
            Err(IntersectionError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn cycle_durations_stay_within_bounds() {
        let timing = LightTiming {
            seed: Some(7),
            ..LightTiming::default()
        };
        let light = TrafficLightController::new("bounds", timing);
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let cycle = light.next_cycle(&mut rng);
            assert!(cycle >= Duration::from_millis(4000));
            assert!(cycle <= Duration::from_millis(6000));
        }
    }

    #[test]
    fn simulate_publishes_alternating_phases() {
        let light = fast_light(20);
        light.simulate().unwrap();

        let mut phases = Vec::new();
        let mut stamps = Vec::new();
        let start = Instant::now();
        for _ in 0..4 {
            phases.push(light.queue.receive());
            stamps.push(start.elapsed());
        }
        light.shutdown();

        assert_eq!(
            phases,
            vec![Phase::Green, Phase::Red, Phase::Green, Phase::Red]
        );
        for pair in stamps.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= Duration::from_millis(10), "gap too short: {:?}", gap);
            assert!(gap < Duration::from_millis(500), "gap too long: {:?}", gap);
        }
    }

    #[test]
    fn simulate_twice_is_rejected() {
        let light = fast_light(1_000);
        light.simulate().unwrap();
        let err = light.simulate().unwrap_err();
        assert!(matches!(err, IntersectionError::AlreadySimulating { .. }));
        light.shutdown();
    }

    #[test]
    fn shutdown_freezes_the_phase() {
        let light = fast_light(5);
        light.simulate().unwrap();
        light.queue.receive();
        light.shutdown();
        thread::sleep(Duration::from_millis(30));
        let frozen = light.current_phase();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(light.current_phase(), frozen);
    }
}

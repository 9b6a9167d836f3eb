//! Minute-granularity occupancy confidence. State is single-byte atomics;
//! multi-field updates run inside `critical_section::with`.

use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};

use crate::{config::TrvConfig, sensor::Sensor};

const ACTIVITY_COUNTDOWN_M: u8 = 2;

#[derive(Debug, Default)]
struct OccupancyShared {
    occupation_countdown_m: AtomicU8,
    activity_countdown_m: AtomicU8,
    confidence_pc: AtomicU8,
    vacancy_h: AtomicU8,
    vacancy_m: AtomicU8,
}

/// Cloneable, `Send + Sync` handle for reporting occupancy evidence.
#[derive(Debug, Clone)]
pub struct OccupancyEvents {
    shared: Arc<OccupancyShared>,
    timeout_m: u8,
    recent_threshold_m: u8,
}

impl OccupancyEvents {
    // Not for synthetic events such as a schedule starting.
    pub fn mark_as_occupied(&self) {
        let shared = &self.shared;
        critical_section::with(|_| {
            shared.confidence_pc.store(100, Ordering::Release);
            shared
                .occupation_countdown_m
                .store(self.timeout_m, Ordering::Release);
            shared
                .activity_countdown_m
                .store(ACTIVITY_COUNTDOWN_M, Ordering::Release);
            shared.vacancy_h.store(0, Ordering::Release);
            shared.vacancy_m.store(0, Ordering::Release);
        });
    }

    /// Weak evidence: never makes the room "recently occupied".
    pub fn mark_as_possibly_occupied(&self) {
        let shared = &self.shared;
        critical_section::with(|_| {
            let countdown = shared.occupation_countdown_m.load(Ordering::Acquire);
            if countdown < self.recent_threshold_m {
                shared
                    .occupation_countdown_m
                    .store(self.recent_threshold_m, Ordering::Release);
            }
            let floor = confidence_for(self.recent_threshold_m, self.timeout_m);
            if shared.confidence_pc.load(Ordering::Acquire) < floor {
                shared.confidence_pc.store(floor, Ordering::Release);
            }
            shared
                .activity_countdown_m
                .store(ACTIVITY_COUNTDOWN_M, Ordering::Release);
            shared.vacancy_h.store(0, Ordering::Release);
            shared.vacancy_m.store(0, Ordering::Release);
        });
    }
}

fn confidence_for(countdown_m: u8, timeout_m: u8) -> u8 {
    if countdown_m == 0 || timeout_m == 0 {
        return 0;
    }
    let pc = (u16::from(countdown_m) * 100).div_ceil(u16::from(timeout_m));
    pc.min(100) as u8
}

pub trait OccupancySignal: Send {
    fn tick_minute(&mut self) -> u8;
    fn mark_as_occupied(&self);
    fn mark_as_possibly_occupied(&self);
    fn events(&self) -> Option<OccupancyEvents>;

    fn is_likely_occupied(&self) -> bool;
    fn is_likely_recently_occupied(&self) -> bool;
    fn is_likely_unoccupied(&self) -> bool;
    fn reported_recently(&self) -> bool;
    fn occupancy_percent(&self) -> u8;
    /// Whole hours vacant; zero while occupied, saturates at 255.
    fn vacancy_h(&self) -> u8;
    fn vacancy_minutes(&self) -> u16;

    /// 1 not occupied, 2 possibly occupied, 3 probably occupied; 0 not disclosed.
    fn two_bit_occupancy_value(&self) -> u8 {
        if self.is_likely_recently_occupied() {
            3
        } else if self.is_likely_occupied() {
            2
        } else {
            1
        }
    }

    fn long_vacant(&self) -> bool {
        self.vacancy_h() > 24
    }

    fn long_long_vacant(&self) -> bool {
        self.vacancy_h() > 48
    }

    // Decaying with no fresh reports: worth running costlier detection.
    fn increase_check_for_occupancy(&self) -> bool {
        !self.is_likely_recently_occupied() && self.is_likely_occupied() && !self.reported_recently()
    }
}

#[derive(Debug)]
pub struct OccupancyTracker {
    events: OccupancyEvents,
}

impl OccupancyTracker {
    pub fn new(config: &TrvConfig) -> Self {
        Self {
            events: OccupancyEvents {
                shared: Arc::new(OccupancyShared::default()),
                timeout_m: config.occupation_timeout_m(),
                recent_threshold_m: config.occupation_recent_threshold_m(),
            },
        }
    }

    pub fn occupation_countdown_m(&self) -> u8 {
        self.events
            .shared
            .occupation_countdown_m
            .load(Ordering::Acquire)
    }

    pub fn activity_countdown_m(&self) -> u8 {
        self.events.shared.activity_countdown_m.load(Ordering::Acquire)
    }
}

impl OccupancySignal for OccupancyTracker {
    fn tick_minute(&mut self) -> u8 {
        let events = &self.events;
        let shared = &events.shared;
        critical_section::with(|_| {
            let countdown = shared
                .occupation_countdown_m
                .load(Ordering::Acquire)
                .saturating_sub(1);
            shared
                .occupation_countdown_m
                .store(countdown, Ordering::Release);

            let activity = shared.activity_countdown_m.load(Ordering::Acquire);
            shared
                .activity_countdown_m
                .store(activity.saturating_sub(1), Ordering::Release);

            let confidence = confidence_for(countdown, events.timeout_m);
            shared.confidence_pc.store(confidence, Ordering::Release);

            if confidence != 0 {
                shared.vacancy_h.store(0, Ordering::Release);
                shared.vacancy_m.store(0, Ordering::Release);
            } else {
                let hours = shared.vacancy_h.load(Ordering::Acquire);
                if hours < u8::MAX {
                    let minutes = shared.vacancy_m.load(Ordering::Acquire) + 1;
                    if minutes >= 60 {
                        shared.vacancy_m.store(0, Ordering::Release);
                        shared.vacancy_h.store(hours + 1, Ordering::Release);
                    } else {
                        shared.vacancy_m.store(minutes, Ordering::Release);
                    }
                }
            }
            confidence
        })
    }

    fn mark_as_occupied(&self) {
        self.events.mark_as_occupied();
    }

    fn mark_as_possibly_occupied(&self) {
        self.events.mark_as_possibly_occupied();
    }

    fn events(&self) -> Option<OccupancyEvents> {
        Some(self.events.clone())
    }

    fn is_likely_occupied(&self) -> bool {
        self.occupation_countdown_m() != 0
    }

    fn is_likely_recently_occupied(&self) -> bool {
        self.occupation_countdown_m() > self.events.recent_threshold_m
    }

    fn is_likely_unoccupied(&self) -> bool {
        !self.is_likely_occupied()
    }

    fn reported_recently(&self) -> bool {
        self.activity_countdown_m() != 0
    }

    fn occupancy_percent(&self) -> u8 {
        self.events.shared.confidence_pc.load(Ordering::Acquire)
    }

    fn vacancy_h(&self) -> u8 {
        if self.occupancy_percent() != 0 {
            return 0;
        }
        self.events.shared.vacancy_h.load(Ordering::Acquire)
    }

    fn vacancy_minutes(&self) -> u16 {
        if self.occupancy_percent() != 0 {
            return 0;
        }
        // One critical section so the hour roll-over cannot be seen half done.
        let shared = &self.events.shared;
        let (hours, minutes) = critical_section::with(|_| {
            (
                shared.vacancy_h.load(Ordering::Acquire),
                shared.vacancy_m.load(Ordering::Acquire),
            )
        });
        u16::from(hours) * 60 + u16::from(minutes)
    }
}

impl Sensor for OccupancyTracker {
    type Value = u8;

    fn read(&mut self) -> u8 {
        self.tick_minute()
    }

    fn get(&self) -> u8 {
        self.occupancy_percent()
    }

    fn tag(&self) -> Option<&'static str> {
        Some("occ|%")
    }
}

/// Used when the unit has no occupancy sensing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOccupancy;

impl OccupancySignal for NoOccupancy {
    fn tick_minute(&mut self) -> u8 {
        0
    }

    fn mark_as_occupied(&self) {}

    fn mark_as_possibly_occupied(&self) {}

    fn events(&self) -> Option<OccupancyEvents> {
        None
    }

    fn is_likely_occupied(&self) -> bool {
        false
    }

    fn is_likely_recently_occupied(&self) -> bool {
        false
    }

    fn is_likely_unoccupied(&self) -> bool {
        false
    }

    fn reported_recently(&self) -> bool {
        false
    }

    fn occupancy_percent(&self) -> u8 {
        0
    }

    fn vacancy_h(&self) -> u8 {
        0
    }

    fn vacancy_minutes(&self) -> u16 {
        0
    }

    fn two_bit_occupancy_value(&self) -> u8 {
        0
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn tracker() -> OccupancyTracker {
        OccupancyTracker::new(&TrvConfig::default())
    }

    #[test]
    fn starts_unoccupied() {
        let occupancy = tracker();
        assert!(!occupancy.is_likely_occupied());
        assert!(occupancy.is_likely_unoccupied());
        assert_eq!(occupancy.two_bit_occupancy_value(), 1);
        assert_eq!(occupancy.vacancy_h(), 0);
    }

    #[test]
    fn occupied_until_timeout_expires() {
        let mut occupancy = tracker();
        occupancy.mark_as_occupied();
        assert_eq!(occupancy.occupancy_percent(), 100);
        assert_eq!(occupancy.two_bit_occupancy_value(), 3);

        for _ in 0..(TrvConfig::default().occupation_timeout_m() - 1) {
            occupancy.tick_minute();
        }
        assert!(occupancy.is_likely_occupied());

        occupancy.tick_minute();
        assert!(!occupancy.is_likely_occupied());
        assert_eq!(occupancy.occupancy_percent(), 0);
    }

    #[test]
    fn recent_window_ends_at_two_thirds() {
        let mut occupancy = tracker();
        occupancy.mark_as_occupied();

        // 50 -> 34 after 16 ticks, still above the 33 minute threshold.
        for _ in 0..16 {
            occupancy.tick_minute();
        }
        assert!(occupancy.is_likely_recently_occupied());

        occupancy.tick_minute();
        assert!(!occupancy.is_likely_recently_occupied());
        assert!(occupancy.is_likely_occupied());
        assert_eq!(occupancy.two_bit_occupancy_value(), 2);
    }

    #[test]
    fn weak_evidence_is_possible_not_probable() {
        let mut occupancy = tracker();
        occupancy.mark_as_possibly_occupied();

        assert!(occupancy.is_likely_occupied());
        assert!(!occupancy.is_likely_recently_occupied());
        assert!(occupancy.reported_recently());
        assert_eq!(occupancy.two_bit_occupancy_value(), 2);
        assert!(!occupancy.increase_check_for_occupancy());

        occupancy.tick_minute();
        occupancy.tick_minute();
        assert!(!occupancy.reported_recently());
        assert!(occupancy.increase_check_for_occupancy());
    }

    #[test]
    fn weak_evidence_does_not_shorten_strong() {
        let occupancy = tracker();
        occupancy.mark_as_occupied();
        occupancy.mark_as_possibly_occupied();
        assert_eq!(occupancy.occupation_countdown_m(), 50);
        assert_eq!(occupancy.occupancy_percent(), 100);
    }

    #[test]
    fn vacancy_accumulates_and_resets() {
        let mut occupancy = tracker();
        for _ in 0..(25 * 60 + 1) {
            occupancy.tick_minute();
        }
        assert_eq!(occupancy.vacancy_h(), 25);
        assert_eq!(occupancy.vacancy_minutes(), 25 * 60 + 1);
        assert!(occupancy.long_vacant());
        assert!(!occupancy.long_long_vacant());

        occupancy.mark_as_occupied();
        assert_eq!(occupancy.vacancy_h(), 0);
        assert_eq!(occupancy.vacancy_minutes(), 0);
    }

    #[test]
    fn vacancy_hours_do_not_wrap() {
        let mut occupancy = tracker();
        for _ in 0..(300 * 60) {
            occupancy.tick_minute();
        }
        assert_eq!(occupancy.vacancy_h(), u8::MAX);
        assert!(occupancy.long_long_vacant());
    }

    #[test]
    fn evidence_from_another_thread_is_not_lost() {
        let mut occupancy = tracker();
        let events = occupancy.events().expect("tracker always has events");

        let reporter = thread::spawn(move || {
            for _ in 0..1_000 {
                events.mark_as_occupied();
            }
        });
        for _ in 0..1_000 {
            occupancy.tick_minute();
        }
        reporter.join().expect("reporter thread panicked");

        // Whichever side wrote last, confidence matches the countdown it left.
        let countdown = occupancy.occupation_countdown_m();
        assert!(countdown <= 50);
        assert_eq!(
            occupancy.occupancy_percent(),
            confidence_for(countdown, 50),
            "confidence and countdown disagree"
        );
    }

    #[test]
    fn disabled_occupancy_reports_defaults() {
        let mut occupancy = NoOccupancy;
        occupancy.mark_as_occupied();
        assert_eq!(occupancy.tick_minute(), 0);
        assert!(!occupancy.is_likely_occupied());
        assert!(!occupancy.is_likely_unoccupied());
        assert_eq!(occupancy.two_bit_occupancy_value(), 0);
        assert!(occupancy.events().is_none());
    }
}

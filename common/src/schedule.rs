use chrono::{DateTime, Duration, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::config::TrvConfig;

pub const MAX_PROGRAMMES: usize = 2;
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// One daily WARM period starting at a fixed local time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WarmProgramme {
    #[serde(rename = "startMinutes")]
    pub start_minutes: u16,
}

impl WarmProgramme {
    pub fn validate(&self) -> bool {
        self.start_minutes < MINUTES_PER_DAY
    }

    /// True while `now_minutes` lies in `[start, start + period)`, wrapping at midnight.
    pub fn is_on_at(&self, now_minutes: u16, period_m: u16) -> bool {
        let since_start = (now_minutes + MINUTES_PER_DAY - self.start_minutes) % MINUTES_PER_DAY;
        since_start < period_m
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Schedule {
    pub programmes: Vec<WarmProgramme>,
}

impl Schedule {
    pub fn normalize(&mut self) {
        self.programmes.retain(WarmProgramme::validate);
        self.programmes.sort_by_key(|programme| programme.start_minutes);
        self.programmes.dedup();
        self.programmes.truncate(MAX_PROGRAMMES);
    }

    pub fn is_any_set(&self) -> bool {
        !self.programmes.is_empty()
    }

    /// Replaces slot `which`, or appends when `which` is the next free slot.
    /// False if the slot would leave a gap or the start time is invalid.
    pub fn set_programme(&mut self, which: usize, start_minutes: u16) -> bool {
        let programme = WarmProgramme { start_minutes };
        if which >= MAX_PROGRAMMES || which > self.programmes.len() || !programme.validate() {
            return false;
        }
        if which < self.programmes.len() {
            self.programmes[which] = programme;
        } else {
            self.programmes.push(programme);
        }
        self.normalize();
        true
    }

    pub fn clear_programme(&mut self, which: usize) {
        if which < self.programmes.len() {
            self.programmes.remove(which);
        }
    }

    /// Comfort bias keeps rooms warm for longer.
    pub fn on_period_m(config: &TrvConfig, comfort: bool) -> u16 {
        if comfort {
            u16::from(config.learned_on_period_comfort_m)
        } else {
            u16::from(config.learned_on_period_m)
        }
    }

    pub fn is_any_schedule_on_warm_now(&self, now_minutes: u16, period_m: u16) -> bool {
        self.programmes
            .iter()
            .any(|programme| programme.is_on_at(now_minutes, period_m))
    }

    pub fn is_any_schedule_starting_now(&self, now_minutes: u16) -> bool {
        self.programmes
            .iter()
            .any(|programme| programme.start_minutes == now_minutes)
    }

    pub fn next_start_epoch<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<i64> {
        let now_minute = (now.hour() * 60 + now.minute()) as u16;
        let mut best: Option<DateTime<Tz>> = None;

        for day_offset in 0..2i64 {
            for programme in &self.programmes {
                if day_offset == 0 && programme.start_minutes <= now_minute {
                    continue;
                }

                let date = now.date_naive() + Duration::days(day_offset);
                let hour = u32::from(programme.start_minutes / 60);
                let minute = u32::from(programme.start_minutes % 60);

                let Some(naive) = date.and_hms_opt(hour, minute, 0) else {
                    continue;
                };

                let Some(candidate) = now.timezone().from_local_datetime(&naive).earliest() else {
                    continue;
                };

                if best.as_ref().map(|current| candidate < *current).unwrap_or(true) {
                    best = Some(candidate);
                }
            }
        }

        best.map(|dt| dt.timestamp())
    }
}

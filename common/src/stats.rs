//! Rolling by-hour statistics and the predictive-warming query built on them.
//!
//! Each stats set is 24 bytes, one per hour of the day. Writes happen once per
//! full hourly sample so a wear-limited medium sees at most a couple of dozen
//! byte updates per hour.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::codec::{compress_temp_c16, STATS_UNSET_BYTE};

pub const HOURS_PER_DAY: usize = 24;
pub const STATS_SETS: usize = 6;
pub const STATS_SMOOTH_SHIFT: u32 = 3;
// Top value is reserved for unset.
pub const MAX_STATS_AMBLIGHT: u8 = 254;
pub const OCCUPIED_HOUR_THRESHOLD_PC: u8 = 50;
pub const ZAP_ALL_BYTES: u32 = 65_536;

const QUARTILE_OTHERS_MAX: u8 = (HOURS_PER_DAY / 4 - 1) as u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsSet {
    TempByHour,
    TempByHourSmoothed,
    AmbLightByHour,
    AmbLightByHourSmoothed,
    OccupancyByHour,
    OccupancyByHourSmoothed,
}

impl StatsSet {
    pub const ALL: [StatsSet; STATS_SETS] = [
        Self::TempByHour,
        Self::TempByHourSmoothed,
        Self::AmbLightByHour,
        Self::AmbLightByHourSmoothed,
        Self::OccupancyByHour,
        Self::OccupancyByHourSmoothed,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::TempByHour => 0,
            Self::TempByHourSmoothed => 1,
            Self::AmbLightByHour => 2,
            Self::AmbLightByHourSmoothed => 3,
            Self::OccupancyByHour => 4,
            Self::OccupancyByHourSmoothed => 5,
        }
    }

}

/// Byte-persistence collaborator holding every stats set.
pub trait StatsStore {
    /// Raw byte for `hour`, [`STATS_UNSET_BYTE`] if unset or `hour` is out of range.
    fn get(&self, set: StatsSet, hour: u8) -> u8;

    fn put(&mut self, set: StatsSet, hour: u8, value: u8);

    /// Erases at most `max_bytes` bytes that are not already unset.
    /// Returns true once the whole store is unset.
    fn erase_range(&mut self, max_bytes: u32) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStatsStore {
    sets: [[u8; HOURS_PER_DAY]; STATS_SETS],
    #[serde(skip)]
    writes: u32,
}

impl Default for MemoryStatsStore {
    fn default() -> Self {
        Self {
            sets: [[STATS_UNSET_BYTE; HOURS_PER_DAY]; STATS_SETS],
            writes: 0,
        }
    }
}

impl MemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_count(&self) -> u32 {
        self.writes
    }

    pub fn by_hour(&self, set: StatsSet) -> &[u8; HOURS_PER_DAY] {
        &self.sets[set.index()]
    }
}

impl StatsStore for MemoryStatsStore {
    fn get(&self, set: StatsSet, hour: u8) -> u8 {
        self.sets[set.index()]
            .get(usize::from(hour))
            .copied()
            .unwrap_or(STATS_UNSET_BYTE)
    }

    fn put(&mut self, set: StatsSet, hour: u8, value: u8) {
        if let Some(slot) = self.sets[set.index()].get_mut(usize::from(hour)) {
            *slot = value;
            self.writes = self.writes.saturating_add(1);
        }
    }

    fn erase_range(&mut self, max_bytes: u32) -> bool {
        let mut budget = max_bytes;
        for byte in self.sets.iter_mut().flat_map(|set| set.iter_mut()) {
            if *byte == STATS_UNSET_BYTE {
                continue;
            }
            if budget == 0 {
                return false;
            }
            *byte = STATS_UNSET_BYTE;
            budget -= 1;
            self.writes = self.writes.saturating_add(1);
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSample {
    pub temp_c16: Option<i16>,
    pub ambient_light: Option<u8>,
    pub occupancy_pc: Option<u8>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: i32,
    count: u8,
}

impl Accumulator {
    fn add(&mut self, value: Option<i32>) {
        if let Some(value) = value {
            self.sum += value;
            self.count = self.count.saturating_add(1);
        }
    }

    fn mean(&self) -> Option<i32> {
        (self.count > 0).then(|| self.sum / i32::from(self.count))
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PendingSamples {
    hour: Option<u8>,
    temp_c16: Accumulator,
    ambient_light: Accumulator,
    occupancy_pc: Accumulator,
}

/// 1/8 weight on `new_value` with stochastic rounding; never above `max(old, new)`.
pub fn smooth_stats_value(old_smoothed: u8, new_value: u8, rng: &mut fastrand::Rng) -> u8 {
    if old_smoothed == new_value {
        return old_smoothed;
    }
    let weighted = u16::from(old_smoothed) * ((1 << STATS_SMOOTH_SHIFT) - 1) + u16::from(new_value);
    let dither = u16::from(rng.u8(..)) & ((1 << STATS_SMOOTH_SHIFT) - 1);
    ((weighted + dither) >> STATS_SMOOTH_SHIFT) as u8
}

pub struct Statistics<S> {
    store: S,
    rng: fastrand::Rng,
    current_hour: u8,
    pending: PendingSamples,
    dirty: bool,
}

impl<S: StatsStore> Statistics<S> {
    pub fn new(store: S) -> Self {
        Self::with_rng(store, fastrand::Rng::new())
    }

    pub fn with_seed(store: S, seed: u64) -> Self {
        Self::with_rng(store, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(store: S, rng: fastrand::Rng) -> Self {
        Self {
            store,
            rng,
            current_hour: 0,
            pending: PendingSamples::default(),
            dirty: false,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn current_hour(&self) -> u8 {
        self.current_hour
    }

    pub fn set_current_hour(&mut self, hour: u8) {
        if usize::from(hour) < HOURS_PER_DAY {
            self.current_hour = hour;
        }
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    // Sub-samples only accumulate; the full sample writes their mean.
    pub fn sample_stats(&mut self, full_sample: bool, hour: u8, sample: StatsSample) {
        self.set_current_hour(hour);
        if self.pending.hour != Some(hour) {
            if self.pending.hour.is_some() {
                debug!(stale = ?self.pending.hour, hour, "dropping sub-samples from another hour");
            }
            self.pending = PendingSamples {
                hour: Some(hour),
                ..PendingSamples::default()
            };
        }
        self.pending.temp_c16.add(sample.temp_c16.map(i32::from));
        self.pending.ambient_light.add(sample.ambient_light.map(i32::from));
        self.pending.occupancy_pc.add(sample.occupancy_pc.map(i32::from));

        if !full_sample {
            return;
        }

        let pending = std::mem::take(&mut self.pending);
        if let Some(temp_c16) = pending.temp_c16.mean() {
            let compressed = compress_temp_c16(temp_c16 as i16);
            self.record(StatsSet::TempByHour, StatsSet::TempByHourSmoothed, hour, compressed);
        }
        if let Some(light) = pending.ambient_light.mean() {
            let light = (light as u8).min(MAX_STATS_AMBLIGHT);
            self.record(StatsSet::AmbLightByHour, StatsSet::AmbLightByHourSmoothed, hour, light);
        }
        if let Some(occupancy) = pending.occupancy_pc.mean() {
            let occupancy = (occupancy as u8).min(100);
            self.record(
                StatsSet::OccupancyByHour,
                StatsSet::OccupancyByHourSmoothed,
                hour,
                occupancy,
            );
        }
    }

    fn record(&mut self, last: StatsSet, smoothed: StatsSet, hour: u8, value: u8) {
        self.store.put(last, hour, value);
        let old = self.store.get(smoothed, hour);
        let new_smoothed = if old == STATS_UNSET_BYTE {
            value
        } else {
            smooth_stats_value(old, value, &mut self.rng)
        };
        self.store.put(smoothed, hour, new_smoothed);
        self.dirty = true;
        debug!(?last, hour, value, new_smoothed, "stats sample recorded");
    }

    /// 0 erases up to 65536 bytes. True once every byte is unset.
    pub fn zap_stats(&mut self, max_bytes_to_erase: u16) -> bool {
        let budget = if max_bytes_to_erase == 0 {
            ZAP_ALL_BYTES
        } else {
            u32::from(max_bytes_to_erase)
        };
        self.pending = PendingSamples::default();
        self.dirty = true;
        let complete = self.store.erase_range(budget);
        if complete {
            info!("statistics erased");
        } else {
            debug!(budget, "statistics erase in progress");
        }
        complete
    }

    pub fn get_by_hour_stat(&self, hour: u8, set: StatsSet) -> u8 {
        if usize::from(hour) >= HOURS_PER_DAY {
            return STATS_UNSET_BYTE;
        }
        self.store.get(set, hour)
    }

    // Ties count against membership; any unset hour gives false.
    pub fn in_outlier_quartile(&self, in_top: bool, set: StatsSet, hour: Option<u8>) -> bool {
        let hh = hour.unwrap_or(self.current_hour);
        let value = self.get_by_hour_stat(hh, set);
        if value == STATS_UNSET_BYTE {
            return false;
        }

        let mut at_or_above = 0_u8;
        let mut at_or_below = 0_u8;
        for other in (0..HOURS_PER_DAY as u8).filter(|&h| h != hh) {
            let v = self.store.get(set, other);
            if v == STATS_UNSET_BYTE {
                return false;
            }
            if v >= value {
                at_or_above += 1;
            }
            if v <= value {
                at_or_below += 1;
            }
        }

        if in_top {
            at_or_above <= QUARTILE_OTHERS_MAX
        } else {
            at_or_below <= QUARTILE_OTHERS_MAX
        }
    }

    pub fn should_be_warmed_at_hour(&self, hh: u8) -> bool {
        if usize::from(hh) >= HOURS_PER_DAY {
            return false;
        }
        // Historically cold at this hour: nobody was heating it.
        if self.in_outlier_quartile(false, StatsSet::TempByHourSmoothed, Some(hh)) {
            return false;
        }
        if self.in_outlier_quartile(true, StatsSet::TempByHourSmoothed, Some(hh)) {
            return true;
        }
        let occupancy = self.store.get(StatsSet::OccupancyByHourSmoothed, hh);
        if occupancy != STATS_UNSET_BYTE && occupancy >= OCCUPIED_HOUR_THRESHOLD_PC {
            return true;
        }
        self.in_outlier_quartile(true, StatsSet::AmbLightByHourSmoothed, Some(hh))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn filled(set: StatsSet, values: [u8; HOURS_PER_DAY]) -> MemoryStatsStore {
        let mut store = MemoryStatsStore::new();
        for (hour, value) in values.into_iter().enumerate() {
            store.put(set, hour as u8, value);
        }
        store
    }

    fn ramp() -> [u8; HOURS_PER_DAY] {
        core::array::from_fn(|hour| 100 + hour as u8)
    }

    #[test]
    fn smoothing_never_exceeds_inputs() {
        let mut rng = fastrand::Rng::with_seed(7);
        for old in 0..=u8::MAX {
            for new in 0..=u8::MAX {
                assert!(smooth_stats_value(old, new, &mut rng) <= old.max(new));
            }
        }
    }

    #[test]
    fn smoothing_creeps_up_by_sub_unit_steps() {
        let mut rng = fastrand::Rng::with_seed(42);
        let mut smoothed = 100;
        for _ in 0..1_000 {
            smoothed = smooth_stats_value(smoothed, 101, &mut rng);
            if smoothed == 101 {
                break;
            }
        }
        assert_eq!(smoothed, 101);
    }

    #[test]
    fn full_sample_writes_last_and_smoothed_sets() {
        let mut stats = Statistics::with_seed(MemoryStatsStore::new(), 1);
        let sample = StatsSample {
            temp_c16: Some(20 << 4),
            ambient_light: Some(255),
            occupancy_pc: Some(100),
        };

        stats.sample_stats(false, 9, sample);
        assert_eq!(stats.store().write_count(), 0);

        stats.sample_stats(true, 9, sample);
        assert_eq!(stats.get_by_hour_stat(9, StatsSet::TempByHour), compress_temp_c16(20 << 4));
        assert_eq!(
            stats.get_by_hour_stat(9, StatsSet::TempByHourSmoothed),
            compress_temp_c16(20 << 4)
        );
        assert_eq!(stats.get_by_hour_stat(9, StatsSet::AmbLightByHour), MAX_STATS_AMBLIGHT);
        assert_eq!(stats.get_by_hour_stat(9, StatsSet::OccupancyByHourSmoothed), 100);
        assert_eq!(stats.store().write_count(), 6);
        assert!(stats.take_dirty());
        assert!(!stats.take_dirty());
    }

    #[test]
    fn sub_samples_are_averaged_into_full_sample() {
        let mut stats = Statistics::with_seed(MemoryStatsStore::new(), 1);
        let at = |temp_c16| StatsSample {
            temp_c16: Some(temp_c16),
            ..StatsSample::default()
        };

        stats.sample_stats(false, 3, at(18 << 4));
        stats.sample_stats(true, 3, at(20 << 4));

        assert_eq!(stats.get_by_hour_stat(3, StatsSet::TempByHour), compress_temp_c16(19 << 4));
        assert_eq!(stats.get_by_hour_stat(3, StatsSet::AmbLightByHour), STATS_UNSET_BYTE);
    }

    #[test]
    fn sub_samples_from_a_missed_hour_are_dropped() {
        let mut stats = Statistics::with_seed(MemoryStatsStore::new(), 1);
        let at = |temp_c16| StatsSample {
            temp_c16: Some(temp_c16),
            ..StatsSample::default()
        };

        stats.sample_stats(false, 3, at(10 << 4));
        stats.sample_stats(false, 3, at(10 << 4));
        // Hour 3 never got its full sample.
        stats.sample_stats(true, 4, at(22 << 4));

        assert_eq!(stats.get_by_hour_stat(4, StatsSet::TempByHour), compress_temp_c16(22 << 4));
        assert_eq!(stats.get_by_hour_stat(3, StatsSet::TempByHour), STATS_UNSET_BYTE);

        stats.sample_stats(false, 5, at(16 << 4));
        stats.sample_stats(true, 5, at(18 << 4));
        assert_eq!(stats.get_by_hour_stat(5, StatsSet::TempByHour), compress_temp_c16(17 << 4));
    }

    #[test]
    fn out_of_range_hour_reads_unset() {
        let stats = Statistics::with_seed(filled(StatsSet::TempByHour, ramp()), 1);
        assert_eq!(stats.get_by_hour_stat(24, StatsSet::TempByHour), STATS_UNSET_BYTE);
        assert_eq!(stats.get_by_hour_stat(23, StatsSet::TempByHour), 123);
    }

    #[test]
    fn quartiles_on_a_ramp() {
        let stats = Statistics::with_seed(filled(StatsSet::TempByHour, ramp()), 1);

        assert!(stats.in_outlier_quartile(true, StatsSet::TempByHour, Some(23)));
        assert!(stats.in_outlier_quartile(true, StatsSet::TempByHour, Some(18)));
        assert!(!stats.in_outlier_quartile(true, StatsSet::TempByHour, Some(17)));
        assert!(stats.in_outlier_quartile(false, StatsSet::TempByHour, Some(0)));
        assert!(stats.in_outlier_quartile(false, StatsSet::TempByHour, Some(5)));
        assert!(!stats.in_outlier_quartile(false, StatsSet::TempByHour, Some(6)));
        assert!(!stats.in_outlier_quartile(false, StatsSet::TempByHour, Some(23)));
    }

    #[test]
    fn quartile_defaults_to_current_hour() {
        let mut stats = Statistics::with_seed(filled(StatsSet::TempByHour, ramp()), 1);
        stats.set_current_hour(22);
        assert!(stats.in_outlier_quartile(true, StatsSet::TempByHour, None));
        stats.set_current_hour(2);
        assert!(!stats.in_outlier_quartile(true, StatsSet::TempByHour, None));
    }

    #[test]
    fn quartile_needs_a_full_day_of_distinct_values() {
        let mut partial = ramp();
        partial[4] = STATS_UNSET_BYTE;
        let stats = Statistics::with_seed(filled(StatsSet::TempByHour, partial), 1);
        assert!(!stats.in_outlier_quartile(true, StatsSet::TempByHour, Some(23)));

        let flat = Statistics::with_seed(filled(StatsSet::TempByHour, [80; HOURS_PER_DAY]), 1);
        for hour in 0..24 {
            assert!(!flat.in_outlier_quartile(true, StatsSet::TempByHour, Some(hour)));
            assert!(!flat.in_outlier_quartile(false, StatsSet::TempByHour, Some(hour)));
        }
    }

    #[test]
    fn zap_erases_incrementally() {
        let mut store = MemoryStatsStore::new();
        for set in StatsSet::ALL {
            for hour in 0..24 {
                store.put(set, hour, 1);
            }
        }
        let mut stats = Statistics::with_seed(store, 1);

        assert!(!stats.zap_stats(100));
        assert!(stats.zap_stats(100));
        assert!(stats.zap_stats(1));
        for set in StatsSet::ALL {
            assert_eq!(stats.store().by_hour(set), &[STATS_UNSET_BYTE; HOURS_PER_DAY]);
        }
    }

    #[test]
    fn zap_zero_means_everything() {
        let mut stats = Statistics::with_seed(filled(StatsSet::AmbLightByHour, ramp()), 1);
        assert!(stats.zap_stats(0));
        assert_eq!(stats.get_by_hour_stat(0, StatsSet::AmbLightByHour), STATS_UNSET_BYTE);
    }

    #[test]
    fn warm_hours_predict_warming() {
        let stats = Statistics::with_seed(filled(StatsSet::TempByHourSmoothed, ramp()), 1);
        assert!(stats.should_be_warmed_at_hour(20));
        assert!(!stats.should_be_warmed_at_hour(1));
        assert!(!stats.should_be_warmed_at_hour(12));
        assert!(!stats.should_be_warmed_at_hour(24));
    }

    #[test]
    fn usually_occupied_hours_predict_warming() {
        let mut occupancy = [0; HOURS_PER_DAY];
        occupancy[7] = 80;
        let stats = Statistics::with_seed(filled(StatsSet::OccupancyByHourSmoothed, occupancy), 1);

        assert!(stats.should_be_warmed_at_hour(7));
        assert!(!stats.should_be_warmed_at_hour(8));
    }

    #[test]
    fn empty_store_predicts_nothing() {
        let stats = Statistics::with_seed(MemoryStatsStore::new(), 1);
        assert!((0..24).all(|hour| !stats.should_be_warmed_at_hour(hour)));
    }
}

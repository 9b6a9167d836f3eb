use std::sync::{
    atomic::{AtomicBool, AtomicU8, Ordering},
    Arc,
};

use tracing::debug;
use trv_common::{OccupancyEvents, Sensor};

/// Activations in one poll window at or above which voices are deemed present.
pub const VOICE_DETECTION_THRESHOLD: u8 = 2;

#[derive(Debug, Default)]
struct VoiceShared {
    count: AtomicU8,
    detected: AtomicBool,
}

/// Interrupt-side handle; cheap to clone into an ISR or callback thread.
#[derive(Debug, Clone)]
pub struct VoiceInterrupt {
    shared: Arc<VoiceShared>,
    occupancy: Option<OccupancyEvents>,
}

impl VoiceInterrupt {
    /// Counts one activation. Returns true as the interrupt is always cleared.
    pub fn handle_interrupt(&self) -> bool {
        let shared = &self.shared;
        let crossed = critical_section::with(|_| {
            let count = shared.count.load(Ordering::Acquire);
            if count == u8::MAX {
                return false;
            }
            shared.count.store(count + 1, Ordering::Release);
            if count + 1 >= VOICE_DETECTION_THRESHOLD {
                shared.detected.store(true, Ordering::Release);
                true
            } else {
                false
            }
        });

        // Could be a TV or radio, so only weak evidence.
        if crossed {
            if let Some(occupancy) = &self.occupancy {
                occupancy.mark_as_possibly_occupied();
            }
        }
        true
    }
}

/// Voice activity detector polled once per control tick.
#[derive(Debug)]
pub struct VoiceDetection {
    shared: Arc<VoiceShared>,
    occupancy: Option<OccupancyEvents>,
    value: u8,
}

impl VoiceDetection {
    pub fn new(occupancy: Option<OccupancyEvents>) -> Self {
        Self {
            shared: Arc::new(VoiceShared::default()),
            occupancy,
            value: 0,
        }
    }

    pub fn interrupt_handle(&self) -> VoiceInterrupt {
        VoiceInterrupt {
            shared: Arc::clone(&self.shared),
            occupancy: self.occupancy.clone(),
        }
    }

    pub fn is_detected(&self) -> bool {
        self.shared.detected.load(Ordering::Acquire)
    }
}

impl Sensor for VoiceDetection {
    type Value = u8;

    /// Latches the count for the window just ended and starts a new one.
    fn read(&mut self) -> u8 {
        let shared = &self.shared;
        self.value = critical_section::with(|_| {
            let count = shared.count.swap(0, Ordering::AcqRel);
            shared
                .detected
                .store(count >= VOICE_DETECTION_THRESHOLD, Ordering::Release);
            count
        });
        debug!(count = self.value, "voice count");
        self.value
    }

    fn get(&self) -> u8 {
        self.value
    }

    fn tag(&self) -> Option<&'static str> {
        Some("vac")
    }
}

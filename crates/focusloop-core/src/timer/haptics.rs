//! Vibration hints emitted on interval completion.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Short double pulse when a work interval finishes.
pub const WORK_COMPLETE_PATTERN: [u64; 3] = [200, 100, 200];
/// Longer pattern when the whole work + break sequence finishes.
pub const SEQUENCE_COMPLETE_PATTERN: [u64; 5] = [200, 100, 200, 100, 500];

/// Platform vibration capability.
///
/// `pattern` alternates on/off durations in milliseconds. Implementations
/// must not fail; a platform without vibration simply ignores the call.
pub trait HapticSink: Send + Sync + fmt::Debug {
    fn vibrate(&self, pattern: &[u64]);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HapticPatterns {
    pub work_complete: Vec<u64>,
    pub sequence_complete: Vec<u64>,
}

impl Default for HapticPatterns {
    fn default() -> Self {
        Self {
            work_complete: WORK_COMPLETE_PATTERN.to_vec(),
            sequence_complete: SEQUENCE_COMPLETE_PATTERN.to_vec(),
        }
    }
}

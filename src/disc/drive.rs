//! Target drive as seen by the editors.

use serde::{Deserialize, Serialize};

/// CD-DA byte rate: 44.1 kHz, 16-bit, stereo.
pub const AUDIO_BYTES_PER_SECOND: u64 = 176_400;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Currently selected writer and the medium it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drive {
    /// Device node, e.g. `/dev/sr0`
    pub device: String,

    /// Display name
    pub name: String,

    /// Free space of the inserted medium in bytes, if any
    pub capacity: Option<u64>,
}

impl Drive {
    pub fn new(device: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            name: name.into(),
            capacity: None,
        }
    }

    pub fn with_capacity(mut self, bytes: u64) -> Self {
        self.capacity = Some(bytes);
        self
    }

    /// Capacity expressed as audio playing time in nanoseconds.
    pub fn audio_capacity(&self) -> Option<i64> {
        self.capacity.map(|bytes| {
            let nanos = bytes as u128 * NANOS_PER_SECOND / AUDIO_BYTES_PER_SECOND as u128;
            i64::try_from(nanos).unwrap_or(i64::MAX)
        })
    }

    /// Capacity in bytes, clamped to the size type used in notifications.
    pub fn data_capacity(&self) -> Option<i64> {
        self.capacity
            .map(|bytes| i64::try_from(bytes).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_capacity_conversion() {
        let drive = Drive::new("/dev/sr0", "Writer").with_capacity(AUDIO_BYTES_PER_SECOND * 60);
        assert_eq!(drive.audio_capacity(), Some(60 * 1_000_000_000));
        assert_eq!(drive.data_capacity(), Some(AUDIO_BYTES_PER_SECOND as i64 * 60));
    }

    #[test]
    fn test_no_medium_no_capacity() {
        let drive = Drive::new("/dev/sr0", "Writer");
        assert_eq!(drive.audio_capacity(), None);
        assert_eq!(drive.data_capacity(), None);
    }
}

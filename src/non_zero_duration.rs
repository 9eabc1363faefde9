use serde::Deserialize;
use std::num::NonZeroU64;
use std::time::Duration;

/// Duration configured in whole seconds, zero is rejected at deserialization
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(from = "NonZeroU64")]
pub struct NonZeroDuration(Duration);

impl NonZeroDuration {
    pub fn from_non_zero_secs(secs: NonZeroU64) -> Self {
        Self(Duration::from_secs(secs.get()))
    }
}

impl From<NonZeroU64> for NonZeroDuration {
    fn from(secs: NonZeroU64) -> Self {
        Self::from_non_zero_secs(secs)
    }
}

impl From<NonZeroDuration> for Duration {
    fn from(duration: NonZeroDuration) -> Self {
        duration.0
    }
}

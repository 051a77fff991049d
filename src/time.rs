// This file is part of bin-lookup. Copyright © 2026 bin-lookup contributors.
// bin-lookup is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

use std::time::{Duration, SystemTime};

/// Wall-clock time as unsigned 64-bit milliseconds since the unix epoch. All this
/// service ever does with time is subtract it and report it, so a full calendar
/// library would be dead weight.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SimpleTime {
    unix_millis: u64,
}

impl SimpleTime {
    pub const UNIX_EPOCH: SimpleTime = SimpleTime::from_unix_millis(0);

    #[inline(always)]
    pub const fn from_unix_millis(unix_millis: u64) -> Self {
        Self { unix_millis }
    }

    #[inline(always)]
    pub const fn as_epoch_millis(&self) -> u64 {
        self.unix_millis
    }

    /// Whole seconds since the unix epoch. This is the granularity `/health` reports.
    #[inline(always)]
    pub const fn as_epoch_seconds(&self) -> u64 {
        Duration::from_millis(self.unix_millis).as_secs()
    }

    /// Current time as per the system clock. A clock set before the unix epoch reads as zero.
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default();
        // the u128 -> u64 millisecond truncation does not bite for several hundred million years
        #[allow(clippy::cast_possible_truncation)]
        let unix_millis = since_epoch.as_millis() as u64;
        Self::from_unix_millis(unix_millis)
    }

    /// Duration since some earlier time with millisecond precision, or zero if the result was negative
    #[inline(always)]
    pub fn duration_since(&self, earlier: Self) -> Duration {
        self.unix_millis
            .checked_sub(earlier.unix_millis)
            .map(Duration::from_millis)
            .unwrap_or_default()
    }

    /// Elapsed time between this SimpleTime and the present system clock time, or zero if the result was negative.
    pub fn elapsed(&self) -> Duration {
        Self::now().duration_since(*self)
    }
}

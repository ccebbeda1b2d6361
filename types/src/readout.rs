//! The four-slot `MM:SS` display.

use std::fmt;

use crate::Digit;

/// Largest minute value the two minute slots can show.
const MAX_DISPLAY_MINUTES: u32 = 99;

/// Display slots `[tens-of-minutes, ones-of-minutes, tens-of-seconds, ones-of-seconds]`.
///
/// Invariant: every slot is in `0..=9`. The total time is always derived from
/// the slots and never stored alongside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Readout([u8; 4]);

/// How [`Readout::from_remaining`] fit a second count into the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fold {
    /// Minutes fit in two digits.
    Exact,
    /// Exactly 100 minutes: shown as 99 minutes with 60 extra seconds.
    Folded,
    /// More than 100 minutes: the display saturates at `99:99`.
    Saturated { overflow_minutes: u32 },
}

impl Readout {
    pub const ZERO: Self = Self([0; 4]);
    pub const SATURATED: Self = Self([9; 4]);

    /// Push a digit in on the right; the leftmost slot falls off.
    pub fn shift_in(&mut self, digit: Digit) {
        self.0.copy_within(1.., 0);
        self.0[3] = digit.get();
    }

    #[must_use]
    pub fn minutes(self) -> u32 {
        u32::from(self.0[0]) * 10 + u32::from(self.0[1])
    }

    /// The seconds pair as entered; may exceed 59 (e.g. `01:90`).
    #[must_use]
    pub fn seconds(self) -> u32 {
        u32::from(self.0[2]) * 10 + u32::from(self.0[3])
    }

    #[must_use]
    pub fn total_seconds(self) -> u32 {
        self.minutes() * 60 + self.seconds()
    }

    /// Render a countdown value. Minutes above 99 are folded or saturated:
    ///
    /// - 100 minutes: minutes become 99 and 60 seconds move to the seconds pair
    ///   (6000 s reads `99:60`);
    /// - more than 100 minutes: `99:99`.
    #[must_use]
    pub fn from_remaining(remaining: u32) -> (Self, Fold) {
        let minutes = remaining / 60;
        let seconds = remaining % 60;

        match minutes.saturating_sub(MAX_DISPLAY_MINUTES) {
            0 => (Self::from_pair(minutes, seconds), Fold::Exact),
            1 => (
                Self::from_pair(MAX_DISPLAY_MINUTES, seconds + 60),
                Fold::Folded,
            ),
            overflow_minutes => (Self::SATURATED, Fold::Saturated { overflow_minutes }),
        }
    }

    // Both halves are capped at 99 so every slot stays a single digit.
    fn from_pair(minutes: u32, seconds: u32) -> Self {
        let minutes = minutes.min(99) as u8;
        let seconds = seconds.min(99) as u8;
        Self([minutes / 10, minutes % 10, seconds / 10, seconds % 10])
    }
}

impl fmt::Display for Readout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [m1, m2, s1, s2] = self.0;
        write!(f, "{m1}{m2}:{s1}{s2}")
    }
}

//! Core domain types for Megawave.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod readout;
pub use readout::{Fold, Readout};

use thiserror::Error;

// ============================================================================
// Digit
// ============================================================================

/// A single keypad digit, guaranteed to be in `0..=9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digit(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("digit out of range: {0} (expected 0-9)")]
pub struct InvalidDigit(pub i32);

impl Digit {
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i32> for Digit {
    type Error = InvalidDigit;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(v) if v <= 9 => Ok(Self(v)),
            _ => Err(InvalidDigit(value)),
        }
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// How a countdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CookOutcome {
    /// The countdown reached `00:00`.
    Completed,
    /// The cancellation token fired before the countdown reached zero.
    Canceled,
}

impl CookOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }
}

/// What a press of the start button did.
///
/// This is informational only; a refused start is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartOutcome {
    /// A cook cycle was already running; nothing changed.
    AlreadyCooking,
    /// The display read `00:00`; cooking never began.
    ZeroTime,
    /// A full cook cycle ran and the oven was reset afterwards.
    Cooked(CookOutcome),
}

impl StartOutcome {
    #[must_use]
    pub const fn cook_outcome(self) -> Option<CookOutcome> {
        match self {
            Self::Cooked(outcome) => Some(outcome),
            Self::AlreadyCooking | Self::ZeroTime => None,
        }
    }
}

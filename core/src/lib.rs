//! Core domain logic for Megawave.
//!
//! This crate owns the oven: the display/cooking state behind a single lock,
//! the digit-entry rules, and the cancellable countdown. Observability and
//! display output are injected collaborators; see [`OvenBuilder`].

mod metrics;
mod oven;
mod panel;

pub use megawave_types::{CookOutcome, Digit, InvalidDigit, Readout, StartOutcome};
pub use metrics::{Button, Meter, NoopMeter, OvenMetrics};
pub use oven::{MAX_DIGITS, Oven, OvenBuilder, TICK};
pub use panel::{DisplayPanel, NoopPanel};


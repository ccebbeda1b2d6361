//! Oven metrics.
//!
//! The oven only ever increments counters through [`Meter`]. [`OvenMetrics`]
//! is the in-process implementation: lock-free atomic counters that can be
//! read back or rendered in Prometheus text exposition format.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Which button was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Digit,
    Start,
}

impl Button {
    pub const ALL: [Self; 2] = [Self::Digit, Self::Start];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Digit => "digit",
            Self::Start => "start",
        }
    }

    const fn slot(self, while_cooking: bool) -> usize {
        let base = match self {
            Self::Digit => 0,
            Self::Start => 2,
        };
        if while_cooking { base + 1 } else { base }
    }
}

/// Metrics collaborator. Implementations must be cheap and thread-safe; the
/// oven calls them outside its state lock.
pub trait Meter: Send + Sync {
    /// `microwave.button_presses`, tagged by button and whether a cook cycle was active.
    fn record_button_press(&self, button: Button, while_cooking: bool);

    /// `microwave.cooking_sessions`.
    fn record_cooking_session(&self);
}

/// Discards all measurements.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMeter;

impl Meter for NoopMeter {
    fn record_button_press(&self, _button: Button, _while_cooking: bool) {}

    fn record_cooking_session(&self) {}
}

/// Atomic counters for one oven session.
#[derive(Debug)]
pub struct OvenMetrics {
    /// Indexed by [`Button::slot`].
    button_presses: [AtomicU64; 4],
    cooking_sessions: AtomicU64,
}

impl Default for OvenMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl OvenMetrics {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            button_presses: [
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
            ],
            cooking_sessions: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn button_presses(&self, button: Button, while_cooking: bool) -> u64 {
        self.button_presses[button.slot(while_cooking)].load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total_button_presses(&self) -> u64 {
        self.button_presses
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }

    #[must_use]
    pub fn cooking_sessions(&self) -> u64 {
        self.cooking_sessions.load(Ordering::Relaxed)
    }

    /// Exports all counters in Prometheus exposition format.
    #[must_use]
    pub fn export_prometheus(&self) -> String {
        let mut output = String::from(
            "# HELP microwave_button_presses_total Total button presses\n\
             # TYPE microwave_button_presses_total counter\n",
        );
        for button in Button::ALL {
            for while_cooking in [false, true] {
                let _ = writeln!(
                    output,
                    "microwave_button_presses_total{{type=\"{}\",while_cooking=\"{while_cooking}\"}} {}",
                    button.as_str(),
                    self.button_presses(button, while_cooking),
                );
            }
        }
        let _ = write!(
            output,
            "# HELP microwave_cooking_sessions_total Total cooking sessions started\n\
             # TYPE microwave_cooking_sessions_total counter\n\
             microwave_cooking_sessions_total {}\n",
            self.cooking_sessions(),
        );
        output
    }
}

impl Meter for OvenMetrics {
    fn record_button_press(&self, button: Button, while_cooking: bool) {
        self.button_presses[button.slot(while_cooking)].fetch_add(1, Ordering::Relaxed);
    }

    fn record_cooking_session(&self) {
        self.cooking_sessions.fetch_add(1, Ordering::Relaxed);
    }
}

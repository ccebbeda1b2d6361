//! The oven state machine.
//!
//! # Locking
//!
//! `digits`, `digit_count` and `cooking` live together in one [`OvenState`]
//! behind a single mutex. Every operation locks, decides and mutates, copies
//! out what it needs, and unlocks before touching any collaborator (logging,
//! metrics, spans, display output). Derived values such as the display string
//! are computed from a guard or from a copied [`Readout`], never from shared
//! state without the lock.
//!
//! # Cancellation
//!
//! The token passed to [`Oven::press_start`] is only observed at the wait
//! between ticks. A tick that has started always finishes its update and
//! output; cancellation short-circuits the next wait. The post-cycle reset
//! runs on both the completed and the canceled path.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use megawave_types::{CookOutcome, Digit, Fold, Readout, StartOutcome};
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, Instrument, debug, info, info_span, warn};

use crate::metrics::{Button, Meter, NoopMeter};
use crate::panel::{DisplayPanel, NoopPanel};

/// Digits accepted per entry before further presses are ignored.
pub const MAX_DIGITS: u8 = 4;

/// One countdown step.
pub const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
struct OvenState {
    readout: Readout,
    /// Digits entered since the last reset, `0..=MAX_DIGITS`.
    digit_count: u8,
    cooking: bool,
}

impl OvenState {
    fn clear_entry(&mut self) {
        self.readout = Readout::ZERO;
        self.digit_count = 0;
    }
}

/// A claimed cook cycle. Dropping it without [`CookCycle::finish`] means the
/// `press_start` future was dropped (timeout, abort, `select!`): the oven is
/// still reset so it never stays stuck cooking.
struct CookCycle<'a> {
    oven: &'a Oven,
    finished: bool,
}

impl CookCycle<'_> {
    fn finish(mut self) {
        self.oven.end_cycle();
        self.finished = true;
    }
}

impl Drop for CookCycle<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.oven.end_cycle();
        self.oven.panel.show(Readout::ZERO);
        self.oven
            .scoped(|| warn!("cook cycle dropped before finishing, oven reset"));
    }
}

/// Decision taken for a digit press while the lock was held.
enum Entry {
    Invalid,
    Busy,
    Full,
    Accepted { readout: Readout, digit_count: u8 },
}

/// A microwave control panel: `MM:SS` digit entry, a start button, and a
/// per-second countdown.
///
/// All methods take `&self`; share the oven between tasks with an [`Arc`].
pub struct Oven {
    state: Mutex<OvenState>,
    dispatch: Option<Dispatch>,
    meter: Arc<dyn Meter>,
    panel: Arc<dyn DisplayPanel>,
}

/// Capability bundle for [`Oven`]. Anything left unset is a no-op.
#[derive(Default)]
pub struct OvenBuilder {
    dispatch: Option<Dispatch>,
    meter: Option<Arc<dyn Meter>>,
    panel: Option<Arc<dyn DisplayPanel>>,
}

impl OvenBuilder {
    /// Route this oven's events and spans to `dispatch` instead of the
    /// process-wide default subscriber.
    pub fn dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn meter(mut self, meter: Arc<dyn Meter>) -> Self {
        self.meter = Some(meter);
        self
    }

    pub fn panel(mut self, panel: Arc<dyn DisplayPanel>) -> Self {
        self.panel = Some(panel);
        self
    }

    #[must_use]
    pub fn build(self) -> Oven {
        Oven {
            state: Mutex::new(OvenState::default()),
            dispatch: self.dispatch,
            meter: self.meter.unwrap_or_else(|| Arc::new(NoopMeter)),
            panel: self.panel.unwrap_or_else(|| Arc::new(NoopPanel)),
        }
    }
}

impl Default for Oven {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Oven {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Oven")
            .field("display", &state.readout.to_string())
            .field("digit_count", &state.digit_count)
            .field("cooking", &state.cooking)
            .finish_non_exhaustive()
    }
}

impl Oven {
    #[must_use]
    pub fn new() -> Self {
        OvenBuilder::default().build()
    }

    #[must_use]
    pub fn builder() -> OvenBuilder {
        OvenBuilder::default()
    }

    /// Current display as `MM:SS`.
    #[must_use]
    pub fn display(&self) -> String {
        self.readout().to_string()
    }

    #[must_use]
    pub fn readout(&self) -> Readout {
        self.lock().readout
    }

    #[must_use]
    pub fn is_cooking(&self) -> bool {
        self.lock().cooking
    }

    /// Handle a digit button press.
    ///
    /// Values outside `0..=9` are rejected. Presses while cooking and presses
    /// beyond [`MAX_DIGITS`] leave the display unchanged. None of these are
    /// errors; each is reported as a diagnostic event.
    pub fn press_digit(&self, digit: i32) {
        self.scoped(|| self.enter_digit(digit));
    }

    /// Handle a start button press.
    ///
    /// Runs the whole cook cycle before returning, so callers that must stay
    /// responsive should spawn this on its own task. Cancelling `cancel` ends
    /// the countdown at the next tick boundary; the oven is reset to `00:00`
    /// and ready for entry either way.
    pub async fn press_start(&self, cancel: &CancellationToken) -> StartOutcome {
        match &self.dispatch {
            Some(dispatch) => self.start(cancel).with_subscriber(dispatch.clone()).await,
            None => self.start(cancel).await,
        }
    }

    fn enter_digit(&self, raw: i32) {
        let (cooking, entry) = {
            let mut state = self.lock();
            let cooking = state.cooking;
            let entry = match Digit::try_from(raw) {
                Err(_) => Entry::Invalid,
                Ok(_) if cooking => Entry::Busy,
                Ok(_) if state.digit_count >= MAX_DIGITS => Entry::Full,
                Ok(digit) => {
                    state.readout.shift_in(digit);
                    state.digit_count += 1;
                    Entry::Accepted {
                        readout: state.readout,
                        digit_count: state.digit_count,
                    }
                }
            };
            (cooking, entry)
        };

        info!(digit = raw, cooking, "digit pressed");
        if !matches!(entry, Entry::Invalid) {
            self.meter.record_button_press(Button::Digit, cooking);
        }

        match entry {
            Entry::Invalid => warn!(digit = raw, "invalid digit ignored"),
            Entry::Busy => warn!(digit = raw, "digit ignored while cooking"),
            Entry::Full => warn!(digit = raw, "max digits reached, display not updated"),
            Entry::Accepted {
                readout,
                digit_count,
            } => {
                debug!(display = %readout, digit_count, "display updated");
                self.panel.show(readout);
            }
        }
    }

    async fn start(&self, cancel: &CancellationToken) -> StartOutcome {
        // Check and claim in one critical section so two concurrent starts
        // cannot both begin a cycle.
        let (was_cooking, readout, seconds) = {
            let mut state = self.lock();
            let was_cooking = state.cooking;
            let seconds = state.readout.total_seconds();
            if !was_cooking && seconds > 0 {
                state.cooking = true;
            }
            (was_cooking, state.readout, seconds)
        };

        info!(cooking = was_cooking, "start pressed");
        self.meter.record_button_press(Button::Start, was_cooking);

        if was_cooking {
            warn!("start ignored, already cooking");
            return StartOutcome::AlreadyCooking;
        }
        if seconds == 0 {
            warn!("cannot start with zero time");
            return StartOutcome::ZeroTime;
        }

        // From here on `cooking` is ours; the guard releases it even if this
        // future is dropped mid-countdown.
        let cycle = CookCycle {
            oven: self,
            finished: false,
        };

        let span = info_span!(
            "cooking_session",
            initial_display = %readout,
            duration_seconds = seconds,
        );
        self.meter.record_cooking_session();
        span.in_scope(|| info!(display = %readout, seconds, "cooking started"));

        let outcome = self.countdown(seconds, cancel).instrument(span.clone()).await;

        cycle.finish();

        span.in_scope(|| match outcome {
            CookOutcome::Completed => info!(outcome = outcome.as_str(), "cooking complete"),
            CookOutcome::Canceled => {
                // The completed path already showed 00:00 on its last tick.
                self.panel.show(Readout::ZERO);
                info!(outcome = outcome.as_str(), "cooking canceled");
            }
        });

        StartOutcome::Cooked(outcome)
    }

    /// Count `seconds` down to zero, one [`TICK`] at a time.
    ///
    /// Only called while `cooking` is set. Each tick stores and shows the
    /// remaining time before waiting; when both the token and the tick are
    /// ready, the token wins.
    pub(crate) async fn countdown(
        &self,
        seconds: u32,
        cancel: &CancellationToken,
    ) -> CookOutcome {
        let mut remaining = seconds;

        while remaining > 0 {
            let (readout, fold) = Readout::from_remaining(remaining);
            if let Fold::Saturated { overflow_minutes } = fold {
                warn!(
                    overflow_minutes,
                    remaining, "unexpected overflow minutes, saturating display"
                );
            }

            self.lock().readout = readout;

            debug!(display = %readout, remaining, "tick");
            self.panel.show(readout);

            tokio::select! {
                biased;
                () = cancel.cancelled() => return CookOutcome::Canceled,
                () = tokio::time::sleep(TICK) => remaining -= 1,
            }
        }

        self.lock().readout = Readout::ZERO;

        self.panel.show(Readout::ZERO);
        debug!(display = %Readout::ZERO, remaining, "tick");
        CookOutcome::Completed
    }

    fn end_cycle(&self) {
        let mut state = self.lock();
        state.cooking = false;
        state.clear_entry();
    }

    fn scoped<R>(&self, f: impl FnOnce() -> R) -> R {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, OvenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

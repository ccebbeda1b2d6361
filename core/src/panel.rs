//! Display output.

use megawave_types::Readout;

/// Receives every readout the oven shows: accepted digits, countdown ticks,
/// and the reset after a cook cycle.
///
/// Called after the state lock is released, possibly from several tasks.
pub trait DisplayPanel: Send + Sync {
    fn show(&self, readout: Readout);
}

/// Discards all output.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPanel;

impl DisplayPanel for NoopPanel {
    fn show(&self, _readout: Readout) {}
}

impl<F> DisplayPanel for F
where
    F: Fn(Readout) + Send + Sync,
{
    fn show(&self, readout: Readout) {
        self(readout);
    }
}

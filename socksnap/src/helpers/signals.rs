/// # Signals
///
/// Provides a simple way to propagate termination signals to the
/// sampling loop.
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use anyhow::Result;
use log::info;
use signal_hook::iterator::Signals;

#[derive(Clone)]
pub(crate) struct Running {
    condition: Arc<AtomicBool>,
}

impl Running {
    // Create a new Running instance, stopping upon receiving one of the
    // termination signals (e.g. SIGTERM).
    pub(crate) fn new() -> Result<Running> {
        let mut sigs = Signals::new(signal_hook::consts::TERM_SIGNALS)?;

        let run = Running {
            condition: Arc::new(AtomicBool::new(false)),
        };
        let condition = Arc::clone(&run.condition);

        thread::spawn(move || {
            sigs.wait();
            condition.store(true, Ordering::Relaxed);
            info!("Received signal, terminating...");
        });

        Ok(run)
    }

    pub(crate) fn running(&self) -> bool {
        !self.condition.load(Ordering::Relaxed)
    }
}

pub mod progress;

use tracing::debug;

use crate::sweep::{SweepObserver, SweepPoint};
use progress::{ProgressManager, templates};

pub fn print_banner() {
    println!("quadspread-rs");
}

const SWEEP_BAR: &str = "sweep";

/// Drives a progress bar from sweep callbacks
pub struct SweepProgress {
    manager: ProgressManager,
}

impl SweepProgress {
    pub fn new(total_trials: usize) -> Self {
        let manager = ProgressManager::new();
        manager
            .create_bar(SWEEP_BAR, total_trials as u64, templates::SWEEP, "")
            .unwrap_or_else(|err| debug!("Progress bar unavailable: {}", err));
        Self { manager }
    }

    pub fn finish(&self, message: &str) {
        let _ = self.manager.finish(SWEEP_BAR, message);
        self.manager.finish_all();
    }
}

impl SweepObserver for SweepProgress {
    fn on_trial_complete(&self, completed: usize, _total: usize) {
        let _ = self
            .manager
            .set_position(SWEEP_BAR, completed as u64);
    }

    fn on_point_complete(&self, point: &SweepPoint) {
        let _ = self
            .manager
            .set_message(SWEEP_BAR, &format!("{:.1} dB", point.snr_db));
        let _ = self.manager.println(&format!(
            "{:>8.2} dB  BER {:.5}",
            point.snr_db, point.average_ber
        ));
    }
}

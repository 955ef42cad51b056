//! Terminal rendering of download events.
//!
//! Downloads are sequential, so a single active progress bar is enough: a
//! percentage bar when the server declared a length, a spinner otherwise.
//! Campaign-level events print as plain lines around the bar.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

use modelvault_core::events::{DownloadEvent, DownloadState, EventListener};

/// Event listener that renders progress bars on the terminal.
pub struct DownloadProgress {
    active: Mutex<Option<(String, ProgressBar)>>,
}

impl DownloadProgress {
    /// Create a new progress renderer.
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
        }
    }

    fn percent_bar() -> ProgressBar {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );
        pb
    }

    fn spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb
    }

    fn finish_active(&self) {
        if let Some((_, bar)) = self.active.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }
}

impl Default for DownloadProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl EventListener for DownloadProgress {
    fn on_event(&self, event: &DownloadEvent) {
        match event.state {
            DownloadState::Downloading => {
                let Some(id) = event.asset_id.as_deref() else {
                    // Campaign-level: print above any bar.
                    println!("{}", event.message);
                    return;
                };

                if event.statuses.is_some() {
                    // One asset finished.
                    self.finish_active();
                    println!("  {}", event.message);
                    return;
                }

                let mut guard = self.active.lock().unwrap();
                let stale = guard.as_ref().is_none_or(|(active_id, _)| active_id != id);
                if stale {
                    if let Some((_, old)) = guard.take() {
                        old.finish_and_clear();
                    }
                    let bar = if event.percent.is_some() {
                        Self::percent_bar()
                    } else {
                        Self::spinner()
                    };
                    *guard = Some((id.to_string(), bar));
                }

                if let Some((_, bar)) = guard.as_ref() {
                    bar.set_message(event.message.clone());
                    if let Some(percent) = event.percent {
                        bar.set_position(u64::from(percent));
                    } else {
                        bar.tick();
                    }
                }
            }
            DownloadState::Completed => {
                self.finish_active();
                println!("{}", event.message);
            }
            DownloadState::Error => {
                self.finish_active();
                eprintln!("Error: {}", event.message);
            }
        }
    }
}

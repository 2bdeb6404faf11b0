//! Line-oriented signals pushed by the backend

use std::str::FromStr;

use tracing::warn;

const OPEN_TRAINING_TOOLBAR: &str = "SIGNAL_OPEN_TRAINING_TOOLBAR";
const CLOSE_TOOLBAR: &str = "SIGNAL_CLOSE_TOOLBAR";
const EPOCH_COMPLETE: &str = "SIGNAL_EPOCH_COMPLETE";

/// Progress reported when an epoch finishes
#[derive(Debug, Clone, PartialEq)]
pub struct EpochProgress {
    pub epochs_ran: u32,
    pub max_epochs: u32,
    pub train_loss: f64,
    pub val_loss: f64,
    /// Seconds spent on the epoch
    pub epoch_time: f64,
    pub train_job_id: String,
}

impl EpochProgress {
    /// Last epoch of the run has finished. A hint, not an authoritative state.
    pub fn is_final_epoch(&self) -> bool {
        self.max_epochs > 0 && self.epochs_ran >= self.max_epochs
    }
}

/// A parsed backend signal
#[derive(Debug, Clone, PartialEq)]
pub enum BackendSignal {
    OpenTrainingToolbar,
    CloseToolbar,
    EpochComplete(EpochProgress),
}

fn field<T: FromStr>(raw: Option<&str>, name: &str) -> Option<T> {
    let raw = raw?.trim();
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Invalid {} in epoch signal: {}", name, raw);
            None
        }
    }
}

impl BackendSignal {
    /// Parses one signal message; anything unrecognized yields `None`
    pub fn parse(message: &str) -> Option<Self> {
        let message = message.trim_end_matches(&['\r', '\n'][..]);
        let (head, body) = match message.split_once('\n') {
            Some((head, body)) => (head.trim(), Some(body.trim())),
            None => (message.trim(), None),
        };

        match head {
            OPEN_TRAINING_TOOLBAR => Some(BackendSignal::OpenTrainingToolbar),
            CLOSE_TOOLBAR => Some(BackendSignal::CloseToolbar),
            EPOCH_COMPLETE => {
                // The job id is last so it may itself contain '/'
                let mut parts = body?.splitn(6, '/');
                let progress = EpochProgress {
                    epochs_ran: field(parts.next(), "epochs_ran")?,
                    max_epochs: field(parts.next(), "max_epochs")?,
                    train_loss: field(parts.next(), "train_loss")?,
                    val_loss: field(parts.next(), "val_loss")?,
                    epoch_time: field(parts.next(), "epoch_time")?,
                    train_job_id: parts.next()?.trim().to_string(),
                };
                if progress.train_job_id.is_empty() {
                    return None;
                }
                Some(BackendSignal::EpochComplete(progress))
            }
            _ => None,
        }
    }
}

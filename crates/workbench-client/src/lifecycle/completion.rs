//! Best-effort completion detection
//!
//! The backend never announces that a run finished. A job counts as completed
//! once it reports `is_training == false` and either ran every requested epoch
//! or its epoch count stayed flat for `stable_polls` refreshes in a row.

use workbench_interfaces::TrainJob;

use crate::config::ClientConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionPolicy {
    /// Consecutive unchanged refreshes needed when the epoch target is unknown or unmet
    pub stable_polls: u32,
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self { stable_polls: 3 }
    }
}

impl CompletionPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            stable_polls: config.completion_stable_polls.max(1),
        }
    }
}

/// Per-job refresh history used by [`CompletionPolicy`]
#[derive(Debug, Clone, Default)]
pub(crate) struct CompletionTracker {
    last_epoch_count: Option<usize>,
    unchanged: u32,
}

impl CompletionTracker {
    /// Records one refresh and reports whether the job now looks completed
    pub(crate) fn observe(&mut self, policy: &CompletionPolicy, job: &TrainJob, epoch_count: usize) -> bool {
        if self.last_epoch_count == Some(epoch_count) {
            self.unchanged = self.unchanged.saturating_add(1);
        } else {
            self.last_epoch_count = Some(epoch_count);
            self.unchanged = 0;
        }

        if job.is_training {
            return false;
        }
        if job.num_epochs > 0 && job.epochs_ran >= job.num_epochs {
            return true;
        }
        // A run that never produced an epoch may simply not have started
        epoch_count > 0 && self.unchanged >= policy.stable_polls
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

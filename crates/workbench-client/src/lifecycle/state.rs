//! Training job states and the transitions allowed between them

use std::fmt;

use workbench_interfaces::Backtest;

/// Progress of the training run itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrainPhase {
    /// No job id exists yet
    Configuring,
    /// The backend accepted the job and returned its id
    Created,
    /// Epochs are being produced
    Training,
    /// Stopped on request
    Stopped,
    /// Ran to the end
    Completed,
}

impl TrainPhase {
    /// Stopped or completed
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrainPhase::Stopped | TrainPhase::Completed)
    }

    /// Whether the run may still produce epochs
    pub fn is_active(&self) -> bool {
        matches!(self, TrainPhase::Created | TrainPhase::Training)
    }

    /// Legal forward moves. Terminal phases have none.
    pub fn can_transition_to(&self, next: TrainPhase) -> bool {
        use TrainPhase::*;
        matches!(
            (self, next),
            (Configuring, Created)
                | (Created, Training)
                | (Created, Stopped)
                | (Created, Completed)
                | (Training, Stopped)
                | (Training, Completed)
        )
    }
}

impl fmt::Display for TrainPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrainPhase::Configuring => "configuring",
            TrainPhase::Created => "created",
            TrainPhase::Training => "training",
            TrainPhase::Stopped => "stopped",
            TrainPhase::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Backtests requested against the job, independent of the run's progress
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BacktestPhase {
    #[default]
    NotRequested,
    /// At least one backtest request is awaiting the backend
    Requested,
    /// The backend accepted the backtest; the body is kept when it parsed
    Available(Option<Backtest>),
}

/// Combined state as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Configuring,
    Created,
    Training,
    Stopped,
    Completed,
    /// Waiting on a backtest, whatever the run is doing
    BacktestRequested,
    BacktestAvailable,
}

impl JobState {
    /// Backtest progress takes precedence over the train phase
    pub fn from_phases(train: TrainPhase, backtest: &BacktestPhase) -> Self {
        match backtest {
            BacktestPhase::Available(_) => JobState::BacktestAvailable,
            BacktestPhase::Requested => JobState::BacktestRequested,
            BacktestPhase::NotRequested => match train {
                TrainPhase::Configuring => JobState::Configuring,
                TrainPhase::Created => JobState::Created,
                TrainPhase::Training => JobState::Training,
                TrainPhase::Stopped => JobState::Stopped,
                TrainPhase::Completed => JobState::Completed,
            },
        }
    }

    /// Whether stopping the job is a no-op; a backtest result counts as terminal
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Stopped | JobState::Completed | JobState::BacktestAvailable
        )
    }
}

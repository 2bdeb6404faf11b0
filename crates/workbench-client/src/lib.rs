//! Workbench client core
//!
//! Typed access to the compute backend, a keyed query cache kept coherent by
//! an invalidation bus, and the training job lifecycle built on top of both.

// Wire plumbing
pub mod endpoints;
pub mod executor;
pub mod operations;
pub mod session;

// Shared state
pub mod bus;
pub mod cache;
pub mod workbench;

// Training
pub mod lifecycle;
pub mod signals;

// Ambient
pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

// Testing utilities
pub mod test_utils;

pub use bus::{InvalidationBus, Subscription, REFETCH_ALL_DATASETS, REFETCH_COMPONENT};
pub use cache::{QueryCache, QueryKey, QueryState, Resource};
pub use config::ClientConfig;
pub use error::{WorkbenchError, WorkbenchResult};
pub use executor::{HttpExecutor, Method, RequestExecutor};
pub use lifecycle::{
    BacktestOutcome, BacktestPhase, CompletionPolicy, EpochLog, JobState, StopOutcome, TrainPhase,
    TrainingLifecycle,
};
pub use operations::WorkbenchClient;
pub use session::{InMemorySession, SessionStore};
pub use signals::{BackendSignal, EpochProgress};
pub use workbench::{MutationOutcome, Workbench};

pub use workbench_interfaces as interfaces;

/// Initialize tracing with an env filter and a plain fmt layer.
///
/// Use [`logging::init_logging`] for configured output.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .try_init();
}

/// Loads configuration, sets up logging and builds the shared services
pub fn bootstrap() -> anyhow::Result<Workbench> {
    let config = ClientConfig::load()?;
    logging::init_logging(&config)?;
    Ok(Workbench::from_config(&config)?)
}

// EBI Web Services - clients for the EMBL-EBI job dispatcher, Dbfetch and EBI Search

pub mod cli;
pub mod config;
pub mod dbfetch;
pub mod dispatcher;  // REST and SOAP transports for the job dispatcher
pub mod job;         // Submit, poll and fetch lifecycle
pub mod models;
pub mod search;
pub mod tools;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::ClientConfig;
pub use dispatcher::{Dispatcher, DispatcherConfig, JobDispatcher, Transport};
pub use models::{JobId, JobStatus, ParameterSet, ResultType};
pub use types::{AppError, AppResult};

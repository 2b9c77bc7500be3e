// Utility functions

pub mod http;
pub mod logger;

pub use http::{build_client, check_response, user_agent};
pub use logger::init_logger;

//! Job Dispatcher transports
//!
//! The EBI job dispatcher exposes the same six operations over two wire
//! protocols:
//! - REST (`{base}/run/`, `{base}/status/{jobId}`, ...) - the default
//! - SOAP (document/literal envelopes against `{endpoint}`), where result
//!   payloads come back base64-encoded
//!
//! Both are hidden behind [`JobDispatcher`]; callers pick one with [`Transport`].

pub mod provider;
pub mod rest;
pub mod soap;
pub mod xml;

pub use provider::{Dispatcher, DispatcherConfig, JobDispatcher, Transport};
pub use rest::RestAdapter;
pub use soap::SoapAdapter;

// src/remote/mod.rs

//! Everything that talks to the Airflow REST API.
//!
//! - [`transport`] moves HTTP requests (reqwest in production) and provides
//!   the `LoggingTransport` decorator for request diagnostics.
//! - [`client`] turns job names and run handles into trigger / status calls
//!   and decodes the DAG run descriptor.
//! - [`tracker`] owns the trigger → poll → terminal state loop for one run.

pub mod client;
pub mod tracker;
pub mod transport;

pub use client::{DagRun, JobClient, RemoteJobClient, RunHandle, TriggeredRun};
pub use tracker::{RunTracker, TerminalResult};
pub use transport::{BasicAuth, HttpRequest, HttpResponse, LoggingTransport, Method, ReqwestTransport, Transport};

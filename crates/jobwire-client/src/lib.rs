mod blocking;
mod client;

pub use blocking::BlockingClient;
pub use client::Client;

pub use jobwire_core::{Error, JobHandle, JobStatus, Priority, Result};
pub use jobwire_protocol::ConnectOptions;

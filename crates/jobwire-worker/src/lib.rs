mod worker;

pub use worker::Worker;

pub use jobwire_core::{Error, JobAssignment, JobHandle, Result};
pub use jobwire_protocol::ConnectOptions;

mod error;
mod job;
mod priority;

pub use error::{Error, ProtocolError, Result, ServerError, TransportError};
pub use job::{JobAssignment, JobHandle, JobStatus};
pub use priority::Priority;

/// Largest payload the 2-byte wire length field can carry.
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

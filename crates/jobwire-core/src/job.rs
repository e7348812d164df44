use bytes::Bytes;
use std::fmt;

/// Opaque server-assigned token identifying one submitted job instance.
///
/// Handed out in the JOB_CREATED response and passed back verbatim in every
/// later status or work-report packet for that job. Never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        JobHandle(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobHandle {
    fn from(handle: String) -> Self {
        JobHandle(handle)
    }
}

impl From<&str> for JobHandle {
    fn from(handle: &str) -> Self {
        JobHandle(handle.to_owned())
    }
}

impl AsRef<str> for JobHandle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A job the server handed to a worker in response to a grab request.
#[derive(Debug, Clone)]
pub struct JobAssignment {
    pub handle: JobHandle,

    /// Name of the function the worker registered for this job.
    pub function: String,

    /// Client-supplied deduplication key. Present only for assignments
    /// delivered through the unique-id grab variant.
    pub unique_id: Option<String>,

    /// Opaque argument data, passed to the function as-is.
    pub payload: Bytes,
}

/// Client-side view of a submitted job's lifecycle.
///
/// `Created` moves to `Running` as status reports arrive and ends in
/// `Completed` or `Failed`. Both terminal states tolerate late or duplicate
/// status packets by ignoring them; a straggler after completion is not a
/// protocol error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Created,
    Running { numerator: u32, denominator: u32 },
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Record a progress report. Ignored once the job is terminal.
    pub fn update_progress(&mut self, numerator: u32, denominator: u32) {
        if !self.is_terminal() {
            *self = JobStatus::Running {
                numerator,
                denominator,
            };
        }
    }

    /// Record successful completion. Ignored once the job is terminal.
    pub fn complete(&mut self) {
        if !self.is_terminal() {
            *self = JobStatus::Completed;
        }
    }

    /// Record failure. Ignored once the job is terminal.
    pub fn fail(&mut self) {
        if !self.is_terminal() {
            *self = JobStatus::Failed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_created_to_completed() {
        let mut status = JobStatus::Created;
        status.update_progress(1, 4);
        assert_eq!(
            status,
            JobStatus::Running {
                numerator: 1,
                denominator: 4
            }
        );

        status.complete();
        assert_eq!(status, JobStatus::Completed);
        assert!(status.is_terminal());
    }

    #[test]
    fn test_late_status_ignored_after_terminal() {
        let mut status = JobStatus::Completed;
        status.update_progress(3, 4);
        assert_eq!(status, JobStatus::Completed);

        let mut status = JobStatus::Failed;
        status.complete();
        assert_eq!(status, JobStatus::Failed);
    }

    #[test]
    fn test_handle_is_opaque_passthrough() {
        let handle = JobHandle::new("H:server:42");
        assert_eq!(handle.as_str(), "H:server:42");
        assert_eq!(handle.to_string(), "H:server:42");
        assert_eq!(JobHandle::from("H:server:42"), handle);
    }
}

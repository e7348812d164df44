use bytes::{BufMut, Bytes, BytesMut};
use jobwire_core::{Error, JobAssignment, JobHandle, ProtocolError, Result};
use jobwire_protocol::{join_fields, ConnectOptions, Connection, Packet, Request, Response};
use std::time::Duration;
use tokio::net::ToSocketAddrs;
use tracing::debug;

/// Worker endpoint: registers abilities with a job server, fetches jobs and
/// reports their progress and results.
///
/// Owns one persistent connection for its whole lifetime. Most operations
/// are fire-and-forget: they send a request and never wait for an
/// acknowledgment, so the only failures they can produce are transport-level
/// send failures.
pub struct Worker {
    conn: Connection,
}

impl Worker {
    /// Connect with default timeouts.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        Self::connect_with(addr, ConnectOptions::default()).await
    }

    /// Connect with an explicit timeout policy.
    pub async fn connect_with(addr: impl ToSocketAddrs, options: ConnectOptions) -> Result<Self> {
        Ok(Worker {
            conn: Connection::connect(addr, options).await?,
        })
    }

    /// The underlying connection, for callers that need raw packet access.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Tell the server this worker can perform `function`. The server adds
    /// the worker to the wake-up list for that function.
    pub async fn can_do(&self, function: &str) -> Result<()> {
        self.conn
            .send(Packet::request(
                Request::CanDo,
                Bytes::copy_from_slice(function.as_bytes()),
            ))
            .await
    }

    /// Like [`Worker::can_do`], with a cap on how long a job may run before
    /// the server marks it failed. Encoded as `function NUL seconds(u32 BE)`.
    pub async fn can_do_timeout(&self, function: &str, timeout: Duration) -> Result<()> {
        let mut buf = BytesMut::with_capacity(function.len() + 5);
        buf.put_slice(function.as_bytes());
        buf.put_u8(0);
        buf.put_u32(timeout.as_secs() as u32);

        self.conn
            .send(Packet::request(Request::CanDoTimeout, buf.freeze()))
            .await
    }

    /// Withdraw one previously registered ability.
    pub async fn cant_do(&self, function: &str) -> Result<()> {
        self.conn
            .send(Packet::request(
                Request::CantDo,
                Bytes::copy_from_slice(function.as_bytes()),
            ))
            .await
    }

    /// Withdraw every registered ability.
    pub async fn reset_abilities(&self) -> Result<()> {
        self.conn
            .send(Packet::request(Request::ResetAbilities, Bytes::new()))
            .await
    }

    /// Announce that this worker is going idle and wants a NOOP push when
    /// work arrives for one of its functions. Pair with
    /// [`Worker::wait_for_wakeup`].
    pub async fn pre_sleep(&self) -> Result<()> {
        self.conn
            .send(Packet::request(Request::PreSleep, Bytes::new()))
            .await
    }

    /// Block until the server pushes a wake-up.
    ///
    /// The NOOP may arrive at any point while the worker is idle, not just
    /// right after the pre-sleep announcement, and its payload (normally
    /// empty) is ignored. Any other packet here means the stream has
    /// desynchronized.
    pub async fn wait_for_wakeup(&self) -> Result<()> {
        let packet = self.conn.receive().await?;
        match packet.response_code() {
            Some(Response::Noop) => {
                debug!("woken up by job server");
                Ok(())
            }
            _ => Err(Error::Protocol(ProtocolError::UnexpectedResponse {
                expected: "NOOP",
                code: packet.code,
            })),
        }
    }

    /// Ask for a queued job. `None` means nothing is available; sleep and
    /// wait for a wake-up instead of spinning.
    pub async fn grab_job(&self) -> Result<Option<JobAssignment>> {
        let reply = self
            .conn
            .round_trip(Packet::request(Request::GrabJob, Bytes::new()))
            .await?;
        parse_assignment(&reply, false)
    }

    /// Like [`Worker::grab_job`], but the assignment also carries the
    /// client's unique id.
    pub async fn grab_job_uniq(&self) -> Result<Option<JobAssignment>> {
        let reply = self
            .conn
            .round_trip(Packet::request(Request::GrabJobUniq, Bytes::new()))
            .await?;
        parse_assignment(&reply, true)
    }

    /// Stream partial output for a running job. Also usable to break a
    /// large result into chunks instead of buffering it for the final
    /// completion packet.
    pub async fn work_data(&self, handle: &JobHandle, data: &[u8]) -> Result<()> {
        self.conn
            .send(Packet::request(
                Request::WorkData,
                join_fields(&[handle.as_str().as_bytes(), data]),
            ))
            .await
    }

    /// Like [`Worker::work_data`], but the receiver should treat the bytes
    /// as a warning rather than normal output.
    pub async fn work_warning(&self, handle: &JobHandle, data: &[u8]) -> Result<()> {
        self.conn
            .send(Packet::request(
                Request::WorkWarning,
                join_fields(&[handle.as_str().as_bytes(), data]),
            ))
            .await
    }

    /// Report completion progress as a numerator/denominator pair, encoded
    /// as decimal text. Send periodically for long jobs so background
    /// submitters can poll it.
    pub async fn work_status(
        &self,
        handle: &JobHandle,
        numerator: u32,
        denominator: u32,
    ) -> Result<()> {
        let numerator = numerator.to_string();
        let denominator = denominator.to_string();

        self.conn
            .send(Packet::request(
                Request::WorkStatus,
                join_fields(&[
                    handle.as_str().as_bytes(),
                    numerator.as_bytes(),
                    denominator.as_bytes(),
                ]),
            ))
            .await
    }

    /// Report that the job finished successfully, with its result data.
    pub async fn work_complete(&self, handle: &JobHandle, data: &[u8]) -> Result<()> {
        self.conn
            .send(Packet::request(
                Request::WorkComplete,
                join_fields(&[handle.as_str().as_bytes(), data]),
            ))
            .await
    }

    /// Report that the job failed. No payload beyond the handle.
    pub async fn work_fail(&self, handle: &JobHandle) -> Result<()> {
        self.conn
            .send(Packet::request(
                Request::WorkFail,
                Bytes::copy_from_slice(handle.as_str().as_bytes()),
            ))
            .await
    }

    /// Report that the job failed with an exception payload. Forwarded to
    /// clients that opted in via the "exceptions" connection option.
    pub async fn work_exception(&self, handle: &JobHandle, data: &[u8]) -> Result<()> {
        self.conn
            .send(Packet::request(
                Request::WorkException,
                join_fields(&[handle.as_str().as_bytes(), data]),
            ))
            .await
    }

    /// Set this connection's worker id so monitoring commands can tell
    /// workers (and multiple connections from one worker) apart.
    pub async fn set_worker_id(&self, id: &str) -> Result<()> {
        self.conn
            .send(Packet::request(
                Request::SetClientId,
                Bytes::copy_from_slice(id.as_bytes()),
            ))
            .await
    }

    /// Declare the server as this worker's only server, allowing direct
    /// assignment without wake-ups. Declared by the protocol but not
    /// implemented by the job server; fails fast so the boundary is
    /// explicit.
    pub async fn all_yours(&self) -> Result<()> {
        Err(Error::NotImplemented("ALL_YOURS"))
    }

    /// Round-trip opaque bytes through the server. Testing and debugging
    /// aid; fails unless the reply is byte-identical.
    pub async fn echo(&self, data: &[u8]) -> Result<()> {
        self.conn.echo(data).await
    }
}

/// Decode a grab-job reply: `None` on no-job, an assignment on job-assign
/// (3 NUL-split fields) or job-assign-uniq (4 fields). The trailing data
/// field stays opaque, embedded NULs included.
fn parse_assignment(reply: &Packet, with_unique: bool) -> Result<Option<JobAssignment>> {
    match reply.response_code() {
        Some(Response::NoJob) => Ok(None),
        Some(Response::JobAssign) if !with_unique => {
            let fields = reply.split_fields(3)?;
            Ok(Some(JobAssignment {
                handle: JobHandle::new(text(fields[0])?),
                function: text(fields[1])?.to_owned(),
                unique_id: None,
                payload: Bytes::copy_from_slice(fields[2]),
            }))
        }
        Some(Response::JobAssignUniq) if with_unique => {
            let fields = reply.split_fields(4)?;
            Ok(Some(JobAssignment {
                handle: JobHandle::new(text(fields[0])?),
                function: text(fields[1])?.to_owned(),
                unique_id: Some(text(fields[2])?.to_owned()),
                payload: Bytes::copy_from_slice(fields[3]),
            }))
        }
        _ => Err(Error::Protocol(ProtocolError::UnexpectedResponse {
            expected: if with_unique {
                "JOB_ASSIGN_UNIQ or NO_JOB"
            } else {
                "JOB_ASSIGN or NO_JOB"
            },
            code: reply.code,
        })),
    }
}

fn text(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| ProtocolError::from(e).into())
}

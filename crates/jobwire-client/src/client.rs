use bytes::Bytes;
use chrono::{DateTime, Datelike, TimeZone, Timelike};
use jobwire_core::{Error, JobHandle, Priority, ProtocolError, Result, ServerError};
use jobwire_protocol::{join_fields, ConnectOptions, Connection, Packet, Request, Response};
use tokio::net::ToSocketAddrs;
use tracing::debug;

/// Client endpoint for submitting jobs to a job server.
///
/// Owns one persistent connection for its whole lifetime; reconnection
/// policy is the caller's. Safe to share across tasks — operations
/// serialize on the connection.
pub struct Client {
    conn: Connection,
}

impl Client {
    /// Connect with default timeouts.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        Self::connect_with(addr, ConnectOptions::default()).await
    }

    /// Connect with an explicit timeout policy.
    pub async fn connect_with(addr: impl ToSocketAddrs, options: ConnectOptions) -> Result<Self> {
        Ok(Client {
            conn: Connection::connect(addr, options).await?,
        })
    }

    /// The underlying connection, for callers that need to read packets this
    /// layer does not pair with a request (e.g. the STATUS_RES following
    /// [`Client::get_status`], or streamed work updates).
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Submit a foreground job and block until the server assigns a handle.
    ///
    /// Payload layout: `function NUL unique-id NUL data`. The priority tier
    /// picks the submission command code. The server deduplicates in-flight
    /// jobs by `unique_id`; the empty string is a valid id.
    pub async fn submit_job(
        &self,
        function: &str,
        unique_id: &str,
        data: &[u8],
        priority: Priority,
    ) -> Result<JobHandle> {
        let code = match priority {
            Priority::Low => Request::SubmitJobLow,
            Priority::Normal => Request::SubmitJob,
            Priority::High => Request::SubmitJobHigh,
        };

        let payload = join_fields(&[function.as_bytes(), unique_id.as_bytes(), data]);
        let reply = self.conn.round_trip(Packet::request(code, payload)).await?;

        match reply.response_code() {
            Some(Response::JobCreated) => {
                let handle = std::str::from_utf8(&reply.payload).map_err(ProtocolError::from)?;
                debug!(%handle, function, %priority, "job created");
                Ok(JobHandle::new(handle))
            }
            Some(Response::Error) => Err(ServerError::from_payload(&reply.payload).into()),
            _ => Err(unexpected("JOB_CREATED", &reply)),
        }
    }

    /// Submit a detached job. The server queues it and reports nothing back
    /// on this connection; poll [`Client::get_status`] if the outcome
    /// matters.
    pub async fn submit_background_job(
        &self,
        function: &str,
        unique_id: &str,
        data: &[u8],
        priority: Priority,
    ) -> Result<()> {
        let code = match priority {
            Priority::Low => Request::SubmitJobLowBg,
            Priority::Normal => Request::SubmitJobBg,
            Priority::High => Request::SubmitJobHighBg,
        };

        let payload = join_fields(&[function.as_bytes(), unique_id.as_bytes(), data]);
        self.conn.send(Packet::request(code, payload)).await
    }

    /// Submit a detached job to run at the given calendar time.
    ///
    /// Time fields go on the wire as decimal text without leading zeros.
    /// The weekday field is Monday-based (0=Monday .. 6=Sunday), remapped
    /// here from chrono's representation.
    pub async fn submit_scheduled_job<Tz: TimeZone>(
        &self,
        function: &str,
        unique_id: &str,
        when: DateTime<Tz>,
        data: &[u8],
    ) -> Result<()> {
        let payload = schedule_payload(function, unique_id, &when, data);
        self.conn
            .send(Packet::request(Request::SubmitJobSched, payload))
            .await
    }

    /// Submit a detached job to run at an epoch timestamp. Declared by the
    /// protocol but not implemented by the job server; fails fast so the
    /// boundary is explicit.
    pub async fn submit_epoch_job<Tz: TimeZone>(
        &self,
        _function: &str,
        _unique_id: &str,
        _when: DateTime<Tz>,
        _data: &[u8],
    ) -> Result<()> {
        Err(Error::NotImplemented("SUBMIT_JOB_EPOCH"))
    }

    /// Ask the server for the status of a submitted job. Only issues the
    /// request; read the STATUS_RES via [`Client::connection`] if needed.
    pub async fn get_status(&self, handle: &JobHandle) -> Result<()> {
        self.conn
            .send(Packet::request(
                Request::GetStatus,
                Bytes::copy_from_slice(handle.as_str().as_bytes()),
            ))
            .await
    }

    /// Toggle a per-connection server behavior, e.g. `"exceptions"` to have
    /// WORK_EXCEPTION packets forwarded to this client. Blocks for the
    /// server's verdict; a rejection surfaces as [`Error::Server`].
    pub async fn set_option(&self, option: &str) -> Result<()> {
        let reply = self
            .conn
            .round_trip(Packet::request(
                Request::OptionReq,
                Bytes::copy_from_slice(option.as_bytes()),
            ))
            .await?;

        match reply.response_code() {
            Some(Response::OptionRes) => Ok(()),
            Some(Response::Error) => Err(ServerError::from_payload(&reply.payload).into()),
            _ => Err(unexpected("OPTION_RES", &reply)),
        }
    }

    /// Round-trip opaque bytes through the server. Testing and debugging
    /// aid; fails unless the reply is byte-identical.
    pub async fn echo(&self, data: &[u8]) -> Result<()> {
        self.conn.echo(data).await
    }
}

fn unexpected(expected: &'static str, reply: &Packet) -> Error {
    Error::Protocol(ProtocolError::UnexpectedResponse {
        expected,
        code: reply.code,
    })
}

fn schedule_payload<Tz: TimeZone>(
    function: &str,
    unique_id: &str,
    when: &DateTime<Tz>,
    data: &[u8],
) -> Bytes {
    let minute = when.minute().to_string();
    let hour = when.hour().to_string();
    let day = when.day().to_string();
    let month = when.month().to_string();
    // 0=Monday .. 6=Sunday on the wire
    let weekday = when.weekday().num_days_from_monday().to_string();

    join_fields(&[
        function.as_bytes(),
        unique_id.as_bytes(),
        minute.as_bytes(),
        hour.as_bytes(),
        day.as_bytes(),
        month.as_bytes(),
        weekday.as_bytes(),
        data,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fields_of(payload: &[u8]) -> Vec<Vec<u8>> {
        payload.splitn(8, |&b| b == 0).map(|f| f.to_vec()).collect()
    }

    #[test]
    fn test_schedule_payload_layout() {
        // 2026-08-31 is a Monday
        let when = Utc.with_ymd_and_hms(2026, 8, 31, 14, 7, 0).unwrap();
        let payload = schedule_payload("resize", "uniq-1", &when, b"img");

        let expected: &[&[u8]] = &[b"resize", b"uniq-1", b"7", b"14", b"31", b"8", b"0", b"img"];
        assert_eq!(fields_of(&payload), expected);
    }

    #[test]
    fn test_schedule_weekday_is_monday_based() {
        // chrono counts Sunday-first in places; the wire wants 0=Monday, so
        // Sunday must encode as 6 and Monday as 0.
        let sunday = Utc.with_ymd_and_hms(2026, 8, 30, 0, 0, 0).unwrap();
        let fields = fields_of(&schedule_payload("f", "u", &sunday, b""));
        assert_eq!(fields[6], b"6");

        let monday = Utc.with_ymd_and_hms(2026, 8, 31, 0, 0, 0).unwrap();
        let fields = fields_of(&schedule_payload("f", "u", &monday, b""));
        assert_eq!(fields[6], b"0");
    }

    #[test]
    fn test_schedule_fields_have_no_leading_zeros() {
        let when = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 0).unwrap();
        let fields = fields_of(&schedule_payload("f", "u", &when, b""));
        assert_eq!(fields[2], b"4"); // minute
        assert_eq!(fields[3], b"3"); // hour
        assert_eq!(fields[4], b"2"); // day
        assert_eq!(fields[5], b"1"); // month
    }
}

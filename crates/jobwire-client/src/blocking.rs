use crate::client::Client;
use chrono::{DateTime, TimeZone};
use jobwire_core::{JobHandle, Priority, Result};
use jobwire_protocol::ConnectOptions;

/// Blocking facade over [`Client`] for callers without a tokio runtime.
///
/// Owns a single-threaded runtime and the same persistent connection as the
/// async client; every method is a `block_on` of its async counterpart.
pub struct BlockingClient {
    runtime: tokio::runtime::Runtime,
    inner: Client,
}

impl BlockingClient {
    /// Connect with default timeouts.
    pub fn connect(addr: &str) -> Result<Self> {
        Self::connect_with(addr, ConnectOptions::default())
    }

    /// Connect with an explicit timeout policy.
    pub fn connect_with(addr: &str, options: ConnectOptions) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let inner = runtime.block_on(Client::connect_with(addr, options))?;

        Ok(BlockingClient { runtime, inner })
    }

    /// Submit a foreground job and wait for its handle.
    pub fn submit_job(
        &self,
        function: &str,
        unique_id: &str,
        data: &[u8],
        priority: Priority,
    ) -> Result<JobHandle> {
        self.runtime
            .block_on(self.inner.submit_job(function, unique_id, data, priority))
    }

    /// Submit a detached job.
    pub fn submit_background_job(
        &self,
        function: &str,
        unique_id: &str,
        data: &[u8],
        priority: Priority,
    ) -> Result<()> {
        self.runtime.block_on(
            self.inner
                .submit_background_job(function, unique_id, data, priority),
        )
    }

    /// Submit a detached job to run at the given calendar time.
    pub fn submit_scheduled_job<Tz: TimeZone>(
        &self,
        function: &str,
        unique_id: &str,
        when: DateTime<Tz>,
        data: &[u8],
    ) -> Result<()> {
        self.runtime
            .block_on(self.inner.submit_scheduled_job(function, unique_id, when, data))
    }

    /// Request status for a submitted job (send-only, like the async API).
    pub fn get_status(&self, handle: &JobHandle) -> Result<()> {
        self.runtime.block_on(self.inner.get_status(handle))
    }

    /// Negotiate a per-connection option.
    pub fn set_option(&self, option: &str) -> Result<()> {
        self.runtime.block_on(self.inner.set_option(option))
    }

    /// Round-trip opaque bytes through the server.
    pub fn echo(&self, data: &[u8]) -> Result<()> {
        self.runtime.block_on(self.inner.echo(data))
    }
}

use crate::codec::PacketCodec;
use crate::command::{Request, Response};
use crate::packet::Packet;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use jobwire_core::{Error, ProtocolError, Result, TransportError};
use std::time::Duration;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, trace};

/// Per-connection timeout policy.
///
/// Every connection carries its own copy, so independent connections can run
/// under independent policies.
#[derive(Debug, Clone, Copy)]
pub struct ConnectOptions {
    /// Bound on TCP connection establishment.
    pub dial_timeout: Duration,

    /// Bound on each read or write half of an exchange. A stalled peer
    /// surfaces as `TransportError::Timeout` instead of blocking forever.
    pub io_timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        ConnectOptions {
            dial_timeout: Duration::from_secs(5),
            io_timeout: Duration::from_secs(30),
        }
    }
}

/// One TCP connection to a job server.
///
/// The wire protocol has no request identifier, so pairing a response with
/// its request relies entirely on exclusive use of the stream: every
/// operation holds the connection mutex for its full duration, and
/// [`Connection::round_trip`] keeps it across both the write and the
/// following read. Do not attempt two outstanding paired requests without an
/// intervening receive; the protocol cannot tell their responses apart.
///
/// After a timeout or short read the stream position is unknown and the
/// connection must be treated as poisoned; establish a new one.
pub struct Connection {
    framed: Mutex<Framed<TcpStream, PacketCodec>>,
    io_timeout: Duration,
}

impl Connection {
    /// Dial a job server, bounded by the configured dial timeout.
    pub async fn connect(addr: impl ToSocketAddrs, options: ConnectOptions) -> Result<Self> {
        let stream = timeout(options.dial_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(TransportError::Dial)?;

        debug!(peer = ?stream.peer_addr().ok(), "connected to job server");

        Ok(Connection {
            framed: Mutex::new(Framed::new(stream, PacketCodec)),
            io_timeout: options.io_timeout,
        })
    }

    /// Write one packet. Fire-and-forget operations stop here; no response
    /// is awaited or validated.
    pub async fn send(&self, packet: Packet) -> Result<()> {
        let mut framed = self.framed.lock().await;
        self.write(&mut framed, packet).await
    }

    /// Read one packet independently of any send. This is how unsolicited
    /// server pushes arrive, e.g. the wake-up no-op while a worker sits in
    /// pre-sleep.
    pub async fn receive(&self) -> Result<Packet> {
        let mut framed = self.framed.lock().await;
        self.read(&mut framed).await
    }

    /// Write one packet and read the single response paired with it.
    ///
    /// The lock spans both halves, so a concurrent caller can never be
    /// handed this exchange's response.
    pub async fn round_trip(&self, packet: Packet) -> Result<Packet> {
        let mut framed = self.framed.lock().await;
        self.write(&mut framed, packet).await?;
        self.read(&mut framed).await
    }

    /// Round-trip opaque bytes through the server's echo facility. The
    /// reply must carry the echo-response code and a byte-identical payload;
    /// anything else is a protocol error. Both roles share this contract.
    pub async fn echo(&self, data: &[u8]) -> Result<()> {
        let reply = self
            .round_trip(Packet::request(
                Request::EchoReq,
                Bytes::copy_from_slice(data),
            ))
            .await?;

        match reply.response_code() {
            Some(Response::EchoRes) if &reply.payload[..] == data => Ok(()),
            Some(Response::EchoRes) => Err(ProtocolError::EchoMismatch.into()),
            _ => Err(Error::Protocol(ProtocolError::UnexpectedResponse {
                expected: "ECHO_RES",
                code: reply.code,
            })),
        }
    }

    async fn write(
        &self,
        framed: &mut Framed<TcpStream, PacketCodec>,
        packet: Packet,
    ) -> Result<()> {
        trace!(code = packet.code, len = packet.payload.len(), "send packet");
        timeout(self.io_timeout, framed.send(packet))
            .await
            .map_err(|_| Error::Transport(TransportError::Timeout))?
    }

    async fn read(&self, framed: &mut Framed<TcpStream, PacketCodec>) -> Result<Packet> {
        let packet = timeout(self.io_timeout, framed.next())
            .await
            .map_err(|_| TransportError::Timeout)?
            .ok_or(TransportError::Closed)??;
        trace!(code = packet.code, len = packet.payload.len(), "recv packet");
        Ok(packet)
    }
}

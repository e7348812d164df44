mod codec;
mod command;
mod conn;
mod packet;

pub use codec::{PacketCodec, FRAME_OVERHEAD, HEADER_SIZE};
pub use command::{Magic, Request, Response};
pub use conn::{ConnectOptions, Connection};
pub use packet::{join_fields, Packet};

pub use jobwire_core::MAX_PAYLOAD_SIZE;

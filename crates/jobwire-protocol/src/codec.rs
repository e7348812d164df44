use crate::command::Magic;
use crate::packet::Packet;
use bytes::{Buf, BufMut, BytesMut};
use jobwire_core::{Error, ProtocolError, MAX_PAYLOAD_SIZE};
use tokio_util::codec::{Decoder, Encoder};

/// Packet header: 4-byte ASCII magic plus 4-byte big-endian command code.
pub const HEADER_SIZE: usize = 8;

/// Header plus the 2-byte big-endian payload length.
pub const FRAME_OVERHEAD: usize = HEADER_SIZE + 2;

/// Codec for the fixed-header, length-prefixed packet framing.
///
/// Frame format: `[4-byte magic] [4-byte code (BE)] [2-byte length (BE)]
/// [payload]`. All integers big-endian, no padding anywhere.
pub struct PacketCodec;

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, Error> {
        if src.len() < FRAME_OVERHEAD {
            return Ok(None);
        }

        let mut magic_bytes = [0u8; 4];
        magic_bytes.copy_from_slice(&src[0..4]);
        let magic = Magic::from_bytes(magic_bytes).ok_or(ProtocolError::BadMagic(magic_bytes))?;

        let code = u32::from_be_bytes([src[4], src[5], src[6], src[7]]);
        let length = u16::from_be_bytes([src[8], src[9]]) as usize;

        // Wait for the complete payload
        if src.len() < FRAME_OVERHEAD + length {
            src.reserve(FRAME_OVERHEAD + length - src.len());
            return Ok(None);
        }

        src.advance(FRAME_OVERHEAD);
        let payload = src.split_to(length).freeze();

        Ok(Some(Packet {
            magic,
            code,
            payload,
        }))
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = Error;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), Error> {
        // Reject before any header byte lands in the buffer: a truncated
        // length field would silently desync the stream.
        if item.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge(item.payload.len()).into());
        }

        dst.reserve(FRAME_OVERHEAD + item.payload.len());
        dst.put_slice(&item.magic.as_bytes());
        dst.put_u32(item.code);
        dst.put_u16(item.payload.len() as u16);
        dst.put_slice(&item.payload);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Request, Response};
    use bytes::Bytes;
    use proptest::prelude::*;

    fn encode(packet: Packet) -> BytesMut {
        let mut buffer = BytesMut::new();
        PacketCodec.encode(packet, &mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_codec_roundtrip() {
        let packet = Packet::request(Request::SubmitJob, Bytes::from_static(b"fn\0uid\0data"));
        let mut buffer = encode(packet.clone());

        let decoded = PacketCodec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(decoded, packet);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_wire_layout_is_big_endian() {
        let buffer = encode(Packet::request(Request::CanDo, Bytes::from_static(b"rev")));

        assert_eq!(&buffer[0..4], b"\0REQ");
        assert_eq!(&buffer[4..8], &[0, 0, 0, 1]);
        assert_eq!(&buffer[8..10], &[0, 3]);
        assert_eq!(&buffer[10..], b"rev");
    }

    #[test]
    fn test_partial_frame_returns_none() {
        let buffer = encode(Packet::response(
            Response::JobAssign,
            Bytes::from_static(b"H1\0f\0payload"),
        ));

        for cut in 0..buffer.len() {
            let mut partial = BytesMut::from(&buffer[..cut]);
            assert!(PacketCodec.decode(&mut partial).unwrap().is_none());
        }
    }

    #[test]
    fn test_max_length_payload_roundtrips() {
        let payload = Bytes::from(vec![0xAB; MAX_PAYLOAD_SIZE]);
        let packet = Packet::request(Request::EchoReq, payload);
        let mut buffer = encode(packet.clone());

        let decoded = PacketCodec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(decoded.payload.len(), MAX_PAYLOAD_SIZE);
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_oversized_payload_rejected_before_writing() {
        let payload = Bytes::from(vec![0u8; MAX_PAYLOAD_SIZE + 1]);
        let mut buffer = BytesMut::new();
        let err = PacketCodec
            .encode(Packet::request(Request::EchoReq, payload), &mut buffer)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::PayloadTooLarge(n)) if n == MAX_PAYLOAD_SIZE + 1
        ));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut buffer = BytesMut::from(&b"\0BAD\x00\x00\x00\x01\x00\x00"[..]);
        let err = PacketCodec.decode(&mut buffer).unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::BadMagic(_))));
    }

    #[test]
    fn test_two_frames_in_one_buffer() {
        let mut buffer = encode(Packet::request(Request::PreSleep, Bytes::new()));
        buffer.extend_from_slice(&encode(Packet::response(
            Response::Noop,
            Bytes::from_static(b""),
        )));

        let first = PacketCodec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(first.code, Request::PreSleep.as_u32());
        let second = PacketCodec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(second.response_code(), Some(Response::Noop));
        assert!(PacketCodec.decode(&mut buffer).unwrap().is_none());
    }

    proptest! {
        #[test]
        fn prop_roundtrip_preserves_magic_code_payload(
            code in proptest::num::u32::ANY,
            payload in proptest::collection::vec(any::<u8>(), 0..2048),
            response in proptest::bool::ANY,
        ) {
            let magic = if response { Magic::Response } else { Magic::Request };
            let packet = Packet { magic, code, payload: Bytes::from(payload) };

            let mut buffer = BytesMut::new();
            PacketCodec.encode(packet.clone(), &mut buffer).unwrap();
            let decoded = PacketCodec.decode(&mut buffer).unwrap().unwrap();

            prop_assert_eq!(decoded, packet);
            prop_assert!(buffer.is_empty());
        }
    }
}

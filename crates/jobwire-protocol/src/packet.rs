use crate::command::{Magic, Request, Response};
use bytes::{BufMut, Bytes, BytesMut};
use jobwire_core::ProtocolError;

/// One framed protocol packet: direction magic, command code, raw payload.
///
/// Packets have no persistent identity; they are built, written to the wire
/// and dropped. The code is kept as a raw `u32` so unknown responses can be
/// surfaced in errors instead of being lost at decode time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub magic: Magic,
    pub code: u32,
    pub payload: Bytes,
}

impl Packet {
    pub fn request(code: Request, payload: impl Into<Bytes>) -> Self {
        Packet {
            magic: Magic::Request,
            code: code.as_u32(),
            payload: payload.into(),
        }
    }

    pub fn response(code: Response, payload: impl Into<Bytes>) -> Self {
        Packet {
            magic: Magic::Response,
            code: code.as_u32(),
            payload: payload.into(),
        }
    }

    /// The response code this packet carries, if it is a known response.
    pub fn response_code(&self) -> Option<Response> {
        match self.magic {
            Magic::Response => Response::from_u32(self.code),
            Magic::Request => None,
        }
    }

    /// Split the payload into exactly `count` NUL-delimited fields.
    ///
    /// The final field is everything after the last consumed separator; it
    /// is opaque and keeps any embedded NUL bytes. Fewer fields than asked
    /// for is a protocol error.
    pub fn split_fields(&self, count: usize) -> Result<Vec<&[u8]>, ProtocolError> {
        let fields: Vec<&[u8]> = self.payload.splitn(count, |&b| b == 0).collect();
        if fields.len() != count {
            return Err(ProtocolError::FieldCount {
                expected: count,
                found: fields.len(),
            });
        }
        Ok(fields)
    }
}

/// Join fields with single NUL separators. The final field is appended raw,
/// never terminated.
pub fn join_fields(fields: &[&[u8]]) -> Bytes {
    let len = fields.iter().map(|f| f.len()).sum::<usize>() + fields.len().saturating_sub(1);
    let mut buf = BytesMut::with_capacity(len);
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            buf.put_u8(0);
        }
        buf.put_slice(field);
    }
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_preserves_embedded_nuls_in_final_field() {
        let packet = Packet::response(
            Response::JobAssign,
            Bytes::from_static(b"H123\0myFunc\0\x00\x01binarydata"),
        );

        let fields = packet.split_fields(3).unwrap();
        assert_eq!(fields[0], b"H123");
        assert_eq!(fields[1], b"myFunc");
        assert_eq!(fields[2], b"\x00\x01binarydata");
    }

    #[test]
    fn test_split_rejects_short_field_count() {
        let packet = Packet::response(
            Response::JobAssignUniq,
            Bytes::from_static(b"H123\0myFunc\0data"),
        );

        let err = packet.split_fields(4).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::FieldCount {
                expected: 4,
                found: 3
            }
        ));
    }

    #[test]
    fn test_join_fields_layout() {
        let payload = join_fields(&[b"reverse", b"uniq-1", b"hello\0world"]);
        assert_eq!(&payload[..], b"reverse\0uniq-1\0hello\0world");

        assert_eq!(&join_fields(&[b"solo"])[..], b"solo");
        assert!(join_fields(&[]).is_empty());
    }

    #[test]
    fn test_response_code_lookup() {
        let packet = Packet::response(Response::NoJob, Bytes::new());
        assert_eq!(packet.response_code(), Some(Response::NoJob));

        let packet = Packet::request(Request::GrabJob, Bytes::new());
        assert_eq!(packet.response_code(), None);

        let unknown = Packet {
            magic: Magic::Response,
            code: 99,
            payload: Bytes::new(),
        };
        assert_eq!(unknown.response_code(), None);
    }
}

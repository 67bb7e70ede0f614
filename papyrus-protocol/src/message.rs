//! Message assembly and body builders.

use crate::error::ProtocolError;
use crate::header::MsgHeader;
use crate::HEADER_SIZE;
use bson::Document;
use bytes::BytesMut;

/// Operation codes of the host wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum OpCode {
    Reply = 1,
    Update = 2001,
    Insert = 2002,
    Query = 2004,
    GetMore = 2005,
    Delete = 2006,
    KillCursors = 2007,
}

impl OpCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(value: i32) -> Result<Self, ProtocolError> {
        match value {
            1 => Ok(OpCode::Reply),
            2001 => Ok(OpCode::Update),
            2002 => Ok(OpCode::Insert),
            2004 => Ok(OpCode::Query),
            2005 => Ok(OpCode::GetMore),
            2006 => Ok(OpCode::Delete),
            2007 => Ok(OpCode::KillCursors),
            other => Err(ProtocolError::UnknownOpCode(other)),
        }
    }
}

/// Assembles framed messages.
pub struct Message;

impl Message {
    /// Frames a body under a standard header.
    ///
    /// `message_length` is computed as `16 + body.len()`; `response_to` is
    /// always zero on requests.
    pub fn frame(op: OpCode, request_id: i32, body: &[u8]) -> BytesMut {
        let header = MsgHeader {
            message_length: (HEADER_SIZE + body.len()) as i32,
            request_id,
            response_to: 0,
            op_code: op.as_i32(),
        };

        let mut buf = BytesMut::with_capacity(HEADER_SIZE + body.len());
        header.encode(&mut buf);
        buf.extend_from_slice(body);
        buf
    }
}

/// Safe-mode option keys understood by `get_last_error_body`.
const SAFE_OPTION_KEYS: [&str; 3] = ["w", "wtimeout", "fsync"];

/// Builds an OP_QUERY body.
///
/// Layout: `i32 flags, cstring full_collection_name, i32 skip,
/// i32 n_return, document selector`.
pub fn query_body(
    full_collection_name: &str,
    flags: i32,
    skip: i32,
    n_return: i32,
    selector: &Document,
) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(&flags.to_le_bytes());
    put_cstring(&mut buf, full_collection_name)?;
    buf.extend_from_slice(&skip.to_le_bytes());
    buf.extend_from_slice(&n_return.to_le_bytes());
    selector.to_writer(&mut buf)?;
    Ok(buf)
}

/// Builds an OP_INSERT body.
///
/// Layout: `i32 0, cstring full_collection_name, document*`.
pub fn insert_body(
    full_collection_name: &str,
    documents: &[Document],
) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(&0i32.to_le_bytes());
    put_cstring(&mut buf, full_collection_name)?;
    for doc in documents {
        doc.to_writer(&mut buf)?;
    }
    Ok(buf)
}

/// Builds an OP_DELETE body.
///
/// Layout: `i32 0, cstring full_collection_name, i32 0, document selector`.
pub fn delete_body(
    full_collection_name: &str,
    selector: &Document,
) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(&0i32.to_le_bytes());
    put_cstring(&mut buf, full_collection_name)?;
    buf.extend_from_slice(&0i32.to_le_bytes());
    selector.to_writer(&mut buf)?;
    Ok(buf)
}

/// Builds the `getLastError` follow-up query for a safe-mode write.
///
/// The command runs against `"<db_name>.$cmd"` with `n_return = -1`.
/// Recognized safe-mode keys are `w`, `wtimeout` and `fsync`; any other
/// key is rejected.
pub fn get_last_error_body(
    db_name: &str,
    safe_opts: &Document,
) -> Result<Vec<u8>, ProtocolError> {
    let mut cmd = Document::new();
    cmd.insert("getlasterror", 1i32);
    for (key, value) in safe_opts {
        if !SAFE_OPTION_KEYS.contains(&key.as_str()) {
            return Err(ProtocolError::InvalidSafeOption(key.clone()));
        }
        cmd.insert(key.clone(), value.clone());
    }
    query_body(&format!("{}.$cmd", db_name), 0, 0, -1, &cmd)
}

fn put_cstring(buf: &mut Vec<u8>, s: &str) -> Result<(), ProtocolError> {
    if s.as_bytes().contains(&0) {
        return Err(ProtocolError::InvalidCollectionName(s.to_string()));
    }
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_frame_layout() {
        let body = [0xAA_u8, 0xBB, 0xCC];
        let framed = Message::frame(OpCode::Query, 9, &body);

        assert_eq!(framed.len(), HEADER_SIZE + 3);
        // message_length
        assert_eq!(&framed[0..4], &19i32.to_le_bytes());
        // request_id
        assert_eq!(&framed[4..8], &9i32.to_le_bytes());
        // response_to is zero on requests
        assert_eq!(&framed[8..12], &0i32.to_le_bytes());
        // opcode
        assert_eq!(&framed[12..16], &2004i32.to_le_bytes());
        assert_eq!(&framed[16..], &body);
    }

    #[test]
    fn test_opcode_values() {
        assert_eq!(OpCode::Reply.as_i32(), 1);
        assert_eq!(OpCode::Update.as_i32(), 2001);
        assert_eq!(OpCode::Insert.as_i32(), 2002);
        assert_eq!(OpCode::Query.as_i32(), 2004);
        assert_eq!(OpCode::GetMore.as_i32(), 2005);
        assert_eq!(OpCode::Delete.as_i32(), 2006);
        assert_eq!(OpCode::KillCursors.as_i32(), 2007);
    }

    #[test]
    fn test_opcode_from_i32() {
        assert_eq!(OpCode::from_i32(2002).unwrap(), OpCode::Insert);
        assert!(matches!(
            OpCode::from_i32(999),
            Err(ProtocolError::UnknownOpCode(999))
        ));
    }

    #[test]
    fn test_query_body_layout() {
        let selector = doc! { "ismaster": 1i32 };
        let body = query_body("admin.$cmd", 0, 0, -1, &selector).unwrap();

        assert_eq!(&body[0..4], &0i32.to_le_bytes());
        assert_eq!(&body[4..14], b"admin.$cmd");
        assert_eq!(body[14], 0);
        assert_eq!(&body[15..19], &0i32.to_le_bytes());
        assert_eq!(&body[19..23], &(-1i32).to_le_bytes());

        let doc = Document::from_reader(&mut &body[23..]).unwrap();
        assert_eq!(doc, selector);
    }

    #[test]
    fn test_insert_body_multiple_documents() {
        let docs = [doc! { "a": 1i32 }, doc! { "b": 2i32 }];
        let body = insert_body("db.things", &docs).unwrap();

        assert_eq!(&body[0..4], &0i32.to_le_bytes());
        let mut rest = &body[4 + "db.things".len() + 1..];
        let first = Document::from_reader(&mut rest).unwrap();
        let second = Document::from_reader(&mut rest).unwrap();
        assert_eq!(first, docs[0]);
        assert_eq!(second, docs[1]);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_delete_body_layout() {
        let selector = doc! { "n": 3i32 };
        let body = delete_body("db.chunks", &selector).unwrap();

        assert_eq!(&body[0..4], &0i32.to_le_bytes());
        let name_end = 4 + "db.chunks".len();
        assert_eq!(&body[4..name_end], b"db.chunks");
        assert_eq!(body[name_end], 0);
        assert_eq!(&body[name_end + 1..name_end + 5], &0i32.to_le_bytes());

        let doc = Document::from_reader(&mut &body[name_end + 5..]).unwrap();
        assert_eq!(doc, selector);
    }

    #[test]
    fn test_get_last_error_recognized_options() {
        let body =
            get_last_error_body("app", &doc! { "w": 2i32, "wtimeout": 500i32, "fsync": true })
                .unwrap();

        // Skip flags, "app.$cmd\0", skip, n_return.
        let offset = 4 + "app.$cmd".len() + 1 + 4 + 4;
        let cmd = Document::from_reader(&mut &body[offset..]).unwrap();
        assert_eq!(cmd.get_i32("getlasterror").unwrap(), 1);
        assert_eq!(cmd.get_i32("w").unwrap(), 2);
        assert_eq!(cmd.get_i32("wtimeout").unwrap(), 500);
        assert!(cmd.get_bool("fsync").unwrap());
    }

    #[test]
    fn test_get_last_error_rejects_unknown_option() {
        let result = get_last_error_body("app", &doc! { "journal": true });
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidSafeOption(key)) if key == "journal"
        ));
    }

    #[test]
    fn test_cstring_rejects_nul() {
        let result = query_body("bad\0name", 0, 0, 0, &doc! {});
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidCollectionName(_))
        ));
    }
}

//! Reply frame parsing.

use crate::error::ProtocolError;
use crate::header::{MsgHeader, ReplyHeader, REPLY_HEADER_SIZE};
use bson::Document;

/// Smallest legal BSON document length (4-byte length + terminating NUL).
const MIN_DOCUMENT_LENGTH: i32 = 5;

/// A fully parsed OP_REPLY frame.
#[derive(Debug, Clone)]
pub struct Reply {
    /// Id of the request this reply answers.
    pub response_to: i32,
    /// Response flags.
    pub flags: i32,
    /// Server-assigned cursor id; zero when exhausted.
    pub cursor_id: i64,
    /// Offset of the first document within the cursor.
    pub starting_from: i32,
    /// Number of documents the server reported.
    pub number_returned: i32,
    /// The decoded documents.
    pub documents: Vec<Document>,
}

impl Reply {
    /// Parses the post-header portion of an OP_REPLY frame.
    ///
    /// `body` is everything after the 16-byte standard header: the 20-byte
    /// reply header followed by `number_returned` length-prefixed BSON
    /// documents. A buffer shorter than its own length prefixes claim is a
    /// `TruncatedReply`.
    pub fn parse(header: &MsgHeader, body: &[u8]) -> Result<Self, ProtocolError> {
        if body.len() < REPLY_HEADER_SIZE {
            return Err(ProtocolError::TruncatedReply {
                needed: REPLY_HEADER_SIZE,
                have: body.len(),
            });
        }

        let reply_bytes: [u8; REPLY_HEADER_SIZE] = body[..REPLY_HEADER_SIZE].try_into().unwrap();
        let reply_header = ReplyHeader::parse(&reply_bytes);

        let mut documents = Vec::with_capacity(reply_header.number_returned.max(0) as usize);
        let mut offset = REPLY_HEADER_SIZE;

        for _ in 0..reply_header.number_returned {
            if body.len() < offset + 4 {
                return Err(ProtocolError::TruncatedReply {
                    needed: offset + 4,
                    have: body.len(),
                });
            }

            let length = i32::from_le_bytes([
                body[offset],
                body[offset + 1],
                body[offset + 2],
                body[offset + 3],
            ]);
            if length < MIN_DOCUMENT_LENGTH {
                return Err(ProtocolError::InvalidDocumentLength { length, offset });
            }

            let end = offset + length as usize;
            if body.len() < end {
                return Err(ProtocolError::TruncatedReply {
                    needed: end,
                    have: body.len(),
                });
            }

            let document = Document::from_reader(&mut &body[offset..end])?;
            documents.push(document);
            offset = end;
        }

        Ok(Self {
            response_to: header.response_to,
            flags: reply_header.flags,
            cursor_id: reply_header.cursor_id,
            starting_from: reply_header.starting_from,
            number_returned: reply_header.number_returned,
            documents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HEADER_SIZE;
    use bson::doc;
    use bytes::BytesMut;

    fn reply_frame(response_to: i32, docs: &[Document]) -> (MsgHeader, Vec<u8>) {
        let mut body = BytesMut::new();
        ReplyHeader {
            flags: 0,
            cursor_id: 0,
            starting_from: 0,
            number_returned: docs.len() as i32,
        }
        .encode(&mut body);

        let mut doc_bytes = Vec::new();
        for doc in docs {
            doc.to_writer(&mut doc_bytes).unwrap();
        }
        body.extend_from_slice(&doc_bytes);

        let header = MsgHeader {
            message_length: (HEADER_SIZE + body.len()) as i32,
            request_id: 0,
            response_to,
            op_code: 1,
        };
        (header, body.to_vec())
    }

    #[test]
    fn test_parse_reply_with_documents() {
        let docs = vec![doc! { "ok": 1.0 }, doc! { "n": 2i32 }];
        let (header, body) = reply_frame(77, &docs);

        let reply = Reply::parse(&header, &body).unwrap();
        assert_eq!(reply.response_to, 77);
        assert_eq!(reply.number_returned, 2);
        assert_eq!(reply.documents, docs);
        assert_eq!(reply.cursor_id, 0);
    }

    #[test]
    fn test_parse_empty_reply() {
        let (header, body) = reply_frame(1, &[]);

        let reply = Reply::parse(&header, &body).unwrap();
        assert_eq!(reply.number_returned, 0);
        assert!(reply.documents.is_empty());
    }

    #[test]
    fn test_parse_truncated_reply_header() {
        let header = MsgHeader {
            message_length: 26,
            request_id: 0,
            response_to: 0,
            op_code: 1,
        };
        let result = Reply::parse(&header, &[0u8; 10]);
        assert!(matches!(
            result,
            Err(ProtocolError::TruncatedReply { needed: 20, have: 10 })
        ));
    }

    #[test]
    fn test_parse_truncated_document() {
        let docs = vec![doc! { "a": 1i32 }];
        let (header, body) = reply_frame(1, &docs);

        // Drop the last byte of the document.
        let result = Reply::parse(&header, &body[..body.len() - 1]);
        assert!(matches!(result, Err(ProtocolError::TruncatedReply { .. })));
    }

    #[test]
    fn test_parse_invalid_document_length() {
        let mut body = BytesMut::new();
        ReplyHeader {
            flags: 0,
            cursor_id: 0,
            starting_from: 0,
            number_returned: 1,
        }
        .encode(&mut body);
        // Document length prefix of 2 is below the BSON minimum of 5.
        body.extend_from_slice(&2i32.to_le_bytes());
        body.extend_from_slice(&[0u8; 8]);

        let header = MsgHeader {
            message_length: (HEADER_SIZE + body.len()) as i32,
            request_id: 0,
            response_to: 0,
            op_code: 1,
        };
        let result = Reply::parse(&header, &body);
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidDocumentLength { length: 2, .. })
        ));
    }
}

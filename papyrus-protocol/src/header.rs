//! Standard and reply headers.
//!
//! Every message starts with the 16-byte standard header (all fields
//! little-endian):
//!
//! ```text
//! +----------------+------------+-------------+---------+
//! | message_length | request_id | response_to | op_code |
//! |    4 bytes     |  4 bytes   |   4 bytes   | 4 bytes |
//! +----------------+------------+-------------+---------+
//! ```
//!
//! OP_REPLY frames carry a further 20-byte reply header before the
//! returned documents:
//!
//! ```text
//! +-------+-----------+---------------+-----------------+
//! | flags | cursor_id | starting_from | number_returned |
//! |4 bytes|  8 bytes  |    4 bytes    |     4 bytes     |
//! +-------+-----------+---------------+-----------------+
//! ```

use bytes::{BufMut, BytesMut};

/// Size of the standard message header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Size of the reply header that follows it on OP_REPLY frames.
pub const REPLY_HEADER_SIZE: usize = 20;

/// The standard header carried by every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgHeader {
    /// Total message length including this header.
    pub message_length: i32,
    /// Client-assigned id of this message.
    pub request_id: i32,
    /// Id of the request this message answers; zero on requests.
    pub response_to: i32,
    /// Operation code.
    pub op_code: i32,
}

impl MsgHeader {
    /// Parses a header from an exact 16-byte slice.
    pub fn parse(buf: &[u8; HEADER_SIZE]) -> Self {
        Self {
            message_length: i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            request_id: i32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            response_to: i32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
            op_code: i32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
        }
    }

    /// Appends the encoded header to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.message_length);
        buf.put_i32_le(self.request_id);
        buf.put_i32_le(self.response_to);
        buf.put_i32_le(self.op_code);
    }
}

/// The reply header of an OP_REPLY frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyHeader {
    /// Response flags.
    pub flags: i32,
    /// Server-assigned cursor id; zero when the cursor is exhausted.
    pub cursor_id: i64,
    /// Offset of the first returned document within the cursor.
    pub starting_from: i32,
    /// Number of documents in this frame.
    pub number_returned: i32,
}

impl ReplyHeader {
    /// Parses a reply header from an exact 20-byte slice.
    pub fn parse(buf: &[u8; REPLY_HEADER_SIZE]) -> Self {
        Self {
            flags: i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            cursor_id: i64::from_le_bytes([
                buf[4], buf[5], buf[6], buf[7], buf[8], buf[9], buf[10], buf[11],
            ]),
            starting_from: i32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
            number_returned: i32::from_le_bytes([buf[16], buf[17], buf[18], buf[19]]),
        }
    }

    /// Appends the encoded reply header to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.flags);
        buf.put_i64_le(self.cursor_id);
        buf.put_i32_le(self.starting_from);
        buf.put_i32_le(self.number_returned);
    }
}

//! In-process scripted wire server for tests.
//!
//! Accepts any number of connections; every query is answered by the
//! supplied closure (handed the decoded selector document), while
//! fire-and-forget opcodes are recorded and produce no reply.

use bson::Document;
use bytes::BytesMut;
use papyrus_protocol::{MsgHeader, OpCode, ReplyHeader, HEADER_SIZE};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

type Responder = dyn Fn(&Document) -> Vec<Document> + Send + Sync;

pub(crate) struct WireServer {
    port: u16,
    ops: Arc<Mutex<Vec<i32>>>,
}

impl WireServer {
    pub fn start(respond: impl Fn(&Document) -> Vec<Document> + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let ops: Arc<Mutex<Vec<i32>>> = Arc::new(Mutex::new(Vec::new()));
        let respond: Arc<Responder> = Arc::new(respond);

        let recorded = ops.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let respond = respond.clone();
                let ops = recorded.clone();
                thread::spawn(move || serve(stream, respond, ops));
            }
        });

        Self { port, ops }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Opcodes received so far, in arrival order.
    pub fn ops(&self) -> Vec<i32> {
        self.ops.lock().unwrap().clone()
    }
}

fn serve(mut stream: TcpStream, respond: Arc<Responder>, ops: Arc<Mutex<Vec<i32>>>) {
    loop {
        let mut header_bytes = [0u8; HEADER_SIZE];
        if stream.read_exact(&mut header_bytes).is_err() {
            return;
        }
        let header = MsgHeader::parse(&header_bytes);

        let body_len = header.message_length as usize - HEADER_SIZE;
        let mut body = vec![0u8; body_len];
        if stream.read_exact(&mut body).is_err() {
            return;
        }
        ops.lock().unwrap().push(header.op_code);

        if header.op_code != OpCode::Query.as_i32() {
            continue;
        }

        let Some(selector) = parse_query_selector(&body) else {
            return;
        };
        let reply_docs = respond(&selector);
        if write_reply(&mut stream, header.request_id, &reply_docs).is_err() {
            return;
        }
    }
}

/// Pulls the selector document out of an OP_QUERY body: flags (4),
/// cstring collection name, skip (4), n_return (4), then the document.
fn parse_query_selector(body: &[u8]) -> Option<Document> {
    let name_end = body[4..].iter().position(|&b| b == 0)? + 4;
    let doc_start = name_end + 1 + 8;
    Document::from_reader(&mut &body[doc_start..]).ok()
}

fn write_reply(stream: &mut TcpStream, response_to: i32, docs: &[Document]) -> std::io::Result<()> {
    let mut body = BytesMut::new();
    ReplyHeader {
        flags: 0,
        cursor_id: 0,
        starting_from: 0,
        number_returned: docs.len() as i32,
    }
    .encode(&mut body);

    for doc in docs {
        let mut bytes = Vec::new();
        doc.to_writer(&mut bytes).unwrap();
        body.extend_from_slice(&bytes);
    }

    let mut frame = BytesMut::new();
    MsgHeader {
        message_length: (HEADER_SIZE + body.len()) as i32,
        request_id: 0,
        response_to,
        op_code: OpCode::Reply.as_i32(),
    }
    .encode(&mut frame);
    frame.extend_from_slice(&body);

    stream.write_all(&frame)
}

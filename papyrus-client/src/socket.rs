//! Blocking socket primitives.
//!
//! Two length-complete operations over a single TCP stream. Neither
//! retries: any failure is reported to the caller, which discards the
//! socket and tears the connection down.

use crate::error::ClientError;
use std::io::{Read, Write};
use std::net::TcpStream;

/// Opens a TCP stream to `host:port` with `TCP_NODELAY` set.
pub(crate) fn connect(host: &str, port: u16) -> Result<TcpStream, ClientError> {
    let stream = TcpStream::connect((host, port)).map_err(|e| {
        ClientError::ConnectionFailure(format!("failed to connect to {}:{}: {}", host, port, e))
    })?;
    stream.set_nodelay(true).ok();
    Ok(stream)
}

/// Writes all of `bytes` or fails.
pub(crate) fn send_all(stream: &mut TcpStream, bytes: &[u8]) -> Result<(), ClientError> {
    stream
        .write_all(bytes)
        .map_err(|e| ClientError::ConnectionFailure(format!("send failed: {}", e)))
}

/// Reads until `buf` is full. A zero-length read means the peer closed.
pub(crate) fn recv_exact(stream: &mut TcpStream, buf: &mut [u8]) -> Result<(), ClientError> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(ClientError::ConnectionFailure(
                    "connection closed by peer".to_string(),
                ))
            }
            Ok(n) => filled += n,
            Err(e) => return Err(ClientError::ConnectionFailure(format!("recv failed: {}", e))),
        }
    }
    Ok(())
}

//! Bounded socket pool.
//!
//! Sockets are checked out for the duration of one logical request and
//! checked back in on every exit path (the guard's `Drop`). When the pool
//! is at capacity, checkout blocks on a condition variable until a socket
//! frees up or the timeout elapses.
//!
//! Teardown bumps a generation counter instead of chasing checked-out
//! sockets: ownership of those streams has moved to their callers, so a
//! later checkin that presents a stale generation is a no-op and the
//! stream is simply dropped.

use crate::error::ClientError;
use parking_lot::{Condvar, Mutex};
use std::net::{Shutdown, TcpStream};
use std::time::{Duration, Instant};

pub(crate) struct Pool {
    state: Mutex<PoolState>,
    available: Condvar,
    size: usize,
    timeout: Duration,
}

struct PoolState {
    idle: Vec<TcpStream>,
    total: usize,
    checked_out: usize,
    generation: u64,
}

/// A checked-out socket. Checked back in when dropped.
pub(crate) struct PooledStream<'a> {
    pool: &'a Pool,
    stream: Option<TcpStream>,
    generation: u64,
}

impl PooledStream<'_> {
    pub fn stream(&mut self) -> &mut TcpStream {
        self.stream.as_mut().expect("socket present until checkin")
    }
}

impl Drop for PooledStream<'_> {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            self.pool.checkin(stream, self.generation);
        }
    }
}

impl Pool {
    pub fn new(size: usize, timeout: Duration) -> Self {
        Self {
            state: Mutex::new(PoolState {
                idle: Vec::with_capacity(size),
                total: 0,
                checked_out: 0,
                generation: 0,
            }),
            available: Condvar::new(),
            size,
            timeout,
        }
    }

    /// Checks out a socket: an idle one if available, a freshly opened one
    /// while under capacity, otherwise waits for a checkin. Waiting longer
    /// than the pool timeout is `PoolTimeout`.
    pub fn checkout(
        &self,
        mut open: impl FnMut() -> Result<TcpStream, ClientError>,
    ) -> Result<PooledStream<'_>, ClientError> {
        let deadline = Instant::now() + self.timeout;
        let mut state = self.state.lock();

        loop {
            if let Some(stream) = state.idle.pop() {
                state.checked_out += 1;
                return Ok(PooledStream {
                    pool: self,
                    stream: Some(stream),
                    generation: state.generation,
                });
            }

            if state.total < self.size {
                let stream = open()?;
                state.total += 1;
                state.checked_out += 1;
                return Ok(PooledStream {
                    pool: self,
                    stream: Some(stream),
                    generation: state.generation,
                });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ClientError::PoolTimeout);
            }
            let _ = self.available.wait_for(&mut state, deadline - now);
        }
    }

    fn checkin(&self, stream: TcpStream, generation: u64) {
        let mut state = self.state.lock();
        if generation != state.generation {
            // Checked out before a teardown; the stream closes on drop.
            return;
        }
        state.checked_out -= 1;
        state.idle.push(stream);
        self.available.notify_one();
    }

    /// Closes every pooled socket and empties both sets. In-flight
    /// checkouts are invalidated via the generation counter.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        for stream in state.idle.drain(..) {
            let _ = stream.shutdown(Shutdown::Both);
        }
        state.total = 0;
        state.checked_out = 0;
        state.generation += 1;
    }

    /// Number of live sockets (idle plus checked out).
    pub fn socket_count(&self) -> usize {
        self.state.lock().total
    }

    /// Number of sockets currently checked out.
    pub fn checked_out_count(&self) -> usize {
        self.state.lock().checked_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    fn opener(port: u16) -> impl FnMut() -> Result<TcpStream, ClientError> {
        move || crate::socket::connect("127.0.0.1", port)
    }

    #[test]
    fn test_checkout_reuses_idle_socket() {
        let (listener, port) = listener();
        let acceptor = thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming().take(1) {
                held.push(stream.unwrap());
            }
            held
        });

        let pool = Pool::new(2, Duration::from_secs(5));

        let first = pool.checkout(opener(port)).unwrap();
        assert_eq!(pool.socket_count(), 1);
        assert_eq!(pool.checked_out_count(), 1);
        drop(first);
        assert_eq!(pool.checked_out_count(), 0);

        // A second checkout must not open a new socket.
        let second = pool.checkout(opener(port)).unwrap();
        assert_eq!(pool.socket_count(), 1);
        drop(second);
        acceptor.join().unwrap();
    }

    #[test]
    fn test_pool_never_exceeds_size() {
        let (listener, port) = listener();
        let acceptor = thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming().take(2) {
                held.push(stream.unwrap());
            }
            held
        });

        let pool = Pool::new(2, Duration::from_millis(200));
        let a = pool.checkout(opener(port)).unwrap();
        let b = pool.checkout(opener(port)).unwrap();
        assert_eq!(pool.socket_count(), 2);

        // At capacity with nothing idle: the third checkout times out.
        let start = Instant::now();
        let result = pool.checkout(opener(port));
        assert!(matches!(result, Err(ClientError::PoolTimeout)));
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert_eq!(pool.socket_count(), 2);

        drop(a);
        drop(b);
        acceptor.join().unwrap();
    }

    #[test]
    fn test_checkin_after_clear_is_noop() {
        let (listener, port) = listener();
        let acceptor = thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming().take(1) {
                held.push(stream.unwrap());
            }
            held
        });

        let pool = Pool::new(1, Duration::from_secs(5));
        let held = pool.checkout(opener(port)).unwrap();

        pool.clear();
        assert_eq!(pool.socket_count(), 0);

        // The stale socket must not re-enter the pool.
        drop(held);
        assert_eq!(pool.socket_count(), 0);
        assert_eq!(pool.checked_out_count(), 0);
        acceptor.join().unwrap();
    }
}

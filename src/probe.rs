use crate::icmp::v4::{parse_echo_reply, EchoRequest, RawSocket, TSocket, ECHO_REQUEST};
use crate::{SweepError, SweepResult};
use rand::Rng;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

const ECHO_SEQUENCE: u16 = 1;
const RECV_BUFFER_LEN: usize = 256;
/// Less time than this left before the deadline counts as a timeout.
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Answers "does this host respond?" for one address.
///
/// `Ok(false)` covers every negative liveness signal (timeout, mismatched
/// reply). `Err` is reserved for environment faults that must abort the run.
pub trait Prober: Send + Sync {
    fn probe(&self, address: Ipv4Addr) -> SweepResult<bool>;
}

type SocketFactory<S> = Box<dyn Fn(Duration) -> io::Result<S> + Send + Sync>;

/// Sends a single Echo Request per call over a socket opened for that call
/// and waits up to `timeout` for the answer.
pub struct IcmpProber<S> {
    timeout: Duration,
    open_socket: SocketFactory<S>,
}

impl IcmpProber<RawSocket> {
    pub fn raw(timeout: Duration) -> Self {
        Self::with_socket_factory(timeout, RawSocket::new)
    }
}

impl<S> IcmpProber<S>
where
    S: TSocket + 'static,
{
    pub fn with_socket_factory<F>(timeout: Duration, open_socket: F) -> Self
    where
        F: Fn(Duration) -> io::Result<S> + Send + Sync + 'static,
    {
        IcmpProber { timeout, open_socket: Box::new(open_socket) }
    }

    fn probe_with(&self, socket: &S, address: Ipv4Addr) -> SweepResult<bool> {
        let identifier: u16 = rand::thread_rng().gen();
        let request = EchoRequest::new(identifier, ECHO_SEQUENCE, &[]);
        let target: socket2::SockAddr = SocketAddr::new(IpAddr::V4(address), 0).into();

        socket.send_to(&request.to_bytes(), &target).map_err(SweepError::Socket)?;
        tracing::trace!(%address, identifier, "echo request sent");

        let deadline = Instant::now() + self.timeout;
        let mut buf = [0u8; RECV_BUFFER_LEN];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining < MIN_READ_TIMEOUT {
                tracing::debug!(%address, "timeout waiting for echo reply");
                return Ok(false);
            }
            socket.set_read_timeout(remaining).map_err(SweepError::Socket)?;

            let (n, source) = match socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) if is_timeout(&e) => continue,
                Err(e) => return Err(SweepError::Socket(e)),
            };
            if source != IpAddr::V4(address) {
                tracing::trace!(%address, %source, "ignoring datagram from another host");
                continue;
            }

            match parse_echo_reply(&buf[..n]) {
                Some(reply) if reply.matches(identifier) => {
                    tracing::debug!(%address, "received echo reply");
                    return Ok(true);
                }
                // Loopback hands our own request back on a raw socket.
                Some(reply) if reply.icmp_type == ECHO_REQUEST && reply.identifier == identifier => {
                    tracing::trace!(%address, "ignoring reflected echo request");
                }
                reply => {
                    tracing::warn!(%address, ?reply, "unexpected ICMP response");
                    return Ok(false);
                }
            }
        }
    }
}

impl<S> Prober for IcmpProber<S>
where
    S: TSocket + 'static,
{
    fn probe(&self, address: Ipv4Addr) -> SweepResult<bool> {
        let socket = (self.open_socket)(self.timeout).map_err(SweepError::Socket)?;
        // `socket` is dropped, and closed, on every return path.
        self.probe_with(&socket, address)
    }
}

fn is_timeout(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}

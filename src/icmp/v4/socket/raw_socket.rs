use super::TSocket;
use pnet_packet::ipv4::Ipv4Packet;
use socket2::{Domain, Protocol, Type};
use std::net::{IpAddr, Ipv4Addr};
use std::{io, time::Duration};

const RECV_BUFFER_LEN: usize = 1024;
const MIN_SOCKET_TIMEOUT: Duration = Duration::from_micros(1);

/// setsockopt keeps microseconds only, and a zero `timeval` blocks forever, so
/// anything shorter than 1µs is rounded up.
fn socket_timeout(timeout: Duration) -> io::Result<Duration> {
    if timeout.is_zero() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "read timeout must be non-zero"));
    }
    Ok(timeout.max(MIN_SOCKET_TIMEOUT))
}

/// A raw ICMPv4 socket. Needs root or `CAP_NET_RAW`.
pub struct RawSocket {
    socket: socket2::Socket,
}

impl RawSocket {
    pub fn new(timeout: Duration) -> Result<Self, io::Error> {
        tracing::trace!("creating RawSocket");
        let socket = socket2::Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?;
        socket.set_read_timeout(Some(socket_timeout(timeout)?))?;
        Ok(RawSocket { socket })
    }
}

impl TSocket for RawSocket {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize> {
        self.socket.send_to(buf, addr)
    }

    fn set_read_timeout(&self, timeout: Duration) -> io::Result<()> {
        self.socket.set_read_timeout(Some(socket_timeout(timeout)?))
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, IpAddr)> {
        let mut recv_buf = [0u8; RECV_BUFFER_LEN];

        // Socket2 gives a safety guaranty which allows us to do an unsafe cast from `&mut [u8]`
        // to `&mut [std::mem::MaybeUninit<u8>]`; it never writes uninitialized bytes.
        // https://docs.rs/socket2/0.4.7/socket2/struct.Socket.html#method.recv
        //
        // On a RAW socket we get the whole IP packet.
        let (n, socket_addr) = self.socket.recv_from(unsafe {
            &mut *(std::ptr::addr_of_mut!(recv_buf) as *mut [u8] as *mut [std::mem::MaybeUninit<u8>])
        })?;
        let ip = socket_addr
            .as_socket_ipv4()
            .map_or(Ipv4Addr::UNSPECIFIED, |addr| *addr.ip());

        // A datagram we cannot make sense of is handed on empty, which the
        // prober treats as a non-matching reply.
        let icmp: &[u8] = match Ipv4Packet::new(&recv_buf[..n]) {
            Some(ipv4_packet) => {
                let header_len = usize::from(ipv4_packet.get_header_length()) * 4;
                recv_buf.get(header_len..n).unwrap_or_default()
            }
            None => &[],
        };
        let len = icmp.len().min(buf.len());
        buf[..len].copy_from_slice(&icmp[..len]);
        Ok((len, IpAddr::V4(ip)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_microsecond_timeout_rounds_up() {
        assert_eq!(MIN_SOCKET_TIMEOUT, socket_timeout(Duration::from_nanos(500)).unwrap());
        assert_eq!(MIN_SOCKET_TIMEOUT, socket_timeout(Duration::from_nanos(1)).unwrap());
    }

    #[test]
    fn longer_timeouts_are_kept() {
        let timeout = Duration::from_millis(1500);
        assert_eq!(timeout, socket_timeout(timeout).unwrap());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let error = socket_timeout(Duration::ZERO).unwrap_err();
        assert_eq!(io::ErrorKind::InvalidInput, error.kind());
    }
}

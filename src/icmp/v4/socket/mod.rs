use std::net::IpAddr;
use std::{io, time::Duration};

pub(crate) mod raw_socket;

/// An ICMPv4 socket as seen by the prober.
pub trait TSocket: Send + Sync {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize>;
    fn set_read_timeout(&self, timeout: Duration) -> io::Result<()>;
    /// Receives one datagram and copies its ICMP portion (IP header stripped)
    /// into `buf`. Returns the number of bytes copied and the source address.
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, IpAddr)>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::sync::Mutex;

    use pnet_packet::icmp::checksum;
    use pnet_packet::icmp::echo_reply::EchoReplyPacket;
    use pnet_packet::icmp::echo_reply::MutableEchoReplyPacket;
    use pnet_packet::icmp::echo_request::EchoRequestPacket;
    use pnet_packet::icmp::IcmpCode;
    use pnet_packet::icmp::IcmpPacket;
    use pnet_packet::icmp::IcmpType;
    use pnet_packet::Packet;
    use pnet_packet::PacketSize;

    pub(crate) const FOREIGN_ADDR: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 99);

    #[derive(Clone, Copy, PartialEq, Eq)]
    pub(crate) enum OnSend {
        ReturnErr,
        ReturnDefault,
    }

    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub(crate) enum OnReceive {
        /// Echo reply from the probed address carrying the sent identifier.
        Echo,
        /// Echo reply from the probed address with a different identifier.
        WrongIdentifier,
        /// Destination unreachable from the probed address.
        Unreachable,
        /// Our own echo request reflected back, as loopback does on raw sockets.
        OwnRequest,
        /// Matching echo reply, but from an unrelated host.
        Foreign,
        /// A datagram too short to hold an ICMP header.
        Truncated,
        WouldBlock,
        Fail(io::ErrorKind),
    }

    type VecOfBuffersAndAddresses = Arc<Mutex<Vec<(Vec<u8>, IpAddr)>>>;

    pub(crate) struct SocketMock {
        on_send: OnSend,
        on_receive: Arc<Mutex<VecDeque<OnReceive>>>,
        sent: VecOfBuffersAndAddresses,
        read_timeouts: Arc<Mutex<Vec<Duration>>>,
        received_cnt: Arc<Mutex<u16>>,
        dropped_cnt: Arc<AtomicUsize>,
        opened: bool,
    }

    impl Clone for SocketMock {
        fn clone(&self) -> Self {
            SocketMock {
                on_send: self.on_send,
                on_receive: self.on_receive.clone(),
                sent: self.sent.clone(),
                read_timeouts: self.read_timeouts.clone(),
                received_cnt: self.received_cnt.clone(),
                dropped_cnt: self.dropped_cnt.clone(),
                opened: false,
            }
        }
    }

    impl Drop for SocketMock {
        fn drop(&mut self) {
            if self.opened {
                self.dropped_cnt.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    impl SocketMock {
        /// Receive behaviour is consumed front to back; once exhausted every
        /// receive reports `WouldBlock`.
        pub(crate) fn new(on_send: OnSend, on_receive: &[OnReceive]) -> Self {
            Self {
                on_send,
                on_receive: Arc::new(Mutex::new(on_receive.iter().copied().collect())),
                sent: Arc::new(Mutex::new(vec![])),
                read_timeouts: Arc::new(Mutex::new(vec![])),
                received_cnt: Arc::new(Mutex::new(0)),
                dropped_cnt: Arc::new(AtomicUsize::new(0)),
                opened: false,
            }
        }

        /// A handle sharing this mock's state, standing in for a freshly
        /// opened socket. Only opened handles count towards drops.
        pub(crate) fn open(&self) -> Self {
            let mut handle = self.clone();
            handle.opened = true;
            handle
        }

        pub(crate) fn should_send_number_of_messages(&self, n: usize) -> &Self {
            assert_eq!(n, self.sent.lock().unwrap().len());
            self
        }

        pub(crate) fn should_send_to_address(&self, addr: &IpAddr) -> &Self {
            assert!(self.sent.lock().unwrap().iter().any(|e| *addr == e.1));
            self
        }

        pub(crate) fn should_receive_number_of_messages(&self, n: u16) -> &Self {
            assert_eq!(n, *self.received_cnt.lock().unwrap());
            self
        }

        pub(crate) fn should_be_dropped_times(&self, n: usize) -> &Self {
            assert_eq!(n, self.dropped_cnt.load(Ordering::SeqCst));
            self
        }

        pub(crate) fn sent_packets(&self) -> Vec<Vec<u8>> {
            self.sent.lock().unwrap().iter().map(|e| e.0.clone()).collect()
        }

        pub(crate) fn read_timeouts(&self) -> Vec<Duration> {
            self.read_timeouts.lock().unwrap().clone()
        }

        fn last_sent(&self) -> (Vec<u8>, IpAddr) {
            self.sent.lock().unwrap().last().cloned().expect("receive called before send")
        }
    }

    fn echo_reply(icmp_type: u8, identifier: u16, sequence_number: u16) -> Vec<u8> {
        let payload: Vec<u8> = vec![0xFF, 0xFF, 0xFF, 0xFF];
        let buf = vec![0u8; EchoReplyPacket::minimum_packet_size() + payload.len()];
        let mut package: MutableEchoReplyPacket<'_> = MutableEchoReplyPacket::owned(buf).unwrap();
        package.set_icmp_type(IcmpType::new(icmp_type));
        package.set_icmp_code(IcmpCode::new(0));
        package.set_identifier(identifier);
        package.set_sequence_number(sequence_number);
        package.set_payload(&payload);
        package.set_checksum(0_u16);
        package.set_checksum(checksum(&IcmpPacket::new(package.packet()).unwrap()));
        package.packet()[..package.packet_size()].to_vec()
    }

    impl TSocket for SocketMock {
        fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize> {
            if self.on_send == OnSend::ReturnErr {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "simulating error in mock"));
            }
            self.sent.lock().unwrap().push((
                buf.to_vec(),
                addr.as_socket()
                    .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "error in extracting IP address from SockAddr"))?
                    .ip(),
            ));
            Ok(buf.len())
        }

        fn set_read_timeout(&self, timeout: Duration) -> io::Result<()> {
            self.read_timeouts.lock().unwrap().push(timeout);
            Ok(())
        }

        fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, IpAddr)> {
            let on_receive = self.on_receive.lock().unwrap().pop_front().unwrap_or(OnReceive::WouldBlock);
            match on_receive {
                OnReceive::WouldBlock => {
                    return Err(io::Error::new(io::ErrorKind::WouldBlock, "simulating would-block in mock"));
                }
                OnReceive::Fail(kind) => return Err(io::Error::new(kind, "simulating failure in mock")),
                _ => {}
            }

            let (request, target) = self.last_sent();
            let request = EchoRequestPacket::new(&request).expect("mock only sees echo requests");
            let identifier = request.get_identifier();
            let sequence_number = request.get_sequence_number();

            let (package, source): (Vec<u8>, IpAddr) = match on_receive {
                OnReceive::WouldBlock | OnReceive::Fail(_) => unreachable!(),
                OnReceive::Echo => (echo_reply(0, identifier, sequence_number), target),
                OnReceive::WrongIdentifier => (echo_reply(0, identifier.wrapping_add(1), sequence_number), target),
                OnReceive::Unreachable => (echo_reply(3, identifier, sequence_number), target),
                OnReceive::OwnRequest => (request.packet().to_vec(), target),
                OnReceive::Foreign => (echo_reply(0, identifier, sequence_number), IpAddr::V4(FOREIGN_ADDR)),
                OnReceive::Truncated => (vec![0u8; 4], target),
            };

            *self.received_cnt.lock().unwrap() += 1;

            if buf.len() < package.len() {
                return Err(io::Error::new(io::ErrorKind::Other, "buffer too small"));
            }
            buf[..package.len()].copy_from_slice(&package);
            Ok((package.len(), source))
        }
    }
}

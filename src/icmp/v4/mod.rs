mod echo;
pub use echo::{
    build_echo_request, checksum, is_matching_reply, parse_echo_reply, EchoReply, EchoRequest, ECHO_HEADER_LEN,
    ECHO_REPLY, ECHO_REQUEST,
};

mod socket;
pub use socket::raw_socket::RawSocket;
pub use socket::TSocket;

#[cfg(test)]
pub(crate) use socket::tests;

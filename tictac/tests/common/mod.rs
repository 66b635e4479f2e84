use std::net::{IpAddr, Ipv4Addr};

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;
use tokio_util::compat::TokioAsyncWriteCompatExt;

use tictac::protocol::authentication::{
    Action, Continue, ContinueFlags, Reply, ReplyFlags, Start, Status,
};
use tictac::protocol::{
    AuthenticationContext, AuthenticationService, AuthenticationType, HeaderInfo, MajorVersion,
    MinorVersion, Packet, PacketBody, PacketFlags, PrivilegeLevel, Serialize, UserInformation,
    Version,
};
use tictac::{KeyTable, Server, SessionConfig, SessionError, SessionOutcome, StaticCredentials};

/// The TACACS+ secret key configured for integration tests.
pub const SECRET_KEY: &str = "very secure key that is super secret";

/// The session id used by the test client.
pub const SESSION_ID: u32 = 0x5e556999;

/// The address the test client appears to connect from.
pub const CLIENT_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10));

/// Creates a server which knows the test key for [`CLIENT_ADDRESS`] and a single user.
pub fn test_server(config: SessionConfig) -> Server {
    let mut keys = KeyTable::new();
    keys.insert(CLIENT_ADDRESS, SECRET_KEY);

    let mut credentials = StaticCredentials::new();
    credentials.add_user("someuser", "hunter2");

    Server::new(keys, credentials, config)
}

/// Runs a session for an in-memory connection, returning the client end of it.
pub fn spawn_session(
    server: &Server,
    peer: IpAddr,
) -> (
    DuplexStream,
    JoinHandle<Result<SessionOutcome, SessionError>>,
) {
    let (client, server_end) = tokio::io::duplex(4096);

    // tokio has its own AsyncRead/AsyncWrite traits, so a compatibility shim is needed
    let session = server.accept_session(server_end.compat_write(), peer);

    (client, tokio::spawn(session.run()))
}

pub fn header(sequence_number: u8) -> HeaderInfo {
    HeaderInfo::new(
        Version::new(MajorVersion::RFC8907, MinorVersion::Default),
        sequence_number,
        PacketFlags::empty(),
        SESSION_ID,
    )
}

pub fn ascii_start(user: &str) -> Start<'_> {
    Start::new(
        Action::Login,
        AuthenticationContext {
            privilege_level: PrivilegeLevel::new(1).expect("privilege level should be valid"),
            authentication_type: AuthenticationType::Ascii,
            service: AuthenticationService::Login,
        },
        UserInformation::new(user.as_bytes(), b"tty0", b"192.0.2.10")
            .expect("user information should be valid"),
        b"",
    )
    .expect("start body should be valid")
}

pub fn password_continue(password: &str) -> Continue<'_> {
    Continue::new(password.as_bytes(), b"", ContinueFlags::empty())
        .expect("continue body should be valid")
}

/// Serializes & sends a packet, obfuscated with `key`.
pub async fn send<B: PacketBody + Serialize>(
    connection: &mut DuplexStream,
    packet: Packet<B>,
    key: &str,
) {
    let mut buffer = vec![0; packet.wire_size()];
    let length = packet
        .serialize(key, &mut buffer)
        .expect("client packet should serialize");

    connection
        .write_all(&buffer[..length])
        .await
        .expect("write to session should succeed");
}

/// The parts of a server reply the tests care about.
#[derive(Debug)]
pub struct ReceivedReply {
    pub sequence_number: u8,
    pub session_id: u32,
    pub status: Status,
    pub no_echo: bool,
    pub server_message: Vec<u8>,
}

/// Reads a single reply from the server, or `None` if it closed the connection instead.
pub async fn receive(connection: &mut DuplexStream) -> Option<ReceivedReply> {
    let mut buffer = vec![0; HeaderInfo::HEADER_SIZE_BYTES];
    if connection.read_exact(&mut buffer).await.is_err() {
        return None;
    }

    let body_length = HeaderInfo::extract_body_length(&buffer).expect("header should be complete");
    buffer.resize(HeaderInfo::HEADER_SIZE_BYTES + body_length as usize, 0);
    connection
        .read_exact(&mut buffer[HeaderInfo::HEADER_SIZE_BYTES..])
        .await
        .expect("server should send a full reply");

    let packet: Packet<Reply<'_>> =
        Packet::deserialize(SECRET_KEY, &mut buffer).expect("reply should deserialize");

    Some(ReceivedReply {
        sequence_number: packet.header().sequence_number(),
        session_id: packet.header().session_id(),
        status: packet.body().status(),
        no_echo: packet.body().flags().contains(ReplyFlags::NO_ECHO),
        server_message: packet.body().server_message().to_vec(),
    })
}

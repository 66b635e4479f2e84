//! Per-connection authentication sessions.

use std::net::IpAddr;
use std::sync::Arc;

use futures::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tictac_protocol::authentication::{Continue, Reply, ReplyFlags, Start, Status};
use tictac_protocol::{
    Deserialize, DeserializeError, HeaderInfo, Packet, PacketBody, PacketFlags, PacketType,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use super::credentials::{CredentialValidator, Verdict};
use super::framer::{self, RawPacket};
use super::outcome::{NonTerminalStatus, OutcomeStatus, SessionOutcome};
use super::secret::{KeyLookup, SharedSecret};
use super::{SessionConfig, SessionError};


/// What the server is waiting for the client to provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Prompt {
    User,
    Password,
}

/// Where a session is in the authentication exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    New,
    AwaitingCredential(Prompt),
    Terminal(Status),
    Aborted,
}

impl State {
    fn describe(&self) -> &'static str {
        match self {
            State::New => "waiting for a start packet",
            State::AwaitingCredential(_) => "waiting for a continue packet",
            State::Terminal(_) => "session already finished",
            State::Aborted => "session already aborted",
        }
    }
}

/// What should happen on the connection after a packet was handled.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Transition {
    /// Send a reply and wait for the next packet.
    Reply(Vec<u8>),

    /// Send a final reply and end the session.
    Finish {
        reply: Vec<u8>,
        outcome: OutcomeStatus,
    },

    /// End the session without replying.
    Close,
}

/// The authentication state machine for a single connection, independent of any I/O.
pub(crate) struct Session {
    config: Arc<SessionConfig>,
    validator: Arc<dyn CredentialValidator>,
    secret: SharedSecret,

    /// Pinned by the first packet of the connection.
    session_id: Option<u32>,

    /// Sequence number the next client packet has to carry.
    expected_sequence_number: u8,

    user: Vec<u8>,
    state: State,
}

impl Session {
    pub(crate) fn new(
        config: Arc<SessionConfig>,
        validator: Arc<dyn CredentialValidator>,
        secret: SharedSecret,
    ) -> Self {
        Self {
            config,
            validator,
            secret,
            session_id: None,
            expected_sequence_number: 1,
            user: Vec::new(),
            state: State::New,
        }
    }

    pub(crate) fn user(&self) -> &[u8] {
        &self.user
    }

    /// Advances the state machine by one client packet.
    ///
    /// Any error is fatal to the session.
    pub(crate) fn handle_packet(&mut self, mut packet: RawPacket) -> Result<Transition, SessionError> {
        let header = packet.header().clone();

        match self.session_id {
            None => self.session_id = Some(header.session_id()),
            Some(expected) if expected != header.session_id() => {
                return Err(SessionError::SessionIdMismatch {
                    expected,
                    actual: header.session_id(),
                });
            }
            Some(_) => {}
        }

        if header.sequence_number() != self.expected_sequence_number {
            return Err(SessionError::SequenceNumberMismatch {
                expected: self.expected_sequence_number,
                actual: header.sequence_number(),
            });
        }

        if packet.is_unencrypted() && !self.config.allow_unencrypted {
            return Err(SessionError::UnencryptedPacket);
        }

        if packet.packet_type() != PacketType::Authentication {
            return Err(SessionError::UnsupportedPacketType(packet.packet_type()));
        }

        packet.obfuscate(self.secret.as_ref());

        match self.state {
            State::New => match packet.decode_body::<Start<'_>>() {
                Ok(start) => self.handle_start(&header, &start),
                Err(err) => Err(self.undecodable::<Continue<'_>>(&packet, err)),
            },
            State::AwaitingCredential(prompt) => match packet.decode_body::<Continue<'_>>() {
                Ok(continue_body) => self.handle_continue(&header, prompt, &continue_body),
                Err(err) => Err(self.undecodable::<Start<'_>>(&packet, err)),
            },
            State::Terminal(_) | State::Aborted => Err(SessionError::UnexpectedMessage {
                state: self.state.describe(),
            }),
        }
    }

    /// Classifies a body that could not be decoded as what the current state expects.
    ///
    /// A well-formed body of the other kind is out of order rather than malformed.
    fn undecodable<'raw, B>(&self, packet: &'raw RawPacket, err: DeserializeError) -> SessionError
    where
        B: PacketBody + Deserialize<'raw>,
    {
        if packet.decode_body::<B>().is_ok() {
            SessionError::UnexpectedMessage {
                state: self.state.describe(),
            }
        } else {
            err.into()
        }
    }

    fn handle_start(
        &mut self,
        header: &HeaderInfo,
        start: &Start<'_>,
    ) -> Result<Transition, SessionError> {
        let user = start.user_information().user();
        debug!(
            action = %start.action(),
            authentication_type = %start.authentication().authentication_type,
            service = %start.authentication().service,
            privilege_level = %start.authentication().privilege_level,
            single_connection = header.single_connection(),
            "authentication start"
        );

        if user.is_empty() {
            self.ask_for(header, Prompt::User)
        } else {
            self.user = user.to_vec();
            self.ask_for(header, Prompt::Password)
        }
    }

    fn handle_continue(
        &mut self,
        header: &HeaderInfo,
        prompt: Prompt,
        continue_body: &Continue<'_>,
    ) -> Result<Transition, SessionError> {
        if continue_body.is_abort() {
            info!("client aborted authentication");
            self.state = State::Aborted;
            return Ok(Transition::Close);
        }

        match prompt {
            Prompt::User => {
                self.user = continue_body.user_message().to_vec();
                self.ask_for(header, Prompt::Password)
            }
            Prompt::Password => {
                let status = match self
                    .validator
                    .validate(&self.user, continue_body.user_message())
                {
                    Ok(Verdict::Pass) => Status::Pass,
                    Ok(Verdict::Fail) => Status::Fail,
                    Err(err) => {
                        warn!(error = %err, "credential validator failed");
                        Status::Error
                    }
                };

                self.reply(header, status, ReplyFlags::empty(), b"")
            }
        }
    }

    fn ask_for(&mut self, header: &HeaderInfo, prompt: Prompt) -> Result<Transition, SessionError> {
        let config = Arc::clone(&self.config);

        let transition = match prompt {
            Prompt::User => self.reply(
                header,
                Status::GetUser,
                ReplyFlags::empty(),
                config.username_prompt.as_bytes(),
            )?,
            Prompt::Password => self.reply(
                header,
                Status::GetPassword,
                ReplyFlags::NO_ECHO,
                config.password_prompt.as_bytes(),
            )?,
        };

        self.state = State::AwaitingCredential(prompt);
        Ok(transition)
    }

    /// Serializes a reply to the packet with the given header.
    fn reply(
        &mut self,
        request: &HeaderInfo,
        status: Status,
        flags: ReplyFlags,
        server_message: &[u8],
    ) -> Result<Transition, SessionError> {
        let sequence_number = request
            .sequence_number()
            .checked_add(1)
            .ok_or(SessionError::SequenceNumberOverflow)?;

        if server_message.len() > usize::from(u16::MAX) {
            warn!(
                length = server_message.len(),
                "server message too long, truncating"
            );
        }

        // only the unencrypted flag is echoed; single connection mode is not offered
        let header = HeaderInfo::new(
            request.version(),
            sequence_number,
            request.flags() & PacketFlags::UNENCRYPTED,
            request.session_id(),
        );
        let body = Reply::new(status, flags, server_message, b"")?;
        let reply = framer::encode_packet(Packet::new(header, body), self.secret.as_ref())?;

        debug!(%status, sequence_number, "sending reply");

        // client packets are odd, so replies never carry 255
        self.expected_sequence_number = sequence_number.wrapping_add(1);

        match OutcomeStatus::try_from(status) {
            Ok(outcome) => {
                self.state = State::Terminal(status);
                Ok(Transition::Finish { reply, outcome })
            }
            Err(NonTerminalStatus(_)) => Ok(Transition::Reply(reply)),
        }
    }
}

/// A session accepted by a [`Server`](super::Server), ready to be driven with [`SessionHandle::run`].
pub struct SessionHandle<S> {
    connection: S,
    peer: IpAddr,
    connection_id: Uuid,
    keys: Arc<dyn KeyLookup>,
    validator: Arc<dyn CredentialValidator>,
    config: Arc<SessionConfig>,
    cancellation: CancellationToken,
}

impl<S: AsyncRead + AsyncWrite + Unpin> SessionHandle<S> {
    pub(super) fn new(
        connection: S,
        peer: IpAddr,
        keys: Arc<dyn KeyLookup>,
        validator: Arc<dyn CredentialValidator>,
        config: Arc<SessionConfig>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            connection,
            peer,
            connection_id: Uuid::new_v4(),
            keys,
            validator,
            config,
            cancellation,
        }
    }

    /// The address of the client on the other end of the connection.
    pub fn peer(&self) -> IpAddr {
        self.peer
    }

    /// A unique id for this connection, which is attached to every log line of the session.
    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    /// Returns a token that cancels this session (and only this one) when triggered.
    ///
    /// The token is also cancelled when the [`Server`](super::Server) is shut down.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Drives the authentication exchange to completion.
    ///
    /// The connection is closed when this returns, regardless of the result. Reads are
    /// bounded by tokio timers, so this has to run within a tokio runtime.
    pub async fn run(self) -> Result<SessionOutcome, SessionError> {
        let span = tracing::info_span!(
            "session",
            peer = %self.peer,
            connection_id = %self.connection_id
        );

        self.run_to_completion().instrument(span).await
    }

    async fn run_to_completion(mut self) -> Result<SessionOutcome, SessionError> {
        debug!("session started");
        let result = self.exchange().await;

        if let Err(err) = self.connection.close().await {
            debug!(error = %err, "error closing connection");
        }

        match &result {
            Ok(outcome) => info!(status = ?outcome.status, "session finished"),
            Err(SessionError::Cancelled) => warn!("session cancelled"),
            Err(err) => warn!(error = %err, "session terminated"),
        }

        result
    }

    async fn exchange(&mut self) -> Result<SessionOutcome, SessionError> {
        let secret = self
            .keys
            .resolve_secret(self.peer)
            .ok_or(SessionError::NoSecretForPeer(self.peer))?;

        let mut session = Session::new(
            Arc::clone(&self.config),
            Arc::clone(&self.validator),
            secret,
        );

        loop {
            let packet = self.next_packet().await?;
            debug!(
                packet_type = %packet.packet_type(),
                sequence_number = packet.header().sequence_number(),
                body_length = packet.body().len(),
                "received packet"
            );

            match session.handle_packet(packet)? {
                Transition::Reply(reply) => framer::write_packet(&mut self.connection, &reply).await?,
                Transition::Finish { reply, outcome } => {
                    framer::write_packet(&mut self.connection, &reply).await?;

                    return Ok(SessionOutcome {
                        status: outcome,
                        user: session.user().to_vec(),
                    });
                }
                Transition::Close => {
                    return Ok(SessionOutcome {
                        status: OutcomeStatus::Aborted,
                        user: session.user().to_vec(),
                    })
                }
            }
        }
    }

    /// Reads the next packet, giving up on timeout or cancellation.
    async fn next_packet(&mut self) -> Result<RawPacket, SessionError> {
        let read = tokio::time::timeout(
            self.config.read_timeout,
            framer::read_packet(&mut self.connection, self.config.max_body_length),
        );

        tokio::select! {
            biased;

            _ = self.cancellation.cancelled() => Err(SessionError::Cancelled),
            result = read => match result {
                Ok(packet) => packet,
                Err(_elapsed) => Err(SessionError::TimedOut),
            },
        }
    }
}

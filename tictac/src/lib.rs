//! # tictac
//!
//! Asynchronous, runtime-independent server for the authentication part of the
//! TACACS+ ([RFC8907](https://www.rfc-editor.org/rfc/rfc8907)) protocol.
//!
//! A [`Server`] turns accepted connections into [`SessionHandle`]s, each of which runs one
//! ASCII login exchange (START, GETPASS, CONTINUE, PASS/FAIL) against a [`CredentialValidator`],
//! with body obfuscation keyed by the secret a [`KeyLookup`] resolves for the client.
//!
//! Connections only need to implement the [`futures`] I/O traits; tokio streams can be
//! adapted with [`tokio_util::compat`](https://docs.rs/tokio-util/latest/tokio_util/compat/index.html).
//! Read timeouts use tokio timers, so sessions have to run inside a tokio runtime.

#![cfg_attr(feature = "docsrs", feature(doc_auto_cfg))]
#![warn(missing_docs)]

use std::net::IpAddr;
use std::sync::Arc;

use futures::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

mod config;
pub use config::{ConfigBuilder, SessionConfig};

mod credentials;
pub use credentials::{CredentialValidator, StaticCredentials, ValidatorError, Verdict};

mod error;
pub use error::SessionError;

mod framer;

mod outcome;
pub use outcome::{OutcomeStatus, SessionOutcome};

mod secret;
pub use secret::{KeyLookup, KeyTable, SharedSecret};

mod session;
pub use session::SessionHandle;

// reexported for ease of access
pub use tictac_protocol as protocol;
pub use tictac_protocol::DEFAULT_PORT;

/// A TACACS+ authentication server.
///
/// The server itself does not own a listener; the host accepts connections however it likes
/// and hands each one to [`Server::accept_session`].
#[derive(Clone)]
pub struct Server {
    keys: Arc<dyn KeyLookup>,
    validator: Arc<dyn CredentialValidator>,
    config: Arc<SessionConfig>,
    shutdown: CancellationToken,
}

impl Server {
    /// Creates a server that resolves secrets with `keys` and checks credentials with `validator`.
    pub fn new<K, V>(keys: K, validator: V, config: SessionConfig) -> Self
    where
        K: KeyLookup + 'static,
        V: CredentialValidator + 'static,
    {
        Self::with_shared(Arc::new(keys), Arc::new(validator), config)
    }

    /// Creates a server from collaborators that are already shared elsewhere.
    pub fn with_shared(
        keys: Arc<dyn KeyLookup>,
        validator: Arc<dyn CredentialValidator>,
        config: SessionConfig,
    ) -> Self {
        Self {
            keys,
            validator,
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        }
    }

    /// The settings applied to every session.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Wraps an accepted connection from `peer` in a session.
    ///
    /// Nothing is read from the connection until [`SessionHandle::run`] is awaited; the shared
    /// secret for `peer` is also resolved at that point.
    pub fn accept_session<S>(&self, connection: S, peer: IpAddr) -> SessionHandle<S>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        SessionHandle::new(
            connection,
            peer,
            Arc::clone(&self.keys),
            Arc::clone(&self.validator),
            Arc::clone(&self.config),
            self.shutdown.child_token(),
        )
    }

    /// Cancels every session accepted by this server (or any of its clones).
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Whether [`Server::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

use std::time::Duration;

/// Largest possible authentication body: a reply with two maximum-length 16-bit fields.
const MAX_AUTHENTICATION_BODY_LENGTH: u32 = 6 + 2 * u16::MAX as u32;

/// Settings applied to every session accepted by a [`Server`](super::Server).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct SessionConfig {
    pub(super) read_timeout: Duration,
    pub(super) max_body_length: u32,
    pub(super) allow_unencrypted: bool,
    pub(super) password_prompt: String,
    pub(super) username_prompt: String,
}

impl SessionConfig {
    /// How long a session waits for each client packet before giving up.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// The largest packet body accepted from a client.
    pub fn max_body_length(&self) -> u32 {
        self.max_body_length
    }

    /// Whether packets with the `UNENCRYPTED` flag are accepted.
    pub fn allow_unencrypted(&self) -> bool {
        self.allow_unencrypted
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        ConfigBuilder::new().build()
    }
}

/// Builder for [`SessionConfig`] objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigBuilder {
    read_timeout: Duration,
    max_body_length: u32,
    allow_unencrypted: bool,
    password_prompt: String,
    username_prompt: String,
}

impl ConfigBuilder {
    /// Creates a new builder with default values for the various fields.
    pub fn new() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
            max_body_length: MAX_AUTHENTICATION_BODY_LENGTH,
            allow_unencrypted: false,
            password_prompt: String::from("Password: "),
            username_prompt: String::from("Username: "),
        }
    }

    /// Sets how long a session waits for each client packet.
    pub fn read_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the largest packet body accepted from a client.
    pub fn max_body_length(&mut self, length: u32) -> &mut Self {
        self.max_body_length = length;
        self
    }

    /// Sets whether packets with cleartext bodies are accepted.
    ///
    /// RFC8907 says unobfuscated packets MUST NOT be used in production, so this is off by default.
    pub fn allow_unencrypted(&mut self, allow: bool) -> &mut Self {
        self.allow_unencrypted = allow;
        self
    }

    /// Sets the prompt sent along with a GETPASS reply.
    pub fn password_prompt(&mut self, prompt: String) -> &mut Self {
        self.password_prompt = prompt;
        self
    }

    /// Sets the prompt sent along with a GETUSER reply.
    pub fn username_prompt(&mut self, prompt: String) -> &mut Self {
        self.username_prompt = prompt;
        self
    }

    /// Turns this builder into a [`SessionConfig`].
    pub fn build(&self) -> SessionConfig {
        SessionConfig {
            read_timeout: self.read_timeout,
            max_body_length: self.max_body_length,
            allow_unencrypted: self.allow_unencrypted,
            password_prompt: self.password_prompt.clone(),
            username_prompt: self.username_prompt.clone(),
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

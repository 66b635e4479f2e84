use std::collections::HashMap;

use thiserror::Error;

/// The decision reached by a [`CredentialValidator`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Verdict {
    /// The credentials are valid.
    Pass,
    /// The credentials are not valid.
    Fail,
}

/// An internal failure of a credential backend.
///
/// This is reported to the client as an ERROR status, without any of the details.
#[derive(Debug, Error)]
#[error("credential validation failed: {message}")]
pub struct ValidatorError {
    message: String,
}

impl ValidatorError {
    /// Creates an error with a description of what went wrong, for logging.
    pub fn new<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Checks the credentials a client collected from a user.
///
/// Usernames and passwords are passed through as received; TACACS+ does not specify an
/// encoding for them.
pub trait CredentialValidator: Send + Sync {
    /// Decides whether `password` is correct for `user`.
    fn validate(&self, user: &[u8], password: &[u8]) -> Result<Verdict, ValidatorError>;
}

/// A fixed set of username/password pairs held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    users: HashMap<Vec<u8>, Vec<u8>>,
}

impl StaticCredentials {
    /// Creates a validator without any users, which fails every attempt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user, replacing the password of an existing one.
    pub fn add_user<U: Into<Vec<u8>>, P: Into<Vec<u8>>>(&mut self, user: U, password: P) -> &mut Self {
        self.users.insert(user.into(), password.into());
        self
    }
}

impl CredentialValidator for StaticCredentials {
    fn validate(&self, user: &[u8], password: &[u8]) -> Result<Verdict, ValidatorError> {
        let verdict = match self.users.get(user) {
            Some(expected) if expected.as_slice() == password => Verdict::Pass,
            _ => Verdict::Fail,
        };

        Ok(verdict)
    }
}

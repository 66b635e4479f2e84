use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

/// A shared secret used to obfuscate packet bodies exchanged with a client.
///
/// [RFC8907 section 10.5.1] specifies that secret keys SHOULD be at least 16 characters long;
/// that is left to whoever provisions them.
///
/// [RFC8907 section 10.5.1]: https://www.rfc-editor.org/rfc/rfc8907.html#section-10.5.1
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    /// Wraps some bytes as a shared secret.
    pub fn new<K: Into<Vec<u8>>>(key: K) -> Self {
        Self(key.into())
    }
}

impl AsRef<[u8]> for SharedSecret {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// secrets never end up in logs
impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedSecret").field(&"<redacted>").finish()
    }
}

/// Resolves the shared secret for a connecting client.
///
/// Implementations are shared between all sessions of a [`Server`](super::Server), so lookups
/// must be safe to perform concurrently.
pub trait KeyLookup: Send + Sync {
    /// Returns the shared secret configured for `peer`, or `None` if there isn't one.
    ///
    /// A missing secret ends the session; there is no fallback to an empty key.
    fn resolve_secret(&self, peer: IpAddr) -> Option<SharedSecret>;
}

/// An in-memory table of per-client secrets with an optional catch-all.
#[derive(Debug, Clone, Default)]
pub struct KeyTable {
    secrets: HashMap<IpAddr, SharedSecret>,
    default_secret: Option<SharedSecret>,
}

impl KeyTable {
    /// Creates an empty table, which resolves no secrets at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table which resolves the same secret for every client.
    pub fn with_default<K: Into<Vec<u8>>>(secret: K) -> Self {
        Self {
            secrets: HashMap::new(),
            default_secret: Some(SharedSecret::new(secret)),
        }
    }

    /// Configures the secret for a single client address, replacing any existing one.
    pub fn insert<K: Into<Vec<u8>>>(&mut self, peer: IpAddr, secret: K) -> &mut Self {
        self.secrets.insert(peer, SharedSecret::new(secret));
        self
    }
}

impl KeyLookup for KeyTable {
    fn resolve_secret(&self, peer: IpAddr) -> Option<SharedSecret> {
        self.secrets
            .get(&peer)
            .or(self.default_secret.as_ref())
            .cloned()
    }
}

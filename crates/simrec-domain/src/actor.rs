//! Actor module - who produced a score
//!
//! The core only ever sees [`ActorKey`] strings. An [`Actor`] is the form a
//! caller hands in at the boundary; [`Actor::resolve`] turns it into a key
//! once, before anything touches the store.

use std::fmt;

/// Stable string identity of an actor
///
/// Authenticated users map to `user:<id>`, anonymous sessions to their
/// session token, and anything else is used verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActorKey(String);

impl ActorKey {
    /// Wrap a raw key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key for an authenticated user
    pub fn user(id: i64) -> Self {
        Self(format!("user:{}", id))
    }

    /// Borrow the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// An actor as seen at the edge of the system
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// Authenticated user with a primary key
    User(i64),

    /// Anonymous visitor, identified by a session token once one exists
    Session(Option<String>),

    /// Caller-chosen key, used as-is
    Key(String),
}

/// Failure to derive a stable key for an actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Anonymous session has not been assigned a token yet
    MissingSessionKey,
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::MissingSessionKey => write!(
                f,
                "Can't track score: anonymous actor has no session key. \
                 The session must be saved before the first score is recorded."
            ),
        }
    }
}

impl std::error::Error for IdentityError {}

impl Actor {
    /// Resolve this actor to its stable key
    ///
    /// # Examples
    ///
    /// ```
    /// use simrec_domain::{Actor, ActorKey};
    ///
    /// assert_eq!(Actor::User(30).resolve().unwrap(), ActorKey::new("user:30"));
    /// assert_eq!(Actor::Key("qwerty".into()).resolve().unwrap(), ActorKey::new("qwerty"));
    /// assert!(Actor::Session(None).resolve().is_err());
    /// ```
    pub fn resolve(&self) -> Result<ActorKey, IdentityError> {
        match self {
            Actor::User(id) => Ok(ActorKey::user(*id)),
            Actor::Session(Some(token)) if !token.is_empty() => Ok(ActorKey::new(token.clone())),
            Actor::Session(_) => Err(IdentityError::MissingSessionKey),
            Actor::Key(key) => Ok(ActorKey::new(key.clone())),
        }
    }

    /// Parse the command-line form: `user:<id>`, `session:<token>` or a bare key
    pub fn parse(s: &str) -> Result<Self, String> {
        if let Some(id) = s.strip_prefix("user:") {
            let id = id
                .parse::<i64>()
                .map_err(|e| format!("Invalid user id in '{}': {}", s, e))?;
            return Ok(Actor::User(id));
        }

        if let Some(token) = s.strip_prefix("session:") {
            let token = (!token.is_empty()).then(|| token.to_string());
            return Ok(Actor::Session(token));
        }

        if s.is_empty() {
            return Err("Actor key cannot be empty".to_string());
        }

        Ok(Actor::Key(s.to_string()))
    }
}

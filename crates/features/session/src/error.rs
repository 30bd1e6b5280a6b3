use keeper_database::StorageError;
use keeper_vault::VaultError;
use std::borrow::Cow;

/// Failure of the transport halves behind [`TransportStream`](crate::TransportStream) and
/// [`TransportSink`](crate::TransportSink).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection failed or was reset.
    #[error("Transport I/O error{}: {message}", format_context(.context))]
    Io { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The peer sent a frame that is not a command envelope.
    #[error("Transport protocol error{}: {message}", format_context(.context))]
    Protocol { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// A specialized [`SessionError`] enum of this crate.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection is gone; the session is deregistered.
    #[error("Session transport error{}: {source}", format_context(.context))]
    Transport {
        #[source]
        source: TransportError,
        context: Option<Cow<'static, str>>,
    },

    /// Malformed user input (wrong field count, empty title, empty username).
    #[error("Session format error{}: {message}", format_context(.context))]
    Format { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The record codec failed.
    #[error("Session crypto error{}: {source}", format_context(.context))]
    Crypto {
        #[source]
        source: VaultError,
        context: Option<Cow<'static, str>>,
    },

    /// A uniqueness rule was violated (duplicate title or client id).
    #[error("Session conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The requested record does not exist.
    #[error("Session lookup failed{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Any other storage failure.
    #[error("Session storage error{}: {source}", format_context(.context))]
    Storage {
        #[source]
        source: StorageError,
        context: Option<Cow<'static, str>>,
    },

    /// Internal fallback for broken invariants.
    #[error("Internal session error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl TransportError {
    /// A malformed frame leaves the connection usable; an I/O failure does not.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }
}

impl SessionError {
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    #[must_use]
    pub const fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<TransportError> for SessionError {
    fn from(source: TransportError) -> Self {
        Self::Transport { source, context: None }
    }
}

impl From<VaultError> for SessionError {
    fn from(source: VaultError) -> Self {
        match source {
            VaultError::Format { message, context } => Self::Format { message, context },
            source => Self::Crypto { source, context: None },
        }
    }
}

impl From<StorageError> for SessionError {
    fn from(source: StorageError) -> Self {
        match source {
            StorageError::Conflict { message, context } => Self::Conflict { message, context },
            StorageError::NotFound { message, context } => Self::NotFound { message, context },
            source => Self::Storage { source, context: None },
        }
    }
}

pub trait SessionErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, SessionError>;
}

impl<T> SessionErrorExt<T> for Result<T, SessionError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                SessionError::Transport { context: c, .. }
                | SessionError::Format { context: c, .. }
                | SessionError::Crypto { context: c, .. }
                | SessionError::Conflict { context: c, .. }
                | SessionError::NotFound { context: c, .. }
                | SessionError::Storage { context: c, .. }
                | SessionError::Internal { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

impl<T> SessionErrorExt<T> for Result<T, StorageError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, SessionError> {
        self.map_err(SessionError::from).context(context)
    }
}

impl<T> SessionErrorExt<T> for Result<T, VaultError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, SessionError> {
        self.map_err(SessionError::from).context(context)
    }
}

impl<T> SessionErrorExt<T> for Result<T, TransportError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, SessionError> {
        self.map_err(SessionError::from).context(context)
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

use keeper_database::StorageError;
use std::borrow::Cow;

/// A specialized [`IdentityError`] enum of this crate.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The username is taken.
    #[error("Identity conflict{}: {message}", format_context(.context))]
    AlreadyExists { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Unknown username or wrong password.
    #[error("Identity auth error{}: {message}", format_context(.context))]
    Unauthenticated { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Blank username or password.
    #[error("Identity validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Storage failures other than a taken username.
    #[error("Internal identity error{}: {source}", format_context(.context))]
    Internal {
        #[source]
        source: StorageError,
        context: Option<Cow<'static, str>>,
    },
}

impl From<StorageError> for IdentityError {
    fn from(source: StorageError) -> Self {
        match source {
            StorageError::Conflict { message, context } => Self::AlreadyExists { message, context },
            source => Self::Internal { source, context: None },
        }
    }
}

pub trait IdentityErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, IdentityError>;
}

impl<T> IdentityErrorExt<T> for Result<T, IdentityError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                IdentityError::AlreadyExists { context: c, .. }
                | IdentityError::Unauthenticated { context: c, .. }
                | IdentityError::Validation { context: c, .. }
                | IdentityError::Internal { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

impl<T> IdentityErrorExt<T> for Result<T, StorageError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, IdentityError> {
        self.map_err(IdentityError::from).context(context)
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

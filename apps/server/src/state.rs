use axum::extract::FromRef;
use keeper_database::SurrealStorage;
use keeper_domain::config::ApiConfig;
use keeper_identity::IdentityService;
use keeper_kernel::Shutdown;
use keeper_session::SessionEngine;
use std::borrow::Cow;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, thiserror::Error)]
pub enum ApiStateError {
    #[error("State validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

#[derive(Debug)]
pub struct ApiStateInner {
    pub config: ApiConfig,
    pub identity: IdentityService<SurrealStorage>,
    pub engine: Arc<SessionEngine<SurrealStorage>>,
    pub shutdown: Shutdown,
    pub started: Instant,
}

/// Shared handler state. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiState {
    inner: Arc<ApiStateInner>,
}

impl ApiState {
    #[must_use]
    pub fn builder() -> ApiStateBuilder {
        ApiStateBuilder::default()
    }

    /// Number of live command sessions in this process.
    #[must_use]
    pub fn sessions(&self) -> usize {
        self.inner.engine.registry().len()
    }
}

impl Deref for ApiState {
    type Target = ApiStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FromRef<ApiState> for ApiConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.config.clone()
    }
}

impl FromRef<ApiState> for Shutdown {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.shutdown.clone()
    }
}

#[derive(Debug, Default)]
pub struct ApiStateBuilder {
    config: Option<ApiConfig>,
    identity: Option<IdentityService<SurrealStorage>>,
    engine: Option<Arc<SessionEngine<SurrealStorage>>>,
    shutdown: Option<Shutdown>,
}

impl ApiStateBuilder {
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn identity(mut self, identity: IdentityService<SurrealStorage>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn engine(mut self, engine: Arc<SessionEngine<SurrealStorage>>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn build(self) -> Result<ApiState, ApiStateError> {
        let config = self.config.unwrap_or_default();
        let identity = self.identity.ok_or_else(|| ApiStateError::Validation {
            message: "IdentityService not provided".into(),
            context: None,
        })?;
        let engine = self.engine.ok_or_else(|| ApiStateError::Validation {
            message: "SessionEngine not provided".into(),
            context: None,
        })?;
        let shutdown = self.shutdown.unwrap_or_default();

        Ok(ApiState {
            inner: Arc::new(ApiStateInner {
                config,
                identity,
                engine,
                shutdown,
                started: Instant::now(),
            }),
        })
    }
}

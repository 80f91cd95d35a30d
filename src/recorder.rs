//! Recording and replaying HTTP client
//!
//! [`HttpRecorder`] sits between the caller and a [`Transport`]. Depending on
//! its [`Mode`] it forwards requests and appends them to an interaction,
//! answers them from a stored interaction, or stays out of the way.

use std::sync::{PoisonError, RwLock};
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{Mode, RecorderConfig};
use crate::interaction::{HttpRequest, HttpResponse, Interaction, InteractionMessage, InteractionTimings};
use crate::matching::{RequestMatcher, RulesMatcher};
use crate::repository::{HarRepository, InteractionRepository};
use crate::transport::{HyperTransport, Transport};
use crate::{HartapeError, Result};

/// Interaction state guarded by the recorder lock
#[derive(Debug, Default)]
struct State {
    /// Interaction as last loaded or stored
    interaction: Option<Interaction>,
    /// Messages still available for replay
    pool: Option<Vec<InteractionMessage>>,
}

/// HTTP client that records to and replays from an interaction
///
/// All non-passthrough requests on one recorder are serialized, so it can be
/// shared between tasks behind an `Arc`.
pub struct HttpRecorder<T = HyperTransport, R = HarRepository> {
    name: String,
    mode: RwLock<Mode>,
    transport: T,
    matcher: Box<dyn RequestMatcher>,
    repository: R,
    state: Mutex<State>,
}

impl HttpRecorder {
    /// Recorder for `interaction_name` in [`Mode::Auto`] with default
    /// transport, matcher and repository
    pub fn new(interaction_name: impl Into<String>) -> Self {
        Self {
            name: interaction_name.into(),
            mode: RwLock::new(Mode::default()),
            transport: HyperTransport::new(),
            matcher: Box::new(RulesMatcher::default()),
            repository: HarRepository::new(),
            state: Mutex::new(State::default()),
        }
    }

    /// Recorder built from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid
    pub fn from_config(config: &RecorderConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self::new(config.interaction.clone())
            .with_mode(config.mode)
            .with_matcher(config.matcher.build())
            .with_repository(HarRepository::with_settings(config.archive.clone())))
    }
}

impl<T, R> HttpRecorder<T, R>
where
    T: Transport,
    R: InteractionRepository,
{
    /// Set the initial mode
    #[must_use]
    pub fn with_mode(self, mode: Mode) -> Self {
        self.set_mode(mode);
        self
    }

    /// Replace the transport
    pub fn with_transport<U: Transport>(self, transport: U) -> HttpRecorder<U, R> {
        HttpRecorder {
            name: self.name,
            mode: self.mode,
            transport,
            matcher: self.matcher,
            repository: self.repository,
            state: self.state,
        }
    }

    /// Replace the matcher
    #[must_use]
    pub fn with_matcher<M>(mut self, matcher: M) -> Self
    where
        M: RequestMatcher + 'static,
    {
        self.matcher = Box::new(matcher);
        self
    }

    /// Replace the repository
    pub fn with_repository<S: InteractionRepository>(self, repository: S) -> HttpRecorder<T, S> {
        HttpRecorder {
            name: self.name,
            mode: self.mode,
            transport: self.transport,
            matcher: self.matcher,
            repository,
            state: self.state,
        }
    }

    /// Interaction name
    pub fn interaction_name(&self) -> &str {
        &self.name
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        *self.mode.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the mode for subsequent requests
    pub fn set_mode(&self, mode: Mode) {
        *self.mode.write().unwrap_or_else(PoisonError::into_inner) = mode;
    }

    /// Send a request according to the current mode
    ///
    /// The mode is read again once the recorder lock is held. Dropping the
    /// returned future abandons the request without changing the recorder's
    /// state.
    ///
    /// # Errors
    ///
    /// - `NoMatchFound` if replaying and no recorded message matches
    /// - `RepositoryFailure` if the interaction cannot be loaded or stored
    /// - `Transport` if the real call fails
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mode = self.mode();
        if mode.is_passthrough() {
            return self.transport.send(request).await;
        }

        let mut state = self.state.lock().await;

        // The mode may have changed while waiting for the lock.
        let mode = match self.mode() {
            Mode::Passthrough => {
                drop(state);
                return self.transport.send(request).await;
            }
            Mode::Auto => self.resolve_auto().await?,
            mode => mode,
        };

        let response = if mode.is_replay() {
            self.replay(&mut state, &request).await?
        } else {
            self.record(&mut state, request).await?
        };

        Ok(response.into_buffered())
    }

    /// Send a request, giving up as soon as `token` is cancelled
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` if the token fires first, otherwise the errors of
    /// [`send`](Self::send)
    pub async fn send_with_cancellation(
        &self,
        request: HttpRequest,
        token: &CancellationToken,
    ) -> Result<HttpResponse> {
        tokio::select! {
            biased;
            () = token.cancelled() => {
                debug!("Request to {} cancelled", self.name);
                Err(HartapeError::Cancelled)
            }
            result = self.send(request) => result,
        }
    }

    async fn resolve_auto(&self) -> Result<Mode> {
        let mode = if self.repository.exists(&self.name).await? {
            Mode::Replay
        } else {
            Mode::Record
        };
        debug!("Auto mode resolved to {mode} for {}", self.name);
        Ok(mode)
    }

    async fn replay(&self, state: &mut State, request: &HttpRequest) -> Result<HttpResponse> {
        if state.interaction.is_none() {
            let interaction = self.repository.load(&self.name).await?;
            info!(
                "Loaded interaction {} ({} messages)",
                self.name,
                interaction.len()
            );
            state.interaction = Some(interaction);
        }

        let State { interaction, pool } = state;
        let pool = pool.get_or_insert_with(|| {
            interaction
                .as_ref()
                .map(|interaction| interaction.messages.clone())
                .unwrap_or_default()
        });

        match self.matcher.find_match(request, pool) {
            Some(message) => {
                debug!("Replaying {} {}", request.method, request.uri);
                Ok(message.response)
            }
            None => {
                warn!(
                    "No recorded message for {} {} in {}",
                    request.method, request.uri, self.name
                );
                Err(HartapeError::NoMatchFound {
                    method: request.method.clone(),
                    url: request.uri.to_string(),
                })
            }
        }
    }

    async fn record(&self, state: &mut State, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method.clone();
        let uri = request.uri.clone();

        let started_at = Utc::now();
        let start = Instant::now();
        let response = self.transport.send(request).await?;
        let timings = InteractionTimings::new(started_at, start.elapsed());

        let mut interaction = state
            .interaction
            .clone()
            .unwrap_or_else(|| Interaction::new(self.name.clone()));
        interaction
            .messages
            .push(InteractionMessage::new(response, timings));

        let stored = self.repository.store(&interaction).await?;
        let message = stored
            .messages
            .last()
            .cloned()
            .ok_or_else(|| HartapeError::repository(&self.name, "store returned no messages"))?;

        info!(
            "Recorded {method} {uri} into {} ({} messages)",
            self.name,
            stored.len()
        );

        if let Some(pool) = state.pool.as_mut() {
            pool.push(message.clone());
        }
        state.interaction = Some(stored);

        Ok(message.response)
    }
}

impl<T, R> std::fmt::Debug for HttpRecorder<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRecorder")
            .field("name", &self.name)
            .field("mode", &*self.mode.read().unwrap_or_else(PoisonError::into_inner))
            .finish_non_exhaustive()
    }
}

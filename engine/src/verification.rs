//! One-shot credential verification polled from a cooperative loop.
//!
//! The blocking check runs on Tokio's blocking pool. The owning loop calls
//! [`VerificationFlow::poll`] on its own timer: each tick advances the loading
//! animation, and once the worker reports finished the result is read without
//! blocking and the flow settles.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Credentials and the match the user asks to be authorized for.
#[derive(Clone)]
pub struct VerificationRequest {
    pub username: String,
    pub password: String,
    pub match_id: String,
}

impl fmt::Debug for VerificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("match_id", &self.match_id)
            .finish()
    }
}

/// The verifier could not reach a verdict.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct VerifierError {
    message: String,
}

impl VerifierError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// External service that decides whether a user may act on a match.
///
/// Called on a blocking worker; implementations may block freely.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, request: &VerificationRequest) -> Result<bool, VerifierError>;
}

#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("username and password are required")]
    EmptyCredentials,
    #[error("the entered user does not have the required permissions")]
    NotPermitted,
    #[error("credential check failed: {0}")]
    Unavailable(#[source] VerifierError),
    #[error("credential check stopped unexpectedly: {0}")]
    WorkerPanicked(String),
}

/// Cyclic frame index for the loading indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadingAnimation {
    frame: usize,
    frame_count: usize,
}

impl LoadingAnimation {
    #[must_use]
    pub fn new(frame_count: usize) -> Self {
        Self {
            frame: 0,
            frame_count: frame_count.max(1),
        }
    }

    #[must_use]
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Returns the frame to show now and moves to the next one.
    pub fn advance(&mut self) -> usize {
        let shown = self.frame;
        self.frame = (self.frame + 1) % self.frame_count;
        shown
    }
}

type VerifyResult = Result<bool, VerifierError>;

#[derive(Debug)]
enum FlowState {
    Editing,
    Verifying {
        handle: JoinHandle<VerifyResult>,
        animation: LoadingAnimation,
    },
    Authorized,
}

/// What one poll observed.
#[derive(Debug)]
pub enum PollOutcome {
    /// Not verifying: nothing submitted yet, or already settled.
    Idle,
    Pending { frame: usize },
    Authorized,
    Failed(AuthFailure),
}

/// Credential dialog state: inputs, the in-flight worker, and the verdict.
pub struct VerificationFlow {
    runtime: Handle,
    verifier: Arc<dyn CredentialVerifier>,
    match_id: String,
    username: String,
    password: String,
    frame_count: usize,
    state: FlowState,
}

impl VerificationFlow {
    pub fn new(
        runtime: Handle,
        verifier: Arc<dyn CredentialVerifier>,
        match_id: impl Into<String>,
        frame_count: usize,
    ) -> Self {
        Self {
            runtime,
            verifier,
            match_id: match_id.into(),
            username: String::new(),
            password: String::new(),
            frame_count,
            state: FlowState::Editing,
        }
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password_is_empty(&self) -> bool {
        self.password.is_empty()
    }

    #[must_use]
    pub fn is_verifying(&self) -> bool {
        matches!(self.state, FlowState::Verifying { .. })
    }

    #[must_use]
    pub fn is_authorized(&self) -> bool {
        matches!(self.state, FlowState::Authorized)
    }

    /// Starts the background check.
    ///
    /// Empty inputs are rejected without starting a worker and are kept as
    /// entered. Submitting while a check is running, or after success, does
    /// nothing.
    pub fn submit(&mut self) -> Result<(), AuthFailure> {
        match self.state {
            FlowState::Verifying { .. } => {
                tracing::debug!("Verification already running; ignoring submit");
                return Ok(());
            }
            FlowState::Authorized => return Ok(()),
            FlowState::Editing => {}
        }
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(AuthFailure::EmptyCredentials);
        }

        let request = VerificationRequest {
            username: self.username.clone(),
            password: self.password.clone(),
            match_id: self.match_id.clone(),
        };
        let verifier = Arc::clone(&self.verifier);
        let handle = self
            .runtime
            .spawn_blocking(move || verifier.verify(&request));

        tracing::info!(match_id = %self.match_id, username = %self.username, "Started credential check");
        self.state = FlowState::Verifying {
            handle,
            animation: LoadingAnimation::new(self.frame_count),
        };
        Ok(())
    }

    /// One timer tick.
    pub fn poll(&mut self) -> PollOutcome {
        let finished = match &mut self.state {
            FlowState::Verifying { handle, animation } => {
                if !handle.is_finished() {
                    return PollOutcome::Pending {
                        frame: animation.advance(),
                    };
                }
                true
            }
            FlowState::Editing | FlowState::Authorized => false,
        };
        if !finished {
            return PollOutcome::Idle;
        }

        let (mut handle, animation) = match std::mem::replace(&mut self.state, FlowState::Editing) {
            FlowState::Verifying { handle, animation } => (handle, animation),
            other => {
                self.state = other;
                return PollOutcome::Idle;
            }
        };

        let result = (&mut handle).now_or_never();
        match result {
            None => {
                // Edge-case: is_finished() was true but the join handle isn't ready yet
                let frame = animation.frame();
                self.state = FlowState::Verifying { handle, animation };
                PollOutcome::Pending { frame }
            }
            Some(Ok(Ok(true))) => {
                tracing::info!(match_id = %self.match_id, "Credential check passed");
                self.state = FlowState::Authorized;
                PollOutcome::Authorized
            }
            Some(Ok(Ok(false))) => self.fail(AuthFailure::NotPermitted),
            Some(Ok(Err(err))) => self.fail(AuthFailure::Unavailable(err)),
            Some(Err(join_err)) => self.fail(AuthFailure::WorkerPanicked(join_err.to_string())),
        }
    }

    fn fail(&mut self, failure: AuthFailure) -> PollOutcome {
        tracing::warn!(match_id = %self.match_id, "Credential check failed: {failure}");
        self.username.clear();
        self.password.clear();
        self.state = FlowState::Editing;
        PollOutcome::Failed(failure)
    }

    /// Closes the dialog and reports whether it was authorized.
    ///
    /// A running worker is detached, not stopped: it finishes on its own and
    /// its result is discarded.
    #[must_use]
    pub fn close(self) -> bool {
        if self.is_verifying() {
            tracing::debug!("Closing with verification in flight; worker left to finish");
        }
        self.is_authorized()
    }
}

impl fmt::Debug for VerificationFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationFlow")
            .field("match_id", &self.match_id)
            .field("username", &self.username)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Polls `flow` every `interval` until it settles, reporting each pending
/// animation frame to `on_frame`. Returns [`PollOutcome::Idle`] at once if
/// nothing was submitted.
pub async fn drive(
    flow: &mut VerificationFlow,
    interval: Duration,
    mut on_frame: impl FnMut(usize),
) -> PollOutcome {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match flow.poll() {
            PollOutcome::Pending { frame } => on_frame(frame),
            settled => return settled,
        }
    }
}

//! Credential checks driven from an async caller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use transcript_engine::{
    AuthFailure, CredentialVerifier, PollOutcome, VerificationFlow, VerificationRequest,
    VerifierError, drive,
};

/// Takes a while, then accepts one fixed password.
struct SlowVerifier {
    delay: Duration,
    finished: AtomicBool,
}

impl SlowVerifier {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            finished: AtomicBool::new(false),
        })
    }
}

impl CredentialVerifier for SlowVerifier {
    fn verify(&self, request: &VerificationRequest) -> Result<bool, VerifierError> {
        std::thread::sleep(self.delay);
        self.finished.store(true, Ordering::SeqCst);
        Ok(request.password == "letmein")
    }
}

fn flow(verifier: Arc<dyn CredentialVerifier>, password: &str) -> VerificationFlow {
    let mut flow =
        VerificationFlow::new(tokio::runtime::Handle::current(), verifier, "final-2024", 4);
    flow.set_username("referee");
    flow.set_password(password);
    flow
}

#[tokio::test]
async fn slow_check_animates_until_it_settles() {
    let verifier = SlowVerifier::new(Duration::from_millis(80));
    let mut flow = flow(verifier.clone(), "letmein");
    flow.submit().unwrap();

    let mut frames = Vec::new();
    let outcome = drive(&mut flow, Duration::from_millis(5), |frame| frames.push(frame)).await;

    assert!(matches!(outcome, PollOutcome::Authorized));
    assert!(verifier.finished.load(Ordering::SeqCst));
    assert!(frames.len() >= 2, "expected several frames, got {frames:?}");
    assert!(frames.iter().all(|&frame| frame < 4));
    assert_eq!(frames[0], 0);
    assert_eq!(frames[1], 1);
    assert!(flow.close());
}

#[tokio::test]
async fn refusal_clears_inputs_and_allows_retry() {
    let verifier = SlowVerifier::new(Duration::from_millis(10));
    let mut flow = flow(verifier, "wrong");
    flow.submit().unwrap();

    let outcome = drive(&mut flow, Duration::from_millis(2), |_| {}).await;
    assert!(matches!(outcome, PollOutcome::Failed(AuthFailure::NotPermitted)));
    assert!(flow.username().is_empty());
    assert!(flow.password_is_empty());
    assert!(matches!(flow.submit(), Err(AuthFailure::EmptyCredentials)));

    flow.set_username("referee");
    flow.set_password("letmein");
    flow.submit().unwrap();
    let retry = drive(&mut flow, Duration::from_millis(2), |_| {}).await;
    assert!(matches!(retry, PollOutcome::Authorized));
}

#[tokio::test]
async fn closing_mid_check_detaches_the_worker() {
    let verifier = SlowVerifier::new(Duration::from_millis(30));
    let mut flow = flow(verifier.clone(), "letmein");
    flow.submit().unwrap();
    assert!(flow.is_verifying());
    assert!(!flow.close());

    // The worker still runs to completion on the blocking pool.
    for _ in 0..200 {
        if verifier.finished.load(Ordering::SeqCst) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(verifier.finished.load(Ordering::SeqCst));
}

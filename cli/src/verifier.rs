use std::io::Write;
use std::process::{Command, Stdio};

use transcript_engine::{CredentialVerifier, VerificationRequest, VerifierError};

/// Delegates the credential decision to an external program.
///
/// The program receives `<args...> <username> <match-id>` and the password on
/// stdin. Exit status 0 means the user is permitted; any other status means
/// refused.
#[derive(Debug, Clone)]
pub struct CommandVerifier {
    program: String,
    args: Vec<String>,
}

impl CommandVerifier {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl CredentialVerifier for CommandVerifier {
    fn verify(&self, request: &VerificationRequest) -> Result<bool, VerifierError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(&request.username)
            .arg(&request.match_id)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| VerifierError::new(format!("could not start {}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A verifier that exits without reading stdin closes the pipe early.
            if let Err(e) = writeln!(stdin, "{}", request.password) {
                tracing::debug!("Verifier did not read the password: {e}");
            }
        }

        let status = child
            .wait()
            .map_err(|e| VerifierError::new(format!("verifier {} failed: {e}", self.program)))?;
        tracing::debug!(program = %self.program, code = ?status.code(), "Verifier exited");

        match status.code() {
            Some(0) => Ok(true),
            Some(_) => Ok(false),
            None => Err(VerifierError::new(format!(
                "verifier {} was terminated by a signal",
                self.program
            ))),
        }
    }
}

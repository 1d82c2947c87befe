//! Post-connect handshake stage.
//!
//! The `Register` message itself is written by the session facade before the
//! I/O task starts, so the transport is never open without the handshake
//! having been initiated. This stage tracks the asynchronous server side of
//! the exchange.

use log::{debug, info};

use crate::{
    message::{ClientVersion, Envelope, Severity},
    stage::{Flow, Stage, StageContext, StageError},
};

/// Handshake progress for one connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistrationState {
    /// Register sent; acknowledgment outstanding.
    Pending,
    /// The server confirmed the registration.
    Acknowledged,
    /// The connection closed before the server confirmed.
    Failed,
}

/// Consumes [`Envelope::RegisterAck`] and reports a handshake left pending
/// at teardown.
///
/// Registration is not a gate: other outbound traffic may flow while the
/// acknowledgment is outstanding.
#[derive(Debug)]
pub struct RegistrationStage {
    username: String,
    version: ClientVersion,
    state: RegistrationState,
}

impl RegistrationStage {
    /// Create the stage in the pending state for an initiated handshake.
    #[must_use]
    pub fn new(username: String, version: ClientVersion) -> Self {
        Self {
            username,
            version,
            state: RegistrationState::Pending,
        }
    }

    /// Current handshake state.
    #[must_use]
    pub fn state(&self) -> &RegistrationState { &self.state }
}

impl Stage for RegistrationStage {
    fn name(&self) -> &'static str { "registration" }

    fn handle(&mut self, envelope: Envelope, _cx: &mut StageContext<'_>) -> Result<Flow, StageError> {
        match envelope {
            Envelope::RegisterAck => {
                if self.state == RegistrationState::Pending {
                    info!(
                        "registered as {} (client version {})",
                        self.username, self.version
                    );
                    self.state = RegistrationState::Acknowledged;
                } else {
                    debug!("ignoring register-ack in state {:?}", self.state);
                }
                Ok(Flow::Consumed)
            }
            other => Ok(Flow::Forward(other)),
        }
    }

    fn on_close(&mut self, cx: &mut StageContext<'_>) {
        if self.state == RegistrationState::Pending {
            self.state = RegistrationState::Failed;
            cx.events().on_error(
                "connection closed before registration was acknowledged",
                Severity::Error,
            );
        }
    }
}

//! Ordered inbound message pipeline.
//!
//! Every decoded envelope passes through the stages in a fixed, explicit
//! order; each stage either consumes the envelope or forwards it to the next
//! stage, and a full pass completes before the next envelope is dispatched.
//! The order is part of the protocol contract:
//!
//! 1. [`ping`](PingStage): consumes keep-alive probes; must run before any
//!    application stage so pings never surface as unhandled traffic.
//! 2. [`inform`](InformStage): consumes server notices and routes them to
//!    the error callback.
//! 3. [`registration`](RegistrationStage): consumes the handshake
//!    acknowledgment; must precede chat so no chat traffic is interpreted
//!    before the handshake variants are claimed.
//! 4. [`chat`](ChatStage): consumes join confirmations and chat deliveries,
//!    mutating only the membership table.
//! 5. [`broadcast`](BroadcastStage): consumes server-wide announcements,
//!    mutating only the broadcast log.
//!
//! Stages are synchronous and must not block the I/O task. A stage error is
//! caught at the pipeline boundary: it is logged and reported through the
//! error callback, and the connection survives. An envelope no stage claims
//! is dropped with a debug log.

mod broadcast;
mod chat;
mod inform;
mod ping;
mod registration;

pub use broadcast::BroadcastStage;
pub use chat::ChatStage;
pub use inform::InformStage;
pub use ping::PingStage;
pub use registration::{RegistrationStage, RegistrationState};

use log::{debug, error};

use crate::{
    events::SessionEvents,
    message::{Envelope, Severity},
};

/// Outcome of offering an envelope to one stage.
#[derive(Debug)]
pub enum Flow {
    /// The stage claimed the envelope; dispatch stops.
    Consumed,
    /// The envelope flows on to the next stage.
    Forward(Envelope),
}

/// Failure inside a single stage, caught at the pipeline boundary.
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {reason}")]
pub struct StageError {
    pub stage: &'static str,
    pub reason: String,
}

impl StageError {
    /// Build an error attributed to `stage`.
    #[must_use]
    pub fn new(stage: &'static str, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

/// Dispatch context handed to each stage.
///
/// Outbound envelopes queued here are written by the I/O task after the
/// current envelope has completed its pass; stages never write to the
/// transport directly.
pub struct StageContext<'a> {
    outbound: &'a mut Vec<Envelope>,
    events: &'a dyn SessionEvents,
}

impl<'a> StageContext<'a> {
    /// Create a context over an outbound queue and the application callbacks.
    pub fn new(outbound: &'a mut Vec<Envelope>, events: &'a dyn SessionEvents) -> Self {
        Self { outbound, events }
    }

    /// Queue an envelope for writing after the current dispatch pass.
    pub fn send(&mut self, envelope: Envelope) { self.outbound.push(envelope); }

    /// The application callback surface.
    #[must_use]
    pub fn events(&self) -> &dyn SessionEvents { self.events }
}

/// One named step of the pipeline.
pub trait Stage: Send {
    /// Stage name used in logs and error reports.
    fn name(&self) -> &'static str;

    /// Offer one envelope to this stage.
    ///
    /// # Errors
    ///
    /// A [`StageError`] is caught by [`Pipeline::dispatch`]; it never crashes
    /// the I/O task.
    fn handle(&mut self, envelope: Envelope, cx: &mut StageContext<'_>) -> Result<Flow, StageError>;

    /// Terminal teardown notice. The connection is closed; stages must not
    /// queue further writes.
    fn on_close(&mut self, _cx: &mut StageContext<'_>) {}
}

/// The ordered stage chain for one connection.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Build a pipeline from stages in dispatch order.
    #[must_use]
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self { Self { stages } }

    /// Run one envelope through the stages in order.
    ///
    /// Stage errors are logged, surfaced through
    /// [`SessionEvents::on_error`] and otherwise swallowed; an envelope that
    /// falls off the end of the chain is dropped with a debug log.
    pub fn dispatch(&mut self, envelope: Envelope, cx: &mut StageContext<'_>) {
        let mut current = envelope;
        for stage in &mut self.stages {
            match stage.handle(current, cx) {
                Ok(Flow::Consumed) => return,
                Ok(Flow::Forward(next)) => current = next,
                Err(err) => {
                    error!("{err}");
                    cx.events().on_error(&err.to_string(), Severity::Error);
                    return;
                }
            }
        }
        debug!("dropping unhandled {} message", current.kind());
    }

    /// Notify every stage that the connection has closed.
    pub fn notify_close(&mut self, cx: &mut StageContext<'_>) {
        for stage in &mut self.stages {
            stage.on_close(cx);
        }
    }
}

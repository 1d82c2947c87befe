//! Server announcement stage.

use std::sync::Arc;

use crate::{
    broadcast::BroadcastLog,
    message::Envelope,
    stage::{Flow, Stage, StageContext, StageError},
};

/// Appends [`Envelope::ServerBroadcast`] announcements to the shared log.
///
/// Runs last; it is the only writer of the log.
pub struct BroadcastStage {
    log: Arc<BroadcastLog>,
}

impl BroadcastStage {
    /// Create the stage over the shared announcement log.
    #[must_use]
    pub fn new(log: Arc<BroadcastLog>) -> Self { Self { log } }
}

impl Stage for BroadcastStage {
    fn name(&self) -> &'static str { "broadcast" }

    fn handle(&mut self, envelope: Envelope, _cx: &mut StageContext<'_>) -> Result<Flow, StageError> {
        match envelope {
            Envelope::ServerBroadcast { text } => {
                self.log.push(text);
                Ok(Flow::Consumed)
            }
            other => Ok(Flow::Forward(other)),
        }
    }
}

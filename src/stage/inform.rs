//! Server notice stage.

use crate::{
    message::Envelope,
    stage::{Flow, Stage, StageContext, StageError},
};

/// Routes [`Envelope::Inform`] notices to the application's error callback.
///
/// Informs carry their own severity; the stage passes it through unchanged.
#[derive(Debug, Default)]
pub struct InformStage;

impl InformStage {
    /// Create the stage.
    #[must_use]
    pub fn new() -> Self { Self }
}

impl Stage for InformStage {
    fn name(&self) -> &'static str { "inform" }

    fn handle(&mut self, envelope: Envelope, cx: &mut StageContext<'_>) -> Result<Flow, StageError> {
        match envelope {
            Envelope::Inform { text, severity } => {
                cx.events().on_error(&text, severity);
                Ok(Flow::Consumed)
            }
            other => Ok(Flow::Forward(other)),
        }
    }
}

//! Keep-alive probe stage.

use log::trace;

use crate::{
    message::Envelope,
    stage::{Flow, Stage, StageContext, StageError},
};

/// Consumes [`Envelope::Ping`] frames.
///
/// Liveness bookkeeping happens in the I/O task, which records every inbound
/// frame before dispatch; this stage only keeps probes from flowing into the
/// application stages. It runs first.
#[derive(Debug, Default)]
pub struct PingStage;

impl PingStage {
    /// Create the stage.
    #[must_use]
    pub fn new() -> Self { Self }
}

impl Stage for PingStage {
    fn name(&self) -> &'static str { "ping" }

    fn handle(&mut self, envelope: Envelope, _cx: &mut StageContext<'_>) -> Result<Flow, StageError> {
        match envelope {
            Envelope::Ping => {
                trace!("ping received");
                Ok(Flow::Consumed)
            }
            other => Ok(Flow::Forward(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullEvents;

    #[test]
    fn pings_are_consumed_everything_else_forwards() {
        let mut stage = PingStage::new();
        let mut outbound = Vec::new();
        let mut cx = StageContext::new(&mut outbound, &NullEvents);

        assert!(matches!(stage.handle(Envelope::Ping, &mut cx), Ok(Flow::Consumed)));
        assert!(matches!(
            stage.handle(Envelope::RegisterAck, &mut cx),
            Ok(Flow::Forward(Envelope::RegisterAck))
        ));
    }
}

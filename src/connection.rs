//! Connection I/O task.
//!
//! One task per session owns the framed stream, the idle monitor and the
//! stage pipeline. A biased `select!` loop observes, in order: the shutdown
//! token, the outbound queue fed by the facade, inbound frames, and the idle
//! timer. Inbound envelopes complete a full pipeline pass before the next
//! event is polled, so handler execution is strictly sequential and
//! arrival-ordered. Teardown runs exactly once, whatever ended the loop.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::{
    net::TcpStream,
    sync::mpsc,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::{
    codec::{Framed, LengthDelimitedCodec},
    sync::CancellationToken,
};

use crate::{
    codec,
    events::SessionEvents,
    heartbeat::{IdleEvent, IdleMonitor},
    message::{Envelope, Severity},
    stage::{Pipeline, StageContext},
};

/// What ended the I/O loop. Logged at teardown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CloseReason {
    Requested,
    PeerClosed,
    IdleTimeout,
    Malformed,
    Transport,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CloseReason::Requested => "disconnect requested",
            CloseReason::PeerClosed => "closed by server",
            CloseReason::IdleTimeout => "idle timeout",
            CloseReason::Malformed => "malformed message",
            CloseReason::Transport => "transport failure",
        };
        f.write_str(label)
    }
}

/// Timer granularity for idle polling. A quarter of the ping interval keeps
/// detection latency well under the configured bounds without busy-waking.
fn tick_period(ping_interval: Duration) -> Duration {
    (ping_interval / 4).max(Duration::from_millis(10))
}

/// Task driving all I/O for one connection.
pub(crate) struct ConnectionActor {
    framed: Framed<TcpStream, LengthDelimitedCodec>,
    outbound_rx: mpsc::Receiver<Envelope>,
    pipeline: Pipeline,
    monitor: IdleMonitor,
    shutdown: CancellationToken,
    connected: Arc<AtomicBool>,
    events: Arc<dyn SessionEvents>,
}

impl ConnectionActor {
    pub(crate) fn new(
        framed: Framed<TcpStream, LengthDelimitedCodec>,
        outbound_rx: mpsc::Receiver<Envelope>,
        pipeline: Pipeline,
        monitor: IdleMonitor,
        shutdown: CancellationToken,
        connected: Arc<AtomicBool>,
        events: Arc<dyn SessionEvents>,
    ) -> Self {
        Self {
            framed,
            outbound_rx,
            pipeline,
            monitor,
            shutdown,
            connected,
            events,
        }
    }

    /// Drive the connection until shutdown, peer close or a fatal failure.
    pub(crate) async fn run(self) {
        let Self {
            mut framed,
            mut outbound_rx,
            mut pipeline,
            mut monitor,
            shutdown,
            connected,
            events,
        } = self;

        let mut tick = time::interval(tick_period(monitor.ping_interval()));
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let reason = loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => break CloseReason::Requested,

                queued = outbound_rx.recv() => match queued {
                    Some(envelope) => {
                        if let Err(reason) =
                            write_envelope(&mut framed, &mut monitor, events.as_ref(), &envelope)
                                .await
                        {
                            break reason;
                        }
                    }
                    // The facade dropped its sender; treat like a disconnect.
                    None => break CloseReason::Requested,
                },

                frame = framed.next() => match frame {
                    Some(Ok(payload)) => {
                        monitor.record_read(Instant::now());
                        match codec::decode(&payload) {
                            Ok(envelope) => {
                                let mut queued = Vec::new();
                                let mut cx = StageContext::new(&mut queued, events.as_ref());
                                pipeline.dispatch(envelope, &mut cx);
                                let mut failed = None;
                                for envelope in queued {
                                    if let Err(reason) = write_envelope(
                                        &mut framed,
                                        &mut monitor,
                                        events.as_ref(),
                                        &envelope,
                                    )
                                    .await
                                    {
                                        failed = Some(reason);
                                        break;
                                    }
                                }
                                if let Some(reason) = failed {
                                    break reason;
                                }
                            }
                            Err(err) => {
                                error!("fatal decode failure: {err}");
                                events.on_error(
                                    &format!("malformed message from server: {err}"),
                                    Severity::Error,
                                );
                                break CloseReason::Malformed;
                            }
                        }
                    }
                    Some(Err(err)) => {
                        warn!("read failed: {err}");
                        events.on_error(&format!("connection error: {err}"), Severity::Error);
                        break CloseReason::Transport;
                    }
                    None => {
                        events.on_error("connection closed by server", Severity::Warning);
                        break CloseReason::PeerClosed;
                    }
                },

                _ = tick.tick() => match monitor.poll(Instant::now()) {
                    IdleEvent::Dead => {
                        let idle_timeout = monitor.idle_timeout();
                        events.on_error(
                            &format!(
                                "no traffic from server for {idle_timeout:?}; closing connection"
                            ),
                            Severity::Error,
                        );
                        break CloseReason::IdleTimeout;
                    }
                    IdleEvent::SendPing => {
                        if let Err(reason) =
                            write_envelope(&mut framed, &mut monitor, events.as_ref(), &Envelope::Ping)
                                .await
                        {
                            break reason;
                        }
                    }
                    IdleEvent::None => {}
                },
            }
        };

        info!("connection closed ({reason})");
        connected.store(false, Ordering::SeqCst);

        // Stages get one terminal notice; anything they try to queue now is
        // discarded because the transport is gone.
        let mut discarded = Vec::new();
        let mut cx = StageContext::new(&mut discarded, events.as_ref());
        pipeline.notify_close(&mut cx);
        if !discarded.is_empty() {
            debug!("discarding {} message(s) queued during teardown", discarded.len());
        }

        let _ = framed.close().await;
    }
}

/// Encode and write one envelope, updating the write-activity clock.
async fn write_envelope(
    framed: &mut Framed<TcpStream, LengthDelimitedCodec>,
    monitor: &mut IdleMonitor,
    events: &dyn SessionEvents,
    envelope: &Envelope,
) -> Result<(), CloseReason> {
    let bytes = match codec::encode(envelope) {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("{err}");
            events.on_error(
                &format!("failed to encode {} message: {err}", envelope.kind()),
                Severity::Error,
            );
            return Err(CloseReason::Malformed);
        }
    };
    if let Err(err) = framed.send(bytes).await {
        warn!("write failed: {err}");
        events.on_error(
            &format!("failed to send {} message: {err}", envelope.kind()),
            Severity::Error,
        );
        return Err(CloseReason::Transport);
    }
    monitor.record_write(Instant::now());
    Ok(())
}

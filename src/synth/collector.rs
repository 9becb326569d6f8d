//! Drains a live synthesis stream into one buffer under a deadline.

use crate::error::{Result, ToneTwistError};
use crate::synth::stream::{Attempt, ChunkStream, StreamEvent, SynthesisStream};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;

/// How a stream was stopped after a failed or abandoned collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Destroyed,
    Cancelled,
    InnerCancelled,
    /// Paused and/or detached; the producer may still be running.
    Detached,
    /// No termination capability worked.
    Unsupported,
}

/// Read every chunk of `stream`, in arrival order, within `timeout`.
///
/// Pull-based reading is preferred; event-based reading is the fallback.
/// On timeout or any read error the stream is terminated before the error
/// is returned, and the partial buffer is discarded.
pub async fn collect(stream: &mut dyn SynthesisStream, timeout: Duration) -> Result<Vec<u8>> {
    let kind = stream.kind();
    let outcome = tokio::time::timeout(timeout, drain(&mut *stream)).await;

    match outcome {
        Ok(Ok(buffer)) => {
            tracing::debug!(kind, bytes = buffer.len(), "Synthesis stream drained");
            Ok(buffer)
        }
        Ok(Err(error)) => {
            tracing::error!(kind, error = %error, "Synthesis stream failed");
            terminate(stream);
            Err(error)
        }
        Err(_) => {
            tracing::error!(kind, timeout_ms = timeout.as_millis() as u64, "Synthesis stream timed out");
            terminate(stream);
            Err(ToneTwistError::Timeout { timeout })
        }
    }
}

async fn drain(stream: &mut dyn SynthesisStream) -> Result<Vec<u8>> {
    if let Some(chunks) = stream.chunks() {
        return drain_chunks(chunks).await;
    }
    if let Some(events) = stream.take_events() {
        tracing::debug!("Stream is not iterable, falling back to events");
        return drain_events(events).await;
    }
    Err(ToneTwistError::Stream {
        message: format!(
            "{} stream supports neither chunk iteration nor events",
            stream.kind()
        ),
    })
}

async fn drain_chunks(chunks: &mut ChunkStream) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut count = 0usize;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(|e| ToneTwistError::Stream {
            message: e.to_string(),
        })?;
        buffer.extend_from_slice(&chunk);
        count += 1;
    }
    tracing::trace!(chunks = count, "Chunk iteration finished");
    Ok(buffer)
}

async fn drain_events(mut events: mpsc::Receiver<StreamEvent>) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    loop {
        match events.recv().await {
            Some(StreamEvent::Data(chunk)) => buffer.extend_from_slice(&chunk),
            Some(StreamEvent::Error(e)) => {
                return Err(ToneTwistError::Stream {
                    message: e.to_string(),
                });
            }
            Some(StreamEvent::End) => {
                tracing::trace!("End event received");
                return Ok(buffer);
            }
            // A dropped sender is an implicit close
            Some(StreamEvent::Close) | None => {
                tracing::trace!("Close event received");
                return Ok(buffer);
            }
        }
    }
}

/// Signal the stream to stop, trying capabilities in priority order.
///
/// The first capability that is present and succeeds ends the search.
/// Failures are logged and never propagated.
pub fn terminate(stream: &mut dyn SynthesisStream) -> Termination {
    let kind = stream.kind();

    if succeeded(stream.destroy(), kind, "destroy") {
        return Termination::Destroyed;
    }
    if succeeded(stream.cancel(), kind, "cancel") {
        return Termination::Cancelled;
    }
    if let Some(inner) = stream.inner_mut()
        && succeeded(inner.cancel(), kind, "inner cancel")
    {
        return Termination::InnerCancelled;
    }

    tracing::warn!(kind, "Stream has no destroy or cancel capability, pausing and detaching");
    let paused = succeeded(stream.pause(), kind, "pause");
    let detached = succeeded(stream.detach(), kind, "detach");
    if paused || detached {
        return Termination::Detached;
    }

    tracing::warn!(kind, "Could not terminate synthesis stream");
    Termination::Unsupported
}

fn succeeded(attempt: Attempt, kind: &'static str, capability: &'static str) -> bool {
    match attempt {
        Attempt::Unsupported => false,
        Attempt::Invoked(Ok(())) => {
            tracing::debug!(kind, capability, "Stream terminated");
            true
        }
        Attempt::Invoked(Err(e)) => {
            tracing::warn!(kind, capability, error = %e, "Stream termination failed");
            false
        }
    }
}

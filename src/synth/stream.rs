//! Live synthesis streams behind a narrow capability interface.
//!
//! Upstream clients hand back streams of different shapes: a pull-based
//! chunk stream, an event feed, or a wrapper around either. Each shape is
//! adapted to [`SynthesisStream`], which exposes what the collector needs
//! (a way to read, ways to stop) and reports everything else as unsupported.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::fmt;
use std::io;
use std::pin::Pin;
use tokio::sync::{mpsc, watch};
use tokio::task::AbortHandle;

/// Pull-based audio chunk source.
pub type ChunkStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Buffered events between the forwarding task and the reader.
const EVENT_BUFFER: usize = 32;

/// Push-style notification from an event-emitting stream.
#[derive(Debug)]
pub enum StreamEvent {
    Data(Bytes),
    Error(io::Error),
    End,
    Close,
}

/// Outcome of trying a termination capability.
#[derive(Debug)]
pub enum Attempt {
    /// The stream has no such capability.
    Unsupported,
    /// The capability exists and was invoked.
    Invoked(io::Result<()>),
}

impl Attempt {
    pub fn is_supported(&self) -> bool {
        matches!(self, Attempt::Invoked(_))
    }
}

/// Capability view of a live synthesis stream.
///
/// Every method defaults to "not supported"; adapters override what their
/// underlying shape can actually do.
pub trait SynthesisStream: Send {
    /// Pull-based reading.
    fn chunks(&mut self) -> Option<&mut ChunkStream> {
        None
    }

    /// Event-based reading. Yields the receiver at most once.
    fn take_events(&mut self) -> Option<mpsc::Receiver<StreamEvent>> {
        None
    }

    /// Tear the stream down, releasing the upstream connection.
    fn destroy(&mut self) -> Attempt {
        Attempt::Unsupported
    }

    /// Ask the producer to stop.
    fn cancel(&mut self) -> Attempt {
        Attempt::Unsupported
    }

    /// Wrapped stream, for wrappers that expose one.
    fn inner_mut(&mut self) -> Option<&mut dyn SynthesisStream> {
        None
    }

    /// Stop delivery without closing.
    fn pause(&mut self) -> Attempt {
        Attempt::Unsupported
    }

    /// Disconnect the reader from the producer.
    fn detach(&mut self) -> Attempt {
        Attempt::Unsupported
    }

    /// Shape name for logging.
    fn kind(&self) -> &'static str;
}

/// Pull-based stream over an HTTP response body.
///
/// Destroying or cancelling it drops the body, which closes the connection.
pub struct ResponseStream {
    body: Option<ChunkStream>,
}

impl ResponseStream {
    pub fn new(stream: impl Stream<Item = io::Result<Bytes>> + Send + 'static) -> Self {
        Self {
            body: Some(Box::pin(stream)),
        }
    }

    pub fn from_response(response: reqwest::Response) -> Self {
        Self::new(response.bytes_stream().map(|chunk| chunk.map_err(io::Error::other)))
    }

    pub fn is_destroyed(&self) -> bool {
        self.body.is_none()
    }
}

impl fmt::Debug for ResponseStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseStream")
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl SynthesisStream for ResponseStream {
    fn chunks(&mut self) -> Option<&mut ChunkStream> {
        self.body.as_mut()
    }

    fn destroy(&mut self) -> Attempt {
        self.body = None;
        Attempt::Invoked(Ok(()))
    }

    // Dropping the body aborts the transfer, same as destroy
    fn cancel(&mut self) -> Attempt {
        self.destroy()
    }

    fn kind(&self) -> &'static str {
        "response"
    }
}

/// Flow control shared with the forwarding task of an [`EventStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Flowing,
    Paused,
    Detached,
}

/// Event-emitting stream fed by a background forwarding task.
///
/// The task reads the source and emits `Data` per chunk, then `End` (or
/// `Error`), then `Close` when it drops its sender.
#[derive(Debug)]
pub struct EventStream {
    events: Option<mpsc::Receiver<StreamEvent>>,
    flow: watch::Sender<Flow>,
    producer: AbortHandle,
}

impl EventStream {
    /// Start forwarding `source` as events. Must be called within a runtime.
    pub fn spawn(source: impl Stream<Item = io::Result<Bytes>> + Send + 'static) -> Self {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let (flow, flow_rx) = watch::channel(Flow::Flowing);
        let task = tokio::spawn(forward(Box::pin(source), tx, flow_rx));
        Self {
            events: Some(rx),
            flow,
            producer: task.abort_handle(),
        }
    }

    pub fn flow(&self) -> Flow {
        *self.flow.borrow()
    }

    pub fn is_producer_finished(&self) -> bool {
        self.producer.is_finished()
    }
}

impl SynthesisStream for EventStream {
    fn take_events(&mut self) -> Option<mpsc::Receiver<StreamEvent>> {
        self.events.take()
    }

    fn cancel(&mut self) -> Attempt {
        self.producer.abort();
        Attempt::Invoked(Ok(()))
    }

    fn pause(&mut self) -> Attempt {
        self.flow.send_replace(Flow::Paused);
        Attempt::Invoked(Ok(()))
    }

    fn detach(&mut self) -> Attempt {
        self.flow.send_replace(Flow::Detached);
        // Reader side too, if it was never handed out
        self.events = None;
        Attempt::Invoked(Ok(()))
    }

    fn kind(&self) -> &'static str {
        "events"
    }
}

async fn forward(
    mut source: ChunkStream,
    tx: mpsc::Sender<StreamEvent>,
    mut flow: watch::Receiver<Flow>,
) {
    loop {
        let state = *flow.borrow_and_update();
        match state {
            Flow::Detached => return,
            Flow::Paused => {
                if flow.changed().await.is_err() {
                    return;
                }
                continue;
            }
            Flow::Flowing => {}
        }

        tokio::select! {
            changed = flow.changed() => {
                if changed.is_err() {
                    return;
                }
            }
            item = source.next() => match item {
                Some(Ok(chunk)) => {
                    if tx.send(StreamEvent::Data(chunk)).await.is_err() {
                        return;
                    }
                }
                Some(Err(e)) => {
                    tx.send(StreamEvent::Error(e)).await.ok();
                    return;
                }
                None => {
                    if tx.send(StreamEvent::End).await.is_ok() {
                        tx.send(StreamEvent::Close).await.ok();
                    }
                    return;
                }
            },
        }
    }
}

/// Wrapper around another stream that exposes only the inner stream.
///
/// Reading delegates to the inner stream; termination goes through
/// [`SynthesisStream::inner_mut`].
pub struct WrappedStream {
    inner: Box<dyn SynthesisStream>,
}

impl WrappedStream {
    pub fn new(inner: Box<dyn SynthesisStream>) -> Self {
        Self { inner }
    }
}

impl fmt::Debug for WrappedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedStream")
            .field("inner", &self.inner.kind())
            .finish()
    }
}

impl SynthesisStream for WrappedStream {
    fn chunks(&mut self) -> Option<&mut ChunkStream> {
        self.inner.chunks()
    }

    fn take_events(&mut self) -> Option<mpsc::Receiver<StreamEvent>> {
        self.inner.take_events()
    }

    fn inner_mut(&mut self) -> Option<&mut dyn SynthesisStream> {
        Some(self.inner.as_mut())
    }

    fn kind(&self) -> &'static str {
        "wrapped"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn chunk_source(chunks: &[&'static [u8]]) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        stream::iter(
            chunks
                .iter()
                .map(|c| Ok(Bytes::from_static(c)))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn response_stream_yields_chunks_until_destroyed() {
        let mut stream = ResponseStream::new(chunk_source(&[b"a", b"b"]));

        let first = stream.chunks().unwrap().next().await.unwrap().unwrap();
        assert_eq!(first, Bytes::from_static(b"a"));

        assert!(stream.destroy().is_supported());
        assert!(stream.is_destroyed());
        assert!(stream.chunks().is_none());
    }

    #[tokio::test]
    async fn response_stream_cancel_drops_body() {
        let mut stream = ResponseStream::new(stream::pending());

        assert!(stream.cancel().is_supported());
        assert!(stream.is_destroyed());
        assert!(stream.chunks().is_none());
    }

    #[tokio::test]
    async fn event_stream_emits_data_end_close() {
        let mut stream = EventStream::spawn(chunk_source(&[b"x", b"y"]));
        let mut events = stream.take_events().unwrap();
        assert!(stream.take_events().is_none(), "receiver is handed out once");

        let mut seen = Vec::new();
        while let Some(event) = events.recv().await {
            seen.push(match event {
                StreamEvent::Data(bytes) => format!("data:{}", String::from_utf8_lossy(&bytes)),
                StreamEvent::Error(e) => format!("error:{e}"),
                StreamEvent::End => "end".to_string(),
                StreamEvent::Close => "close".to_string(),
            });
        }

        assert_eq!(seen, ["data:x", "data:y", "end", "close"]);
    }

    #[tokio::test]
    async fn event_stream_reports_source_error() {
        let source = stream::iter(vec![
            Ok(Bytes::from_static(b"x")),
            Err(io::Error::other("reset by peer")),
        ]);
        let mut stream = EventStream::spawn(source);
        let mut events = stream.take_events().unwrap();

        assert!(matches!(events.recv().await, Some(StreamEvent::Data(_))));
        assert!(matches!(events.recv().await, Some(StreamEvent::Error(_))));
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn event_stream_cancel_aborts_producer() {
        let mut stream = EventStream::spawn(stream::pending());
        let mut events = stream.take_events().unwrap();

        assert!(stream.cancel().is_supported());

        // Aborting drops the sender, so the reader sees the channel close
        assert!(events.recv().await.is_none());
        assert!(stream.is_producer_finished());
    }

    #[tokio::test]
    async fn event_stream_detach_stops_forwarding() {
        let mut stream = EventStream::spawn(stream::pending());
        let mut events = stream.take_events().unwrap();

        assert!(stream.pause().is_supported());
        assert_eq!(stream.flow(), Flow::Paused);
        assert!(stream.detach().is_supported());
        assert_eq!(stream.flow(), Flow::Detached);

        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn wrapped_stream_delegates_reading_and_exposes_inner() {
        let mut stream = WrappedStream::new(Box::new(ResponseStream::new(chunk_source(&[b"z"]))));

        let chunk = stream.chunks().unwrap().next().await.unwrap().unwrap();
        assert_eq!(chunk, Bytes::from_static(b"z"));

        assert!(!stream.destroy().is_supported());
        assert!(!stream.cancel().is_supported());
        let inner = stream.inner_mut().unwrap();
        assert_eq!(inner.kind(), "response");
    }
}

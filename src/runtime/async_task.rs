//! Async task and stream handles used across the ingestion pipeline.
//!
//! Every remote operation in the crate hands back one of two shapes:
//! an [`AsyncTask`] for a single result, or an [`AsyncStream`] for a lazily
//! produced sequence. Both are channel-backed so producers run on their own
//! tokio task and consumers only poll.

use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;

/// The producer side of a task went away before sending its result.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("background task ended before producing a result")]
pub struct TaskAborted;

// ============================================================================
// AsyncTask - Single-result async operation
// ============================================================================

/// A handle to an asynchronous task that produces a single result.
pub struct AsyncTask<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> AsyncTask<T>
where
    T: Send + 'static,
{
    #[inline]
    #[must_use]
    pub fn new(rx: oneshot::Receiver<T>) -> Self {
        Self { rx }
    }

    /// Run a blocking closure on the blocking pool.
    #[inline]
    pub fn spawn<F>(f: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        tokio::task::spawn_blocking(move || {
            let _ = tx.send(f());
        });
        Self::new(rx)
    }

    /// Run a future on the runtime.
    #[inline]
    pub fn spawn_async<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        tokio::task::spawn(async move {
            let _ = tx.send(future.await);
        });
        Self::new(rx)
    }

    /// A task that is already complete. Does not touch the runtime.
    #[must_use]
    pub fn ready(value: T) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(value);
        Self::new(rx)
    }
}

impl<T, E> AsyncTask<Result<T, E>>
where
    T: Send + 'static,
    E: From<TaskAborted> + Send + 'static,
{
    /// Await the task and fold a lost producer into the task's own error type.
    pub async fn join(self) -> Result<T, E> {
        match self.await {
            Ok(result) => result,
            Err(_) => Err(E::from(TaskAborted)),
        }
    }
}

impl<T> Future for AsyncTask<T> {
    type Output = Result<T, oneshot::error::RecvError>;

    #[inline]
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx)
    }
}

// ============================================================================
// AsyncStream - Multi-result streaming operation
// ============================================================================

/// Sending half of an [`AsyncStream`].
pub struct StreamSender<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> StreamSender<T> {
    /// Push one item. Returns `false` once the consumer has dropped the stream,
    /// which producers use as their signal to stop paginating.
    #[inline]
    pub fn send(&self, item: T) -> bool {
        self.tx.send(item).is_ok()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<T> Clone for StreamSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

/// A lazily produced sequence. Items arrive in the order the producer sends them.
pub struct AsyncStream<T> {
    inner: UnboundedReceiverStream<T>,
}

impl<T> AsyncStream<T> {
    #[must_use]
    pub fn channel() -> (StreamSender<T>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            StreamSender { tx },
            Self {
                inner: UnboundedReceiverStream::new(rx),
            },
        )
    }

    /// Spawn `producer` with the sending half and return the receiving half.
    pub fn spawn<F, Fut>(producer: F) -> Self
    where
        T: Send + 'static,
        F: FnOnce(StreamSender<T>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, stream) = Self::channel();
        tokio::task::spawn(producer(tx));
        stream
    }

    /// A stream over already materialised items. The channel is filled
    /// synchronously, so this works outside a runtime too.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        let (tx, stream) = Self::channel();
        for item in items {
            if !tx.send(item) {
                break;
            }
        }
        stream
    }
}

impl<T> Stream for AsyncStream<T> {
    type Item = T;

    #[inline]
    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

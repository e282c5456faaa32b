//! Bounded connection queue and the workers draining it.
//!
//! The acceptor pushes onto a [`QueueSender`]; every worker pops from a
//! clone of the same [`QueueReceiver`]. A full queue makes the push wait,
//! which is what throttles the accept loop. Workers wait on the queue for
//! at most one poll interval at a time so they notice a stop request
//! promptly.

use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bare_http::connection::HttpConnection;
use bare_http::handler::Handler;
use futures::FutureExt;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// An accepted connection waiting for a worker.
#[derive(Debug)]
pub struct Accepted {
    pub stream: TcpStream,
    pub remote_addr: SocketAddr,
}

/// Creates a bounded FIFO holding at most `capacity` items.
///
/// # Panics
///
/// If `capacity` is 0.
pub fn bounded<T>(capacity: usize) -> (QueueSender<T>, QueueReceiver<T>) {
    let (sender, receiver) = mpsc::channel(capacity);
    (QueueSender { inner: sender }, QueueReceiver { inner: Arc::new(Mutex::new(receiver)) })
}

/// Producer side of the queue. Dropping it closes the queue.
#[derive(Debug)]
pub struct QueueSender<T> {
    inner: mpsc::Sender<T>,
}

impl<T> QueueSender<T> {
    /// Enqueues `item`, waiting while the queue is full.
    ///
    /// Hands the item back if every receiver is gone.
    pub async fn push(&self, item: T) -> Result<(), T> {
        self.inner.send(item).await.map_err(|e| e.0)
    }

    /// Free slots right now.
    pub fn remaining_capacity(&self) -> usize {
        self.inner.capacity()
    }
}

/// Consumer side of the queue, shared by all workers.
#[derive(Debug)]
pub struct QueueReceiver<T> {
    inner: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for QueueReceiver<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

/// Outcome of one bounded wait on the queue.
#[derive(Debug, PartialEq, Eq)]
pub enum Pop<T> {
    Item(T),
    TimedOut,
    /// The sender is gone and nothing is left.
    Closed,
}

impl<T> QueueReceiver<T> {
    /// Dequeues the oldest item, waiting at most `timeout`.
    pub async fn pop_timeout(&self, timeout: Duration) -> Pop<T> {
        let next = async { self.inner.lock().await.recv().await };
        match tokio::time::timeout(timeout, next).await {
            Ok(Some(item)) => Pop::Item(item),
            Ok(None) => Pop::Closed,
            Err(_) => Pop::TimedOut,
        }
    }
}

/// A fixed set of worker tasks serving connections from the queue.
#[derive(Debug)]
pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Spawns `worker_count` workers onto the current tokio runtime.
    pub fn spawn<H>(worker_count: usize, queue: QueueReceiver<Accepted>, handler: Arc<H>, poll_interval: Duration) -> Self
    where
        H: Handler + ?Sized + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let workers = (0..worker_count)
            .map(|id| {
                let worker = Worker { id, queue: queue.clone(), handler: Arc::clone(&handler), stop: Arc::clone(&stop), poll_interval };
                tokio::spawn(worker.run())
            })
            .collect();

        Self { workers, stop }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Asks every worker to exit once its current connection is done.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Stops the workers and waits until `timeout` has passed for all of them.
    ///
    /// Workers still busy at that deadline are aborted. Returns how many
    /// were abandoned that way.
    pub async fn shutdown(self, timeout: Duration) -> usize {
        self.stop();
        let deadline = Instant::now() + timeout;

        let mut abandoned = 0;
        for (id, mut handle) in self.workers.into_iter().enumerate() {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(worker = id, cause = %e, "worker task failed"),
                Err(_) => {
                    warn!(worker = id, timeout = ?timeout, "worker did not stop in time, abandoning it");
                    handle.abort();
                    abandoned += 1;
                }
            }
        }
        abandoned
    }
}

struct Worker<H: ?Sized> {
    id: usize,
    queue: QueueReceiver<Accepted>,
    handler: Arc<H>,
    stop: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl<H> Worker<H>
where
    H: Handler + ?Sized,
{
    async fn run(self) {
        debug!(worker = self.id, "worker started");

        while !self.stop.load(Ordering::Acquire) {
            match self.queue.pop_timeout(self.poll_interval).await {
                Pop::Item(accepted) => self.serve(accepted).await,
                Pop::TimedOut => {}
                Pop::Closed => break,
            }
        }

        debug!(worker = self.id, "worker stopped");
    }

    /// Runs one connection to completion. Nothing that happens here may
    /// escape: the stream is closed and the worker moves on.
    async fn serve(&self, accepted: Accepted) {
        let Accepted { stream, remote_addr } = accepted;
        let (reader, writer) = stream.into_split();
        let connection = HttpConnection::new(reader, writer);

        match AssertUnwindSafe(connection.process(self.handler.as_ref())).catch_unwind().await {
            Ok(Ok(())) => info!(worker = self.id, remote_addr = %remote_addr, "finished process, connection shutdown"),
            Ok(Err(e)) => error!(worker = self.id, remote_addr = %remote_addr, cause = %e, "connection failed"),
            Err(_) => error!(worker = self.id, remote_addr = %remote_addr, "connection task panicked"),
        }
    }
}

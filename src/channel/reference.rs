use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::Mutex;

use super::{BrokerChannel, ChannelError};

/// A shared, exclusive-access reference to one broker channel.
///
/// Cloning a `ChannelRef` is cheap and yields a handle to the same underlying
/// channel: any number of publishers can hold one, and
/// [`execute`](ChannelRef::execute) guarantees that at most one operation is
/// in flight against the channel at any instant.
pub struct ChannelRef<C> {
    inner: Arc<Inner<C>>,
}

struct Inner<C> {
    channel: Mutex<C>,
    disposed: AtomicBool,
}

impl<C> Clone for ChannelRef<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: BrokerChannel> ChannelRef<C> {
    /// Take ownership of `channel`. From here on the channel is only reachable
    /// through [`execute`](ChannelRef::execute).
    pub fn new(channel: C) -> Self {
        Self {
            inner: Arc::new(Inner {
                channel: Mutex::new(channel),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Run `operation` with exclusive access to the underlying channel,
    /// returning its result.
    ///
    /// Waits until no other operation is in flight. Fails with
    /// [`ChannelError::Disposed`] if the reference has been disposed.
    ///
    /// # Deadlocks
    ///
    /// `execute` is not reentrant: calling it again on the same reference from
    /// within `operation` deadlocks.
    pub async fn execute<R, F>(&self, operation: F) -> Result<R, ChannelError>
    where
        F: for<'c> FnOnce(&'c mut C) -> BoxFuture<'c, Result<R, ChannelError>>,
    {
        let mut channel = self.inner.channel.lock().await;
        if self.inner.disposed.load(Ordering::SeqCst) {
            return Err(ChannelError::Disposed);
        }
        operation(&mut channel).await
    }

    /// Dispose the underlying channel.
    ///
    /// Safe to call concurrently and repeatedly: only the first call reaches
    /// the channel, every later call returns immediately. An operation already
    /// in flight completes first.
    pub async fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut channel = self.inner.channel.lock().await;
        channel.dispose().await;
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }
}

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot::{self, error::TryRecvError};

/// Resolves once, on the next matching store change.
///
/// Also resolves if the channel that issued it is dropped, since no change
/// can be announced after that and waiting would never end.
#[derive(Debug)]
pub struct NextChange {
    receiver: oneshot::Receiver<()>,
    fired: bool,
}

impl NextChange {
    pub(crate) fn new(receiver: oneshot::Receiver<()>) -> Self {
        NextChange {
            receiver,
            fired: false,
        }
    }

    /// Check without waiting.
    pub fn has_fired(&mut self) -> bool {
        if !self.fired {
            self.fired = !matches!(self.receiver.try_recv(), Err(TryRecvError::Empty));
        }
        self.fired
    }

    /// Block the current thread until the change happens.
    ///
    /// Must not be called from within an async runtime.
    pub fn wait_blocking(self) {
        if !self.fired {
            let _ = self.receiver.blocking_recv();
        }
    }
}

impl Future for NextChange {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.fired {
            return Poll::Ready(());
        }
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(_) => {
                self.fired = true;
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

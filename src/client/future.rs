use crate::client::error::ClientError;
use crate::cmd::reply::Reply;
use crate::cmd::request::{Request, Ticket};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

type Decoder<T> = fn(Reply) -> crate::Result<T>;

/// Pending result of a submitted command. The command is already queued
/// when this is returned; awaiting it yields the decoded value or the
/// error the command failed with.
#[must_use = "the command is queued either way; await the future to observe its result"]
pub struct RFuture<T> {
    receiver: oneshot::Receiver<crate::Result<Reply>>,
    ticket: Arc<Ticket>,
    decode: Decoder<T>,
}

impl<T> RFuture<T> {
    /// Queues `request` on `sender`. A closed channel completes the future
    /// with `ChannelFailure` right away.
    pub(crate) fn submit(sender: &crate::MpscSender, request: Request, decode: Decoder<T>) -> Self {
        let (tx, receiver) = oneshot::channel();
        let ticket = request.ticket.clone();
        if let Err(err) = sender.send((tx, request)) {
            let (tx, _) = err.0;
            let _ = tx.send(Err(ClientError::ChannelFailure("executor is gone".to_string()).into()));
        }
        Self {
            receiver,
            ticket,
            decode,
        }
    }

    /// Already completed with `reply`; nothing is queued.
    pub(crate) fn ready(reply: Reply, decode: Decoder<T>) -> Self {
        let (tx, receiver) = oneshot::channel();
        let ticket = Ticket::new();
        ticket.start();
        let _ = tx.send(Ok(reply));
        Self {
            receiver,
            ticket,
            decode,
        }
    }

    /// Prevents the command from running if it has not started yet, and
    /// returns whether it did. Once started, the command runs to completion
    /// and this is a no-op returning false.
    pub fn cancel(&self) -> bool {
        self.ticket.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.ticket.is_cancelled()
    }
}

impl<T> Future for RFuture<T> {
    type Output = crate::Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(Ok(reply))) => Poll::Ready((this.decode)(reply)),
            Poll::Ready(Ok(Err(err))) => Poll::Ready(Err(err)),
            Poll::Ready(Err(_)) => {
                let err = if this.ticket.is_cancelled() {
                    ClientError::Cancelled
                } else {
                    ClientError::ChannelFailure("reply dropped".to_string())
                };
                Poll::Ready(Err(err.into()))
            }
        }
    }
}

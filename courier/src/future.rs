//! Future form of a request.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use courier_core::{CancellationToken, Error, Response};
use futures::channel::oneshot;
use pin_project::{pin_project, pinned_drop};

/// Resolves to the result of a request started by
/// [`Provider::send`](crate::Provider::send).
///
/// Dropping the future before it resolves cancels the request.
#[pin_project(PinnedDrop)]
pub struct ResponseFuture {
    #[pin]
    receiver: oneshot::Receiver<Result<Response, Error>>,
    token: CancellationToken,
    resolved: bool,
}

impl ResponseFuture {
    pub(crate) fn new(
        receiver: oneshot::Receiver<Result<Response, Error>>,
        token: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            token,
            resolved: false,
        }
    }

    /// Token of the underlying request.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Future for ResponseFuture {
    type Output = Result<Response, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let result = match ready!(this.receiver.poll(cx)) {
            Ok(result) => result,
            // The backend dropped the completion without calling it.
            Err(oneshot::Canceled) => Err(Error::unexpected("completion dropped without a result")),
        };
        *this.resolved = true;
        Poll::Ready(result)
    }
}

#[pinned_drop]
impl PinnedDrop for ResponseFuture {
    fn drop(self: Pin<&mut Self>) {
        let this = self.project();
        if !*this.resolved {
            this.token.cancel();
        }
    }
}

impl fmt::Debug for ResponseFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseFuture")
            .field("token", &self.token)
            .field("resolved", &self.resolved)
            .finish()
    }
}

//! The request pipeline.

use std::fmt;
use std::sync::Arc;

use courier_backend::Backend;
use courier_core::{CancellationToken, Completion, Endpoint, Error, Response, Target};
use futures::channel::oneshot;
use tracing::debug;

use crate::future::ResponseFuture;
use crate::middleware::Middleware;

/// Hook run on every endpoint before the middlewares.
pub type PrepareHook = dyn Fn(&mut Endpoint) + Send + Sync;

/// Sends requests for [`Target`]s through a [`Backend`].
///
/// For every request the provider:
///
/// 1. builds an [`Endpoint`] from the target,
/// 2. runs the prepare hook on it,
/// 3. runs [`will_send_request`](Middleware::will_send_request) on every
///    middleware, in registration order,
/// 4. hands the endpoint to the backend, unless it was aborted,
/// 5. runs [`did_receive_response`](Middleware::did_receive_response) on
///    every middleware, then the caller's completion.
///
/// Steps 1 to 4 run on the caller's thread. An aborted request completes
/// synchronously with [`Error::Aborted`] and never reaches the backend.
///
/// A provider holds only immutable configuration; clones are cheap and
/// may be used from many threads at once.
///
/// ```
/// use courier::{Provider, middleware::NetworkLoggerMiddleware};
/// use courier_stub::StubBackend;
///
/// # #[tokio::main]
/// # async fn main() {
/// let provider = Provider::builder()
///     .backend(StubBackend::new())
///     .middleware(NetworkLoggerMiddleware::new())
///     .build();
/// # let _ = provider;
/// # }
/// ```
#[derive(Clone)]
pub struct Provider {
    backend: Arc<dyn Backend>,
    middlewares: Arc<[Arc<dyn Middleware>]>,
    prepare: Option<Arc<PrepareHook>>,
}

impl Provider {
    /// Creates a builder.
    pub fn builder() -> ProviderBuilder<NotSet> {
        ProviderBuilder::new()
    }

    /// Provider with `backend`, no middlewares and no prepare hook.
    pub fn new<B>(backend: B) -> Self
    where
        B: Backend + 'static,
    {
        Self::builder().backend(backend).build()
    }

    /// Backend used by [`request`](Self::request).
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Registered middlewares, in call order.
    pub fn middlewares(&self) -> &[Arc<dyn Middleware>] {
        &self.middlewares
    }

    /// Copy of this provider sending through `backend`.
    pub fn with_backend<B>(&self, backend: B) -> Self
    where
        B: Backend + 'static,
    {
        Self {
            backend: Arc::new(backend),
            ..self.clone()
        }
    }

    /// Copy of this provider with `middlewares` replacing the current ones.
    pub fn with_middlewares(&self, middlewares: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            middlewares: middlewares.into(),
            ..self.clone()
        }
    }

    /// Copy of this provider with `prepare` replacing the current hook.
    pub fn with_prepare<F>(&self, prepare: F) -> Self
    where
        F: Fn(&mut Endpoint) + Send + Sync + 'static,
    {
        Self {
            prepare: Some(Arc::new(prepare)),
            ..self.clone()
        }
    }

    /// Sends a request for `target` and calls `completion` once with its
    /// result.
    ///
    /// The returned token cancels the request. A cancelled request still
    /// completes exactly once, with [`Error::Cancelled`].
    pub fn request<T, F>(&self, target: T, completion: F) -> CancellationToken
    where
        T: Target,
        F: FnOnce(Result<Response, Error>) + Send + 'static,
    {
        self.dispatch(self.backend.as_ref(), Arc::new(target), Box::new(completion))
    }

    /// Like [`request`](Self::request), for a target that is already shared.
    pub fn request_shared<F>(&self, target: Arc<dyn Target>, completion: F) -> CancellationToken
    where
        F: FnOnce(Result<Response, Error>) + Send + 'static,
    {
        self.dispatch(self.backend.as_ref(), target, Box::new(completion))
    }

    /// Like [`request`](Self::request), but sends through `backend` instead
    /// of the provider's own.
    pub fn request_with_backend<T, F>(
        &self,
        target: T,
        backend: &dyn Backend,
        completion: F,
    ) -> CancellationToken
    where
        T: Target,
        F: FnOnce(Result<Response, Error>) + Send + 'static,
    {
        self.dispatch(backend, Arc::new(target), Box::new(completion))
    }

    /// Sends a request for `target` and returns a future resolving to its
    /// result.
    ///
    /// The request starts immediately, not on first poll. Dropping the
    /// future before it resolves cancels the request.
    pub fn send<T>(&self, target: T) -> ResponseFuture
    where
        T: Target,
    {
        let (sender, receiver) = oneshot::channel();
        let token = self.request(target, move |result| {
            let _ = sender.send(result);
        });
        ResponseFuture::new(receiver, token)
    }

    fn dispatch(
        &self,
        backend: &dyn Backend,
        target: Arc<dyn Target>,
        completion: Completion,
    ) -> CancellationToken {
        let mut endpoint = Endpoint::new(target.clone());
        debug!(method = %endpoint.method(), url = %endpoint.url(), "preparing request");

        if let Some(prepare) = &self.prepare {
            prepare(&mut endpoint);
        }
        for middleware in self.middlewares.iter() {
            middleware.will_send_request(target.as_ref(), &mut endpoint);
        }

        if !endpoint.should_perform() {
            debug!(method = %endpoint.method(), url = %endpoint.url(), "request aborted");
            let result = Err(Error::Aborted);
            for middleware in self.middlewares.iter() {
                middleware.did_receive_response(target.as_ref(), &result);
            }
            completion(result);
            return CancellationToken::completed(format!(
                "aborted {} {}",
                endpoint.method(),
                endpoint.url()
            ));
        }

        debug!(
            method = %endpoint.method(),
            url = %endpoint.url(),
            backend = %backend.label(),
            "dispatching request"
        );
        let middlewares = self.middlewares.clone();
        backend.request(
            endpoint,
            Box::new(move |result| {
                match &result {
                    Ok(response) => debug!(status = response.status_code, "request completed"),
                    Err(error) => debug!(%error, "request failed"),
                }
                for middleware in middlewares.iter() {
                    middleware.did_receive_response(target.as_ref(), &result);
                }
                completion(result);
            }),
        )
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("backend", &self.backend.label())
            .field("middlewares", &self.middlewares.len())
            .field("prepare", &self.prepare.is_some())
            .finish()
    }
}

/// Marker type for a required builder field that has not been set.
///
/// When you see `NotSet` in a compiler error, call
/// [`ProviderBuilder::backend`] before [`build`](ProviderBuilder::build).
#[derive(Debug, Clone, Copy, Default)]
pub struct NotSet;

/// Builder for [`Provider`]. The backend is required.
pub struct ProviderBuilder<B> {
    backend: B,
    middlewares: Vec<Arc<dyn Middleware>>,
    prepare: Option<Arc<PrepareHook>>,
}

impl ProviderBuilder<NotSet> {
    /// Creates a builder with no backend set.
    pub fn new() -> Self {
        Self {
            backend: NotSet,
            middlewares: Vec::new(),
            prepare: None,
        }
    }
}

impl Default for ProviderBuilder<NotSet> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> ProviderBuilder<B> {
    /// Sets the backend performing requests.
    pub fn backend<NewB>(self, backend: NewB) -> ProviderBuilder<NewB>
    where
        NewB: Backend + 'static,
    {
        ProviderBuilder {
            backend,
            middlewares: self.middlewares,
            prepare: self.prepare,
        }
    }

    /// Appends a middleware. Middlewares run in the order they are added.
    pub fn middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Sets the hook run on every endpoint before the middlewares, e.g. to
    /// add an authentication header.
    pub fn prepare<F>(mut self, prepare: F) -> Self
    where
        F: Fn(&mut Endpoint) + Send + Sync + 'static,
    {
        self.prepare = Some(Arc::new(prepare));
        self
    }
}

impl<B> ProviderBuilder<B>
where
    B: Backend + 'static,
{
    /// Builds the provider.
    pub fn build(self) -> Provider {
        Provider {
            backend: Arc::new(self.backend),
            middlewares: self.middlewares.into(),
            prepare: self.prepare,
        }
    }
}

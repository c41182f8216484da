use std::fmt;

use courier_backend::{Backend, BackendLabel};
use courier_core::{
    CancellationToken, Completion, CompletionSlot, Endpoint, Error, MultipartStream, RequestBody,
    Response,
};
use http::HeaderValue;
use http::header::CONTENT_LENGTH;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::ReqwestBackendConfig;
use crate::error::ReqwestBackendError;

/// Chunks buffered between the blocking reader and the connection.
const STREAM_BUFFER_CHUNKS: usize = 4;

/// Backend performing requests with reqwest.
///
/// Requests run as tasks on the runtime captured at construction time, so
/// [`request`](Backend::request) may be called from any thread.
#[derive(Clone)]
pub struct ReqwestBackend {
    client: reqwest::Client,
    runtime: Handle,
    config: ReqwestBackendConfig,
}

impl ReqwestBackend {
    /// Creates a builder.
    pub fn builder() -> ReqwestBackendBuilder {
        ReqwestBackendBuilder::default()
    }

    /// Active configuration.
    pub fn config(&self) -> &ReqwestBackendConfig {
        &self.config
    }

    fn prepare(&self, endpoint: &Endpoint) -> Result<reqwest::Request, Error> {
        let encoded = endpoint.encode(&self.config.encoding)?;
        let mut headers = encoded.headers;
        if encoded.body.is_stream()
            && let Some(length) = encoded.body.content_length()
        {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        }

        let builder = self
            .client
            .request(encoded.method, encoded.url)
            .headers(headers);
        let builder = match encoded.body {
            RequestBody::Empty => builder,
            RequestBody::Bytes(bytes) => builder.body(bytes),
            RequestBody::Stream(stream) => builder.body(self.streamed_body(stream)),
        };

        builder.build().map_err(Error::build_request)
    }

    /// Wraps a multipart stream whose chunks are read on the blocking pool.
    ///
    /// The reader stops after the first failed chunk, or as soon as the
    /// request body is dropped.
    fn streamed_body(&self, stream: MultipartStream) -> reqwest::Body {
        let (sender, receiver) = mpsc::channel(STREAM_BUFFER_CHUNKS);
        self.runtime.spawn_blocking(move || {
            for chunk in stream {
                let failed = chunk.is_err();
                if sender.blocking_send(chunk).is_err() || failed {
                    break;
                }
            }
        });
        let chunks = futures::stream::unfold(receiver, |mut receiver| async move {
            receiver.recv().await.map(|chunk| (chunk, receiver))
        });
        reqwest::Body::wrap_stream(chunks)
    }
}

impl Backend for ReqwestBackend {
    fn request(&self, endpoint: Endpoint, completion: Completion) -> CancellationToken {
        let token = CancellationToken::new(format!(
            "reqwest {} {}",
            endpoint.method(),
            endpoint.url()
        ));
        let slot = CompletionSlot::new(completion);
        let prepared = self.prepare(&endpoint);
        let client = self.client.clone();

        debug!(method = %endpoint.method(), url = %endpoint.url(), "dispatching request");
        let transport = self.runtime.spawn(async move {
            let request = prepared?;
            let response = client.execute(request).await.map_err(map_error)?;
            let status_code = response.status().as_u16();
            let headers = response.headers().clone();
            let url = response.url().clone();
            let body = response.bytes().await.map_err(map_error)?;
            Ok::<_, Error>(Response {
                status_code,
                body,
                headers,
                url: Some(url),
            })
        });
        let abort = transport.abort_handle();

        {
            let token = token.clone();
            let slot = slot.clone();
            self.runtime.spawn(async move {
                let result = match transport.await {
                    Ok(result) => result,
                    Err(error) if error.is_cancelled() => Err(Error::Cancelled),
                    Err(error) => {
                        warn!(%error, "transport task failed");
                        Err(Error::unexpected(format!("transport task failed: {error}")))
                    }
                };
                match &result {
                    Ok(response) => debug!(status = response.status_code, "request completed"),
                    Err(error) => debug!(%error, "request failed"),
                }
                slot.deliver(&token, result);
            });
        }

        token.set_cancel_action(move || {
            abort.abort();
            slot.complete(Err(Error::Cancelled));
        });

        token
    }

    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("reqwest")
    }
}

impl fmt::Debug for ReqwestBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestBackend")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn map_error(error: reqwest::Error) -> Error {
    if error.is_builder() {
        Error::build_request(error)
    } else if error.is_timeout()
        || error.is_connect()
        || error.is_request()
        || error.is_body()
        || error.is_decode()
        || error.is_redirect()
    {
        Error::transport(error)
    } else {
        Error::unexpected(error)
    }
}

/// Builder for [`ReqwestBackend`].
#[derive(Debug, Default)]
pub struct ReqwestBackendBuilder {
    client: Option<reqwest::Client>,
    runtime: Option<Handle>,
    config: ReqwestBackendConfig,
}

impl ReqwestBackendBuilder {
    /// Uses a preconfigured client. Its own timeout and user agent then take
    /// precedence over the configuration.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Runtime the requests run on. Defaults to the current runtime.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Replaces the configuration.
    pub fn config(mut self, config: ReqwestBackendConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the backend.
    pub fn build(self) -> Result<ReqwestBackend, ReqwestBackendError> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current()?,
        };
        let client = match self.client {
            Some(client) => client,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = self.config.timeout {
                    builder = builder.timeout(timeout);
                }
                if let Some(user_agent) = &self.config.user_agent {
                    builder = builder.user_agent(user_agent.as_str());
                }
                builder.build()?
            }
        };

        Ok(ReqwestBackend {
            client,
            runtime,
            config: self.config,
        })
    }
}

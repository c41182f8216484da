use std::fmt;
use std::sync::Arc;

use courier_core::{Endpoint, Error, Response, Target};
use tracing::info;

use super::Middleware;

/// Renders a response body for logging.
pub type BodyFormatter = dyn Fn(&[u8]) -> String + Send + Sync;

/// Receives every formatted log line in addition to `tracing`.
pub type LogSink = dyn Fn(&str) + Send + Sync;

/// Logs a summary of each request and its outcome.
///
/// Lines are emitted as `tracing` events at `INFO` level. With
/// [`verbose`](Self::verbose) the request headers, parameters and response
/// body are logged too.
///
/// ```
/// use courier::middleware::NetworkLoggerMiddleware;
///
/// let logger = NetworkLoggerMiddleware::new()
///     .verbose(true)
///     .body_formatter(|body| format!("{} bytes", body.len()));
/// ```
#[derive(Clone, Default)]
pub struct NetworkLoggerMiddleware {
    verbose: bool,
    formatter: Option<Arc<BodyFormatter>>,
    output: Option<Arc<LogSink>>,
}

impl NetworkLoggerMiddleware {
    /// Logger with terse output and lossy UTF-8 body rendering.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also logs headers, parameters and bodies.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Replaces the response body renderer.
    pub fn body_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&[u8]) -> String + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// Copies every line to `output`.
    pub fn output<F>(mut self, output: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.output = Some(Arc::new(output));
        self
    }

    fn format_body(&self, body: &[u8]) -> String {
        match &self.formatter {
            Some(formatter) => formatter(body),
            None => String::from_utf8_lossy(body).into_owned(),
        }
    }

    fn emit(&self, line: String) {
        info!("{line}");
        if let Some(output) = &self.output {
            output(&line);
        }
    }
}

impl Middleware for NetworkLoggerMiddleware {
    fn will_send_request(&self, _target: &dyn Target, endpoint: &mut Endpoint) {
        self.emit(format!("Request: {} {}", endpoint.method(), endpoint.url()));
        if self.verbose {
            self.emit(format!("Request Headers: {:?}", endpoint.headers()));
            self.emit(format!("Request Parameters: {:?}", endpoint.parameters()));
        }
    }

    fn did_receive_response(&self, target: &dyn Target, result: &Result<Response, Error>) {
        match result {
            Ok(response) => {
                let url = match &response.url {
                    Some(url) => url.to_string(),
                    None => target.full_url().to_string(),
                };
                self.emit(format!("Response: {} {url}", response.status_code));
                if self.verbose {
                    self.emit(format!("Response Body: {}", self.format_body(&response.body)));
                }
            }
            Err(error) => self.emit(format!("Response Error: {error}")),
        }
    }
}

impl fmt::Debug for NetworkLoggerMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkLoggerMiddleware")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

//! Executing requests over HTTP.
//!
//! Requests are built by [`TableRequest::into_request`](crate::TableRequest),
//! so any client that speaks the [`http`] types can send them. The traits here
//! are the seam the [`Client`](crate::Client) uses; they are implemented for
//! [`ureq::Agent`] (blocking) and [`reqwest::Client`] (non-blocking), and both
//! are bundled together in [`HttpTransport`].

use std::time;

use crate::Error;

/// Sends a request and waits for the complete response.
///
/// Implementations should return non-success responses as-is; status
/// checking happens in the client.
pub trait Transport {
    /// Execute the request, blocking the current thread.
    fn execute(&self, req: http::Request<String>) -> Result<http::Response<String>, Error>;
}

/// Like [`Transport`], but suspends instead of blocking.
pub trait AsyncTransport {
    /// Execute the request.
    fn execute_async(
        &self,
        req: http::Request<String>,
    ) -> impl Future<Output = Result<http::Response<String>, Error>> + Send;
}

impl Transport for ureq::Agent {
    fn execute(&self, req: http::Request<String>) -> Result<http::Response<String>, Error> {
        let resp = match self.run(req) {
            Ok(resp) => resp,
            // The agent was configured to treat statuses as errors, so the
            // body is gone.
            Err(ureq::Error::StatusCode(code)) => {
                return http::Response::builder()
                    .status(code)
                    .body(String::new())
                    .map_err(Error::from);
            }
            Err(e) => return Err(Error::transport(e)),
        };

        let (parts, mut body) = resp.into_parts();
        let text = body.read_to_string().map_err(Error::transport)?;
        Ok(http::Response::from_parts(parts, text))
    }
}

impl AsyncTransport for reqwest::Client {
    fn execute_async(
        &self,
        req: http::Request<String>,
    ) -> impl Future<Output = Result<http::Response<String>, Error>> + Send {
        async move {
            let req = reqwest::Request::try_from(req).map_err(Error::transport)?;
            let resp = self.execute(req).await.map_err(Error::transport)?;

            let status = resp.status();
            let version = resp.version();
            let headers = resp.headers().clone();
            let text = resp.text().await.map_err(Error::transport)?;

            let mut out = http::Response::new(text);
            *out.status_mut() = status;
            *out.version_mut() = version;
            *out.headers_mut() = headers;
            Ok(out)
        }
    }
}

/// The default transport: `ureq` for blocking calls and `reqwest` for async
/// ones, sharing the same timeout.
#[derive(Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a transport. `timeout` bounds each request end to end; `None`
    /// means no timeout.
    pub fn new(timeout: Option<time::Duration>) -> Result<Self, Error> {
        // Allows error responses to be read.
        let cfg = ureq::config::Config::builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build();
        let agent = ureq::Agent::new_with_config(cfg);

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(Error::transport)?;
        Ok(Self { agent, client })
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        let cfg = ureq::config::Config::builder()
            .http_status_as_error(false)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(cfg),
            client: reqwest::Client::new(),
        }
    }
}

impl Transport for HttpTransport {
    fn execute(&self, req: http::Request<String>) -> Result<http::Response<String>, Error> {
        Transport::execute(&self.agent, req)
    }
}

impl AsyncTransport for HttpTransport {
    fn execute_async(
        &self,
        req: http::Request<String>,
    ) -> impl Future<Output = Result<http::Response<String>, Error>> + Send {
        AsyncTransport::execute_async(&self.client, req)
    }
}

use std::time::Duration;

use thiserror::Error;
use tracing::trace;
use ureq::Agent;

/// Default timeout of a description GET
pub const DEFAULT_DESCRIPTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout of a SOAP POST
pub const DEFAULT_SOAP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Status and full body of an HTTP exchange, whatever the status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking HTTP seam used for descriptions and SOAP calls.
///
/// Implementations must return non-2xx responses as `Ok`: only transport
/// failures (connect, reset, timeout, truncated body) are errors.
pub trait HttpTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;

    fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<HttpResponse, TransportError>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        (**self).get(url)
    }

    fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<HttpResponse, TransportError> {
        (**self).post(url, headers, body)
    }
}

/// [`HttpTransport`] backed by two `ureq` agents, one per timeout.
pub struct UreqTransport {
    get_agent: Agent,
    post_agent: Agent,
}

impl UreqTransport {
    /// `Duration::ZERO` disables the corresponding timeout.
    pub fn new(get_timeout: Duration, post_timeout: Duration) -> Self {
        Self {
            get_agent: build_agent(get_timeout),
            post_agent: build_agent(post_timeout),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(DEFAULT_DESCRIPTION_TIMEOUT, DEFAULT_SOAP_TIMEOUT)
    }
}

// 4xx/5xx must not become Error::StatusCode: SOAP Faults are read and shown.
// Renderers live on the LAN, so environment proxies are never used.
// A zero timeout means no timeout.
fn build_agent(timeout: Duration) -> Agent {
    let config = Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global((!timeout.is_zero()).then_some(timeout))
        .proxy(None)
        .build();

    config.into()
}

impl HttpTransport for UreqTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let mut response = self.get_agent.get(url).call()?;
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_vec()?;

        trace!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }

    fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<HttpResponse, TransportError> {
        let mut request = self.post_agent.post(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let mut response = request.send(body)?;
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_vec()?;

        trace!("POST {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

use std::net::SocketAddr;
use std::time::Duration;

use dmrupnp::AV_TRANSPORT_SERVICE_TYPE;
use dmrupnp::ssdp::{SSDP_ALL, SearchResponse, SsdpClient};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("SSDP socket error: {0}")]
    Socket(#[from] std::io::Error),
}

/// Annonce SSDP d'un service, telle que reçue en réponse au M-SEARCH.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Advertisement {
    /// ST de la réponse
    pub service_type: String,
    /// URL de la description device (LOCATION)
    pub location: String,
    /// Header SERVER, s'il est présent
    pub server: Option<String>,
    /// USN, uniquement pour le diagnostic
    pub usn: Option<String>,
}

impl Advertisement {
    pub fn new(service_type: &str, location: &str) -> Self {
        Self {
            service_type: service_type.to_string(),
            location: location.to_string(),
            server: None,
            usn: None,
        }
    }

    pub fn with_server(mut self, server: &str) -> Self {
        self.server = Some(server.to_string());
        self
    }

    /// AVTransport advertises playback-capable renderers, and ConnectionManager
    /// is always colocated with it.
    pub fn is_av_transport(&self) -> bool {
        self.service_type == AV_TRANSPORT_SERVICE_TYPE
    }
}

impl From<SearchResponse> for Advertisement {
    fn from(response: SearchResponse) -> Self {
        Self {
            service_type: response.st,
            location: response.location,
            server: response.server,
            usn: response.usn,
        }
    }
}

/// Source des annonces de renderers pour une exécution du rapport.
pub trait Searcher {
    /// Collects advertisements for `window`, then returns those whose service
    /// type is AVTransport:1. An empty result is not an error.
    fn search(&self, window: Duration) -> Result<Vec<Advertisement>, DiscoveryError>;
}

impl<S: Searcher + ?Sized> Searcher for &S {
    fn search(&self, window: Duration) -> Result<Vec<Advertisement>, DiscoveryError> {
        (**self).search(window)
    }
}

/// [`Searcher`] issuing a real `ssdp:all` M-SEARCH.
#[derive(Debug, Clone, Default)]
pub struct SsdpSearcher {
    target: Option<SocketAddr>,
}

impl SsdpSearcher {
    /// Searcher targeting 239.255.255.250:1900
    pub fn new() -> Self {
        Self { target: None }
    }

    /// Searcher sending its M-SEARCH to `target` instead of the multicast group
    pub fn with_target(target: SocketAddr) -> Self {
        Self {
            target: Some(target),
        }
    }
}

impl Searcher for SsdpSearcher {
    fn search(&self, window: Duration) -> Result<Vec<Advertisement>, DiscoveryError> {
        let client = match self.target {
            Some(target) => SsdpClient::with_target(target)?,
            None => SsdpClient::new()?,
        };

        let responses = client.search(SSDP_ALL, window)?;
        let total = responses.len();

        let advertisements: Vec<Advertisement> = responses
            .into_iter()
            .map(Advertisement::from)
            .filter(|ad| {
                let keep = ad.is_av_transport();
                if !keep {
                    debug!("Skipping {} at {}", ad.service_type, ad.location);
                }
                keep
            })
            .collect();

        info!(
            "🔎 {} AVTransport advertisement(s) out of {} SSDP response(s)",
            advertisements.len(),
            total
        );
        Ok(advertisements)
    }
}

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use dmrupnp::CONNECTION_MANAGER_SERVICE_ID;
use dmrupnp::description::{DeviceDescription, ParseError};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::discovery::Advertisement;
use crate::transport::{HttpTransport, TransportError};

#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("{0}")]
    Parse(#[from] ParseError),
}

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error(transparent)]
    Description(#[from] DescriptionError),

    #[error("no {} service in device description", CONNECTION_MANAGER_SERVICE_ID)]
    Missing,
}

/// Point de contrôle du service ConnectionManager d'un device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    /// Absolute control URL
    pub control_url: String,
}

/// HTTP-based description provider (UPnP device description.xml).
///
/// Descriptions are cached by URL for the lifetime of the provider, which is
/// one report run: the friendly name and both report blocks reuse the same
/// document.
pub struct DescriptionProvider<'a, T: HttpTransport + ?Sized> {
    transport: &'a T,
    cache: HashMap<String, DeviceDescription>,
}

impl<'a, T: HttpTransport + ?Sized> DescriptionProvider<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self {
            transport,
            cache: HashMap::new(),
        }
    }

    /// Fetch (once) and parse the device description at `location`.
    pub fn description(&mut self, location: &str) -> Result<&DeviceDescription, DescriptionError> {
        match self.cache.entry(location.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let parsed = fetch_and_parse(self.transport, location)?;
                Ok(entry.insert(parsed))
            }
        }
    }

    /// Resolve the ConnectionManager control URL of the device at `location`.
    pub fn extract(&mut self, location: &str) -> Result<ServiceEndpoint, EndpointError> {
        let description = self.description(location)?;

        let service = description
            .find_service(CONNECTION_MANAGER_SERVICE_ID)
            .filter(|s| !s.control_url.is_empty())
            .ok_or(EndpointError::Missing)?;

        let control_url =
            resolve_control_url(location, &service.control_url).map_err(DescriptionError::from)?;
        debug!(
            "ConnectionManager for {}: controlURL={} -> {}",
            location, service.control_url, control_url
        );

        Ok(ServiceEndpoint { control_url })
    }

    /// Display name of an advertised device.
    ///
    /// `friendlyName` of the root device first, then the SSDP `SERVER`
    /// header, then the host of the description URL.
    pub fn friendly_name(&mut self, advertisement: &Advertisement) -> Result<String, DescriptionError> {
        let description = self.description(&advertisement.location)?;
        if let Some(name) = &description.friendly_name {
            return Ok(name.clone());
        }

        debug!(
            "No friendlyName in {}, falling back to SERVER/host",
            advertisement.location
        );
        fallback_name(advertisement)
    }
}

/// Name used when the description gives none (or cannot be read).
pub fn fallback_name(advertisement: &Advertisement) -> Result<String, DescriptionError> {
    if let Some(server) = advertisement
        .server
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return Ok(server.to_string());
    }

    let url = Url::parse(&advertisement.location)?;
    Ok(url
        .host_str()
        .map(str::to_string)
        .unwrap_or_else(|| advertisement.location.clone()))
}

fn fetch_and_parse<T: HttpTransport + ?Sized>(
    transport: &T,
    location: &str,
) -> Result<DeviceDescription, DescriptionError> {
    let url = Url::parse(location)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(DescriptionError::UnsupportedScheme(url.scheme().to_string()));
    }

    debug!("Fetching description at {}", location);
    let response = transport.get(location)?;
    if !response.is_success() {
        return Err(DescriptionError::Status(response.status));
    }

    let xml = String::from_utf8_lossy(&response.body);
    Ok(DeviceDescription::parse(&xml)?)
}

/// Resolve a possibly relative controlURL against the description URL.
///
/// - An absolute `http://` or `https://` URL is returned unchanged.
/// - Anything else is appended to `scheme://authority` of `description_url`,
///   the authority being kept exactly as written (explicit default port
///   included). The description URL's path plays no part.
pub fn resolve_control_url(
    description_url: &str,
    control_url: &str,
) -> Result<String, url::ParseError> {
    let control_url = control_url.trim();

    if let Ok(absolute) = Url::parse(control_url) {
        if matches!(absolute.scheme(), "http" | "https") {
            return Ok(control_url.to_string());
        }
    }

    let description_url = description_url.trim();
    let parsed = Url::parse(description_url)?;

    let rest = description_url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or_default();
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];
    // userinfo never belongs to the origin
    let authority = authority.rsplit_once('@').map_or(authority, |(_, host)| host);

    let base = format!("{}://{}", parsed.scheme(), authority);
    if control_url.starts_with('/') {
        Ok(format!("{}{}", base, control_url))
    } else {
        Ok(format!("{}/{}", base, control_url))
    }
}

//! Assemblage du rapport ProtocolInfo / ConnectionIDs.
//!
//! A report is two blocks joined by [`BLOCK_SEPARATOR`]; both list the same
//! renderers in the same order, so the i-th section of one block and the i-th
//! section of the other are about the same device.

use std::fmt;
use std::time::Duration;

use dmrupnp::soap::pretty_print;
use tracing::{debug, info, warn};

use crate::connection_manager_client::{ConnectionManagerAction, ConnectionManagerClient};
use crate::discovery::{Advertisement, Searcher};
use crate::errors::ReportError;
use crate::provider::{DescriptionProvider, EndpointError, fallback_name};
use crate::transport::HttpTransport;

/// Line closing each device section
pub const SECTION_DELIMITER: &str = "----------";

/// Separator between the ProtocolInfo and the ConnectionIDs blocks
pub const BLOCK_SEPARATOR: &str = "\n~~~~~~~~~~~~~~~\n";

/// What to do when one device fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// The first device error aborts the run
    #[default]
    Abort,
    /// The error text replaces the device's section body and the run goes on
    Inline,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub policy: FailurePolicy,
    /// Re-indent SOAP bodies that parse as XML
    pub pretty_print: bool,
}

/// Renderer découvert : nom affiché et URL de description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renderer {
    pub name: String,
    pub location: String,
}

/// Renderers keyed by name, in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct RendererSet {
    renderers: Vec<Renderer>,
}

impl RendererSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name → location`.
    ///
    /// On a name collision the new location replaces the old one (returned)
    /// and the renderer keeps its original position.
    pub fn insert(&mut self, name: String, location: String) -> Option<String> {
        match self.renderers.iter_mut().find(|r| r.name == name) {
            Some(existing) => Some(std::mem::replace(&mut existing.location, location)),
            None => {
                self.renderers.push(Renderer { name, location });
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Renderer> {
        self.renderers.iter()
    }
}

/// Texte final du rapport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    text: String,
    device_count: usize,
}

impl Report {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Number of renderers in each block
    pub fn device_count(&self) -> usize {
        self.device_count
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn section_header(action: ConnectionManagerAction) -> &'static str {
    match action {
        ConnectionManagerAction::GetProtocolInfo => "Protocol Info",
        ConnectionManagerAction::GetCurrentConnectionIDs => "ConnectionIds",
    }
}

/// Drives one discovery and queries every renderer found.
pub struct ReportAggregator<S, T> {
    searcher: S,
    transport: T,
    options: ReportOptions,
}

impl<S: Searcher, T: HttpTransport> ReportAggregator<S, T> {
    pub fn new(searcher: S, transport: T) -> Self {
        Self {
            searcher,
            transport,
            options: ReportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ReportOptions {
        self.options
    }

    /// Runs one discovery of `window` and builds the report.
    ///
    /// With [`FailurePolicy::Abort`] the first description, endpoint or SOAP
    /// error is returned as-is and no partial report exists.
    pub fn run(&self, window: Duration) -> Result<Report, ReportError> {
        let advertisements = self.searcher.search(window)?;

        let mut provider = DescriptionProvider::new(&self.transport);
        let renderers = self.collect_renderers(&advertisements, &mut provider)?;
        if renderers.is_empty() {
            return Err(ReportError::NoRenderers);
        }
        info!("🎛️ {} Media Renderer(s) to query", renderers.len());

        let mut text = String::new();
        self.write_block(
            &mut text,
            &renderers,
            ConnectionManagerAction::GetProtocolInfo,
            &mut provider,
        )?;
        text.push_str(BLOCK_SEPARATOR);
        self.write_block(
            &mut text,
            &renderers,
            ConnectionManagerAction::GetCurrentConnectionIDs,
            &mut provider,
        )?;

        Ok(Report {
            text,
            device_count: renderers.len(),
        })
    }

    fn collect_renderers(
        &self,
        advertisements: &[Advertisement],
        provider: &mut DescriptionProvider<'_, T>,
    ) -> Result<RendererSet, ReportError> {
        let mut renderers = RendererSet::new();

        for ad in advertisements {
            if !ad.is_av_transport() {
                debug!("Ignoring {} advertisement at {}", ad.service_type, ad.location);
                continue;
            }

            let name = match provider.friendly_name(ad) {
                Ok(name) => name,
                Err(source) if self.options.policy == FailurePolicy::Inline => {
                    warn!("Cannot name device at {}: {}", ad.location, source);
                    fallback_name(ad).unwrap_or_else(|_| ad.location.clone())
                }
                Err(source) => {
                    return Err(ReportError::Description {
                        device: ad.location.clone(),
                        source,
                    });
                }
            };

            debug!("Renderer '{}' at {}", name, ad.location);
            if let Some(previous) = renderers.insert(name.clone(), ad.location.clone()) {
                if previous != ad.location {
                    warn!(
                        "Two renderers named '{}': keeping {} over {}",
                        name, ad.location, previous
                    );
                }
            }
        }

        Ok(renderers)
    }

    fn write_block(
        &self,
        text: &mut String,
        renderers: &RendererSet,
        action: ConnectionManagerAction,
        provider: &mut DescriptionProvider<'_, T>,
    ) -> Result<(), ReportError> {
        for renderer in renderers.iter() {
            let body = match self.query(renderer, action, provider) {
                Ok(body) => body,
                Err(err) if self.options.policy == FailurePolicy::Inline => {
                    warn!("{}", err);
                    format!("[error] {}", err)
                }
                Err(err) => return Err(err),
            };

            text.push_str(section_header(action));
            text.push_str(", Device: ");
            text.push_str(&renderer.name);
            text.push('\n');
            text.push_str(&body);
            text.push('\n');
            text.push_str(SECTION_DELIMITER);
            text.push('\n');
        }
        Ok(())
    }

    fn query(
        &self,
        renderer: &Renderer,
        action: ConnectionManagerAction,
        provider: &mut DescriptionProvider<'_, T>,
    ) -> Result<String, ReportError> {
        let endpoint = provider
            .extract(&renderer.location)
            .map_err(|err| match err {
                EndpointError::Description(source) => ReportError::Description {
                    device: renderer.name.clone(),
                    source,
                },
                EndpointError::Missing => ReportError::EndpointMissing {
                    device: renderer.name.clone(),
                },
            })?;

        let client = ConnectionManagerClient::new(endpoint.control_url);
        let result = client
            .call(&self.transport, action)
            .map_err(|source| ReportError::Soap {
                device: renderer.name.clone(),
                action,
                source,
            })?;
        debug!(
            "{} on '{}': HTTP {} ({} bytes)",
            action,
            renderer.name,
            result.status,
            result.raw_body.len()
        );

        let body = String::from_utf8_lossy(&result.raw_body).into_owned();
        if self.options.pretty_print {
            Ok(pretty_print(&body).unwrap_or(body))
        } else {
            Ok(body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_writer_wins_and_keeps_position() {
        let mut set = RendererSet::new();
        assert_eq!(set.insert("A".into(), "http://a1/".into()), None);
        assert_eq!(set.insert("B".into(), "http://b/".into()), None);
        assert_eq!(
            set.insert("A".into(), "http://a2/".into()),
            Some("http://a1/".to_string())
        );

        let all: Vec<_> = set.iter().cloned().collect();
        assert_eq!(
            all,
            vec![
                Renderer {
                    name: "A".into(),
                    location: "http://a2/".into()
                },
                Renderer {
                    name: "B".into(),
                    location: "http://b/".into()
                },
            ]
        );
    }

    #[test]
    fn test_section_headers() {
        assert_eq!(
            section_header(ConnectionManagerAction::GetProtocolInfo),
            "Protocol Info"
        );
        assert_eq!(
            section_header(ConnectionManagerAction::GetCurrentConnectionIDs),
            "ConnectionIds"
        );
    }
}

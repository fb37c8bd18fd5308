//! # Device description
//!
//! Lecture minimale d'un document de description UPnP (`description.xml`).
//! Seuls `root/device/friendlyName` et les entrées de
//! `root/device/serviceList/service` sont retenus ; les devices embarqués
//! (`deviceList`) et les autres champs sont ignorés.

mod parser;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed description document: {0}")]
    Malformed(String),
}

/// Entrée `<service>` de la liste de services du device racine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceEntry {
    pub service_type: String,
    pub service_id: String,
    pub control_url: String,
}

/// Parsed device description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDescription {
    pub friendly_name: Option<String>,
    pub services: Vec<ServiceEntry>,
}

impl DeviceDescription {
    /// Parse un document de description.
    ///
    /// Any XML error, a document cut short, or a document without a root
    /// element is a [`ParseError`]. A well-formed document that simply lacks
    /// the expected elements parses into an empty description.
    pub fn parse(xml: &str) -> Result<Self, ParseError> {
        parser::parse_description(xml)
    }

    /// First service whose `serviceId` is exactly `service_id`.
    pub fn find_service(&self, service_id: &str) -> Option<&ServiceEntry> {
        self.services.iter().find(|s| s.service_id == service_id)
    }
}

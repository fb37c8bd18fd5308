//! # dmrupnp
//!
//! Briques protocolaires UPnP utilisées par le control point DMRInfo :
//!
//! - [`ssdp`] : client SSDP (M-SEARCH et collecte des réponses unicast)
//! - [`description`] : lecture des documents de description des devices
//! - [`soap`] : construction des enveloppes SOAP de requête

pub mod description;
pub mod soap;
pub mod ssdp;

/// Service type used to recognise playback-capable renderers during discovery.
pub const AV_TRANSPORT_SERVICE_TYPE: &str = "urn:schemas-upnp-org:service:AVTransport:1";

/// Service type of the ConnectionManager service queried on each renderer.
pub const CONNECTION_MANAGER_SERVICE_TYPE: &str =
    "urn:schemas-upnp-org:service:ConnectionManager:1";

/// Stable `serviceId` of the ConnectionManager service in device descriptions.
pub const CONNECTION_MANAGER_SERVICE_ID: &str = "urn:upnp-org:serviceId:ConnectionManager";

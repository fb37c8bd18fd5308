//! # Module SOAP
//!
//! Construction des requêtes SOAP envoyées aux services UPnP, et mise en
//! forme optionnelle des réponses pour l'affichage.
//!
//! Les réponses ne sont jamais interprétées ici : le control point les
//! restitue telles quelles.
//!
//! ## Example
//!
//! ```
//! use dmrupnp::soap::{build_soap_request, soap_action_header};
//!
//! let urn = "urn:schemas-upnp-org:service:ConnectionManager:1";
//! let body = build_soap_request(urn, "GetProtocolInfo");
//! assert!(body.contains("<u:GetProtocolInfo xmlns:u=\"urn:schemas-upnp-org:service:ConnectionManager:1\"/>"));
//! assert_eq!(
//!     soap_action_header(urn, "GetProtocolInfo"),
//!     "\"urn:schemas-upnp-org:service:ConnectionManager:1#GetProtocolInfo\""
//! );
//! ```

mod builder;
mod pretty;

pub use builder::{build_soap_request, soap_action_header};
pub use pretty::pretty_print;

/// Namespace de l'enveloppe SOAP 1.1
pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Style d'encodage imposé par UPnP
pub const SOAP_ENCODING_STYLE: &str = "http://schemas.xmlsoap.org/soap/encoding/";

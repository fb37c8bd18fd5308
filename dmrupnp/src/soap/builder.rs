//! Construction de requêtes SOAP

use super::{SOAP_ENCODING_STYLE, SOAP_ENVELOPE_NS};

/// Construit le corps d'une requête SOAP UPnP sans argument.
///
/// The layout is fixed byte for byte: some renderers compare the prolog and
/// the envelope attributes literally, so the document is not produced by a
/// generic XML writer.
///
/// # Arguments
///
/// * `service_urn` - URN du service (ex: "urn:schemas-upnp-org:service:ConnectionManager:1")
/// * `action` - Nom de l'action (ex: "GetProtocolInfo")
pub fn build_soap_request(service_urn: &str, action: &str) -> String {
    format!(
        "<?xml version='1.0' encoding='utf-8'?>\n\
         <s:Envelope xmlns:s=\"{SOAP_ENVELOPE_NS}\"\n            \
         s:encodingStyle=\"{SOAP_ENCODING_STYLE}\">\n  \
         <s:Body>\n    \
         <u:{action} xmlns:u=\"{service_urn}\"/>\n  \
         </s:Body>\n\
         </s:Envelope>\n"
    )
}

/// Valeur de l'en-tête `SOAPAction` : `"urn#Action"`, guillemets compris.
pub fn soap_action_header(service_urn: &str, action: &str) -> String {
    format!(r#""{}#{}""#, service_urn, action)
}

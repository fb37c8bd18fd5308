use dmrupnp::soap::{build_soap_request, soap_action_header};
use tracing::debug;

use crate::transport::{HttpTransport, TransportError};

/// Result of a SOAP call:
/// - HTTP status code
/// - raw body, exactly as received
pub struct SoapCallResult {
    pub status: u16,
    pub raw_body: Vec<u8>,
}

impl SoapCallResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Invoke an argument-less UPnP SOAP action on a control URL.
///
/// - `control_url`: full HTTP URL of the service control endpoint
/// - `service_type`: service URN, e.g. "urn:schemas-upnp-org:service:ConnectionManager:1"
/// - `action`: action name, e.g. "GetProtocolInfo"
///
/// Non-2xx answers are returned as `Ok`: their body usually is a SOAP Fault
/// worth showing.
pub fn invoke_upnp_action<T: HttpTransport + ?Sized>(
    transport: &T,
    control_url: &str,
    service_type: &str,
    action: &str,
) -> Result<SoapCallResult, TransportError> {
    let body_xml = build_soap_request(service_type, action);
    let soap_action = soap_action_header(service_type, action);

    let headers = [
        ("SOAPAction", soap_action.as_str()),
        ("Content-Type", "text/xml"),
        ("charset", "utf-8"),
        ("Connection", "close"),
    ];

    debug!("📨 POST {} SOAPAction={}", control_url, soap_action);
    let response = transport.post(control_url, &headers, &body_xml)?;

    let result = SoapCallResult {
        status: response.status,
        raw_body: response.body,
    };
    if !result.is_success() {
        debug!(
            "{} on {} answered HTTP {}, body kept verbatim",
            action, control_url, result.status
        );
    }

    Ok(result)
}

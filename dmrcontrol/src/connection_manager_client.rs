use std::fmt;

use dmrupnp::CONNECTION_MANAGER_SERVICE_TYPE;

use crate::soap_client::{SoapCallResult, invoke_upnp_action};
use crate::transport::{HttpTransport, TransportError};

/// Actions ConnectionManager interrogées par le rapport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionManagerAction {
    GetProtocolInfo,
    GetCurrentConnectionIDs,
}

impl ConnectionManagerAction {
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionManagerAction::GetProtocolInfo => "GetProtocolInfo",
            ConnectionManagerAction::GetCurrentConnectionIDs => "GetCurrentConnectionIDs",
        }
    }
}

impl fmt::Display for ConnectionManagerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionManagerClient {
    pub control_url: String,
    pub service_type: String,
}

impl ConnectionManagerClient {
    /// Client for `ConnectionManager:1` at `control_url`
    pub fn new(control_url: String) -> Self {
        Self {
            control_url,
            service_type: CONNECTION_MANAGER_SERVICE_TYPE.to_string(),
        }
    }

    pub fn call<T: HttpTransport + ?Sized>(
        &self,
        transport: &T,
        action: ConnectionManagerAction,
    ) -> Result<SoapCallResult, TransportError> {
        invoke_upnp_action(transport, &self.control_url, &self.service_type, action.name())
    }

    /// GetProtocolInfo
    pub fn get_protocol_info<T: HttpTransport + ?Sized>(
        &self,
        transport: &T,
    ) -> Result<SoapCallResult, TransportError> {
        self.call(transport, ConnectionManagerAction::GetProtocolInfo)
    }

    /// GetCurrentConnectionIDs
    pub fn get_current_connection_ids<T: HttpTransport + ?Sized>(
        &self,
        transport: &T,
    ) -> Result<SoapCallResult, TransportError> {
        self.call(transport, ConnectionManagerAction::GetCurrentConnectionIDs)
    }
}

use thiserror::Error;

use crate::connection_manager_client::ConnectionManagerAction;
use crate::discovery::DiscoveryError;
use crate::provider::DescriptionError;
use crate::transport::TransportError;

/// Every way a report run can end without a report.
///
/// `device` is the friendly name once known, the description URL before.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("No available Media Renderers")]
    NoRenderers,

    #[error("Device description of {device} unusable: {source}")]
    Description {
        device: String,
        #[source]
        source: DescriptionError,
    },

    #[error("Device {device} exposes no ConnectionManager service")]
    EndpointMissing { device: String },

    #[error("{action} failed on {device}: {source}")]
    Soap {
        device: String,
        action: ConnectionManagerAction,
        #[source]
        source: TransportError,
    },
}

impl ReportError {
    /// Device the error is about, when there is one
    pub fn device(&self) -> Option<&str> {
        match self {
            ReportError::Description { device, .. }
            | ReportError::EndpointMissing { device }
            | ReportError::Soap { device, .. } => Some(device),
            ReportError::Discovery(_) | ReportError::NoRenderers => None,
        }
    }
}

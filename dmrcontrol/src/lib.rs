//! # dmrcontrol
//!
//! Control point DMRInfo : découverte SSDP des renderers AVTransport, lecture
//! de leur description, appels `GetProtocolInfo` / `GetCurrentConnectionIDs`
//! sur leur ConnectionManager et assemblage du rapport texte.
//!
//! ```no_run
//! use std::time::Duration;
//! use dmrcontrol::{ReportAggregator, SsdpSearcher, UreqTransport};
//!
//! let aggregator = ReportAggregator::new(SsdpSearcher::new(), UreqTransport::default());
//! let report = aggregator.run(Duration::from_secs(2))?;
//! println!("{}", report);
//! # Ok::<(), dmrcontrol::ReportError>(())
//! ```

pub mod connection_manager_client;
pub mod discovery;
pub mod errors;
pub mod provider;
pub mod report;
pub mod soap_client;
pub mod transport;

pub use connection_manager_client::{ConnectionManagerAction, ConnectionManagerClient};
pub use discovery::{Advertisement, DiscoveryError, Searcher, SsdpSearcher};
pub use errors::ReportError;
pub use provider::{
    DescriptionError, DescriptionProvider, EndpointError, ServiceEndpoint, resolve_control_url,
};
pub use report::{
    FailurePolicy, Renderer, RendererSet, Report, ReportAggregator, ReportOptions,
};
pub use soap_client::{SoapCallResult, invoke_upnp_action};
pub use transport::{HttpResponse, HttpTransport, TransportError, UreqTransport};

//! Download engine for modelvault.
//!
//! Given the set of missing catalog assets, the engine downloads each one
//! sequentially over one of two interchangeable transports (chosen once per
//! campaign from the proxy environment), writes through a sibling temp file,
//! and renames atomically into place. The coordinator wraps the engine with
//! single-flight semantics: at most one campaign runs at a time and
//! concurrent callers share the in-flight result.

pub mod coordinator;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod runtime_push;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::DownloadCoordinator;
pub use engine::DownloadEngine;
pub use error::{DownloadError, DownloadResult};
pub use fetch::{MAX_REDIRECTS, PART_SUFFIX, fetch_to_path, part_path};
pub use runtime_push::HttpRuntimePush;
pub use transport::{
    NativeTransport, ProxiedTransport, Transport, TransportResponse, proxy_from_env,
    select_transport,
};

#[cfg(test)]
use tokio_test as _;

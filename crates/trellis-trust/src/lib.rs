//! Trellis Trust — issuer trust registries.
//!
//! Every backend keeps a snapshot-swapped cache that answers `is_trusted`
//! without I/O; `refresh` reloads it from the backend's source.
//! [`MultiSourceTrustRegistry`] combines backends and [`TrustListValidator`]
//! turns membership into a pass / fail check.

pub mod builder;
pub mod chain;
pub mod directory;
pub mod dns;
pub mod document_store;
pub mod error;
pub mod http;
pub mod local;
pub mod multi;
pub mod registry;
pub mod trust_set;
pub mod validator;

pub use builder::{build_backend, build_registry};
#[cfg(feature = "ethereum")]
pub use chain::EthersViewCaller;
pub use chain::{ChainTrustSource, ViewCaller};
pub use directory::DirectoryTrustSource;
pub use dns::{parse_txt_tokens, DnsTrustSource, DohTxtLookup, TxtLookup};
pub use document_store::DocumentStoreTrustSource;
pub use error::TrustRegistryError;
pub use http::HttpTrustSource;
pub use local::LocalTrustRegistry;
pub use multi::{MultiSourceTrustRegistry, RefreshReport};
pub use registry::{SourceTrustRegistry, TrustRegistry, TrustSource};
pub use trust_set::TrustSet;
pub use validator::TrustListValidator;

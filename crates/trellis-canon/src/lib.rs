//! Trellis Canon — JSON-LD to RDF conversion and URDNA2015 canonical
//! N-Quads, used as the signing input of Linked-Data proofs.

pub mod context;
pub mod error;
pub mod rdf;
pub mod service;
pub mod to_rdf;
pub mod urdna2015;

pub use context::{ActiveContext, ContextRegistry};
pub use error::CanonicalizationError;
pub use rdf::{Dataset, Literal, Quad, Term};
pub use service::{CanonicalizationService, Urdna2015Canonicalizer};
pub use to_rdf::to_rdf;
pub use urdna2015::{normalize, normalize_with_limit, DEFAULT_STEP_LIMIT};

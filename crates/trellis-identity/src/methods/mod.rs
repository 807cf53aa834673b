//! Built-in DID methods.

pub mod key;
pub mod peer;
pub mod web;

pub use key::{did_key_document, did_key_for, DidKeyMethod};
pub use peer::{did_peer_document, did_peer_for, DidPeerMethod};
pub use web::{document_url, DidWebMethod};

/// Canonicalization errors.
#[derive(Debug, thiserror::Error)]
pub enum CanonicalizationError {
    #[error("canonicalization input is empty")]
    EmptyInput,

    #[error("malformed JSON-LD: {0}")]
    Malformed(String),

    #[error("invalid term {term}: {reason}")]
    InvalidTerm { term: String, reason: String },

    #[error("invalid IRI: {0}")]
    InvalidIri(String),

    #[error("invalid context: {0}")]
    InvalidContext(String),

    #[error("unsupported JSON-LD keyword: {0}")]
    UnsupportedKeyword(String),

    #[error("blank node graph too complex to canonicalize within {limit} steps")]
    TooComplex { limit: usize },

    #[error("blank node {0} was never issued a canonical label")]
    MissingIdentifier(String),
}

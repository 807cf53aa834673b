use async_trait::async_trait;
use serde_json::Value;
use trellis_core::{Did, DidDocument};

use crate::error::DidResolutionError;

/// A DID method: resolution plus optional lifecycle operations.
///
/// `options` are opaque per-method parameters. Methods that cannot write
/// keep the default implementations, which fail with
/// [`DidResolutionError::OperationNotSupported`].
#[async_trait]
pub trait DidMethod: Send + Sync {
    /// Method name as it appears in `did:<name>:...`.
    fn name(&self) -> &str;

    async fn resolve(&self, did: &Did) -> Result<DidDocument, DidResolutionError>;

    async fn create(&self, _options: &Value) -> Result<DidDocument, DidResolutionError> {
        Err(unsupported(self.name(), "create"))
    }

    async fn update(
        &self,
        _did: &Did,
        _options: &Value,
    ) -> Result<DidDocument, DidResolutionError> {
        Err(unsupported(self.name(), "update"))
    }

    async fn deactivate(&self, _did: &Did, _options: &Value) -> Result<(), DidResolutionError> {
        Err(unsupported(self.name(), "deactivate"))
    }
}

fn unsupported(method: &str, operation: &str) -> DidResolutionError {
    DidResolutionError::OperationNotSupported {
        method: method.to_string(),
        operation: operation.to_string(),
    }
}

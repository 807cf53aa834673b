//! Trust list read from a smart contract view function.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TrustRegistryError;
use crate::registry::TrustSource;

/// Calls a nullary view function returning `string[]`.
#[async_trait]
pub trait ViewCaller: Send + Sync {
    async fn call_string_array(&self, function: &str) -> Result<Vec<String>, TrustRegistryError>;
}

/// Trusted issuers returned by an on-chain registry contract.
#[derive(Clone)]
pub struct ChainTrustSource {
    caller: Arc<dyn ViewCaller>,
    function: String,
}

impl ChainTrustSource {
    pub fn new(caller: Arc<dyn ViewCaller>, function: impl Into<String>) -> Self {
        Self {
            caller,
            function: function.into(),
        }
    }
}

#[async_trait]
impl TrustSource for ChainTrustSource {
    fn name(&self) -> &str {
        "chain"
    }

    async fn fetch(&self) -> Result<HashSet<String>, TrustRegistryError> {
        let issuers = self.caller.call_string_array(&self.function).await?;
        Ok(issuers
            .into_iter()
            .map(|did| did.trim().to_string())
            .filter(|did| !did.is_empty())
            .collect())
    }
}

#[cfg(feature = "ethereum")]
pub use self::ethereum::EthersViewCaller;

#[cfg(feature = "ethereum")]
mod ethereum {
    use std::sync::Arc;

    use async_trait::async_trait;
    use ethers::abi::parse_abi;
    use ethers::contract::Contract;
    use ethers::providers::{Http, Provider};
    use ethers::types::Address;

    use super::ViewCaller;
    use crate::error::TrustRegistryError;

    /// [`ViewCaller`] over JSON-RPC with `ethers`.
    pub struct EthersViewCaller {
        provider: Arc<Provider<Http>>,
        address: Address,
    }

    impl EthersViewCaller {
        pub fn new(rpc_url: &str, contract: &str) -> Result<Self, TrustRegistryError> {
            let provider = Provider::<Http>::try_from(rpc_url)
                .map_err(|e| TrustRegistryError::Config(format!("rpc url {rpc_url}: {e}")))?;
            let address = contract
                .parse::<Address>()
                .map_err(|e| TrustRegistryError::Config(format!("contract {contract}: {e}")))?;
            Ok(Self {
                provider: Arc::new(provider),
                address,
            })
        }
    }

    #[async_trait]
    impl ViewCaller for EthersViewCaller {
        async fn call_string_array(&self, function: &str) -> Result<Vec<String>, TrustRegistryError> {
            let chain_error = |reason: String| TrustRegistryError::Chain {
                function: function.to_string(),
                reason,
            };
            let signature = format!("function {function}() external view returns (string[])");
            let abi = parse_abi(&[signature.as_str()]).map_err(|e| chain_error(e.to_string()))?;
            let contract = Contract::new(self.address, abi, self.provider.clone());
            contract
                .method::<_, Vec<String>>(function, ())
                .map_err(|e| chain_error(e.to_string()))?
                .call()
                .await
                .map_err(|e| chain_error(e.to_string()))
        }
    }
}

//! Networks a session may be bound to.

use serde::{Deserialize, Serialize};

pub type ChainId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub chain_id: ChainId,
    pub name: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer: Option<String>,
}

impl Network {
    pub fn new(chain_id: ChainId, name: impl Into<String>, currency: impl Into<String>) -> Self {
        Self { chain_id, name: name.into(), currency: currency.into(), explorer: None }
    }
    pub fn with_explorer(mut self, url: impl Into<String>) -> Self { self.explorer = Some(url.into()); self }

    pub fn mainnet() -> Self { Self::new(1, "Ethereum", "ETH").with_explorer("https://etherscan.io/") }
    pub fn bsc() -> Self { Self::new(56, "BNB Smart Chain", "BNB").with_explorer("https://bscscan.com/") }
    pub fn bsc_testnet() -> Self { Self::new(97, "BNB Smart Chain Testnet", "tBNB").with_explorer("https://testnet.bscscan.com/") }
    pub fn sepolia() -> Self { Self::new(11_155_111, "Sepolia Testnet", "SepoliaETH").with_explorer("https://sepolia.etherscan.io/") }

    /// CAIP-2 identifier, e.g. `eip155:97`.
    pub fn caip_id(&self) -> String { format!("eip155:{}", self.chain_id) }

    pub fn builtin() -> Vec<Self> { vec![Self::mainnet(), Self::bsc(), Self::bsc_testnet(), Self::sepolia()] }
}

/// Lookup over the configured network set.
pub fn find(networks: &[Network], chain_id: ChainId) -> Option<&Network> {
    networks.iter().find(|n| n.chain_id == chain_id)
}

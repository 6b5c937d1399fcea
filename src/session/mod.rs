//! Session record: the durable proof that an account authenticated on a chain.

use crate::core::address::Address;
use crate::core::network::ChainId;
use serde::{Deserialize, Serialize};

/// Persisted as `{"account": .., "chainId": .., "shortAddress": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub account: Address,
    pub chain_id: ChainId,
    pub short_address: String,
}

impl SessionRecord {
    pub fn new(account: Address, chain_id: ChainId) -> Self {
        let short_address = account.short();
        Self { account, chain_id, short_address }
    }

    pub fn matches(&self, account: &Address, chain_id: ChainId) -> bool {
        self.account == *account && self.chain_id == chain_id
    }
}

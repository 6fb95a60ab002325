//! Target network parameters and the read/write seams to the badge contract.

use crate::eth::{self, AbiError, Address, TxHash};
use crate::rpc::{RpcClient, RpcError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Native currency metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

/// Constant configuration for one target network.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainConfig {
    pub id: u64,
    pub name: &'static str,
    pub native_currency: NativeCurrency,
    pub rpc_urls: &'static [&'static str],
    pub explorer_name: &'static str,
    pub explorer_url: &'static str,
}

pub const OPN_TESTNET: ChainConfig = ChainConfig {
    id: 984,
    name: "OPN Testnet",
    native_currency: NativeCurrency {
        name: "OPN",
        symbol: "OPN",
        decimals: 18,
    },
    rpc_urls: &["https://testnet-rpc.iopn.tech"],
    explorer_name: "OPN Testnet Explorer",
    explorer_url: "https://testnet.iopn.tech",
};

/// Chain home page, linked from the Video and Claim screens.
pub const CHAIN_HOME_URL: &str = "https://chain.iopn.io/";
/// Test token faucet.
pub const FAUCET_URL: &str = "https://faucet.iopn.tech/";

impl ChainConfig {
    /// Chain id in the `0x`-prefixed form wallets expect.
    pub fn hex_id(&self) -> String {
        format!("{:#x}", self.id)
    }

    /// Explorer page for a transaction.
    pub fn tx_url(&self, hash: &TxHash) -> String {
        format!("{}/tx/{}", self.explorer_url, hash)
    }

    /// Parameters for `wallet_addEthereumChain` (EIP-3085).
    pub fn add_chain_params(&self) -> serde_json::Value {
        serde_json::json!({
            "chainId": self.hex_id(),
            "chainName": self.name,
            "nativeCurrency": self.native_currency,
            "rpcUrls": self.rpc_urls,
            "blockExplorerUrls": [self.explorer_url],
        })
    }
}

/// The badge contract's functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractCall {
    Claim,
    BalanceOf(Address),
    ClaimOpen,
}

impl ContractCall {
    pub fn signature(&self) -> &'static str {
        match self {
            ContractCall::Claim => "claim()",
            ContractCall::BalanceOf(_) => "balanceOf(address)",
            ContractCall::ClaimOpen => "claimOpen()",
        }
    }

    /// ABI-encoded call data.
    pub fn calldata(&self) -> Vec<u8> {
        let mut data = eth::selector(self.signature()).to_vec();
        if let ContractCall::BalanceOf(owner) = self {
            data.extend_from_slice(&eth::encode_address(owner));
        }
        data
    }
}

/// Decoded result of a contract read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadValue {
    Bool(bool),
    Uint(u128),
    Unit,
}

/// Outcome recorded in a mined transaction's receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    pub block_number: u64,
    pub status: ReceiptStatus,
}

/// Chain access errors.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("Malformed contract response: {0}")]
    Abi(#[from] AbiError),

    #[error("{0}")]
    Other(String),
}

impl ChainError {
    /// Name of the contract custom error carried by this failure, if any.
    pub fn contract_error(&self) -> Option<&'static str> {
        match self {
            ChainError::Rpc(e) => e.revert_data().and_then(|d| eth::decode_revert(&d)),
            _ => None,
        }
    }
}

/// Read-only access to the badge contract.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn read(&self, call: ContractCall) -> Result<ReadValue, ChainError>;

    /// Receipt of a transaction, `None` while it is not yet included.
    async fn receipt(&self, hash: &TxHash) -> Result<Option<TxReceipt>, ChainError>;

    async fn claim_open(&self) -> Result<bool, ChainError> {
        match self.read(ContractCall::ClaimOpen).await? {
            ReadValue::Bool(open) => Ok(open),
            other => Err(ChainError::Other(format!("claimOpen returned {:?}", other))),
        }
    }

    async fn balance_of(&self, owner: Address) -> Result<u128, ChainError> {
        match self.read(ContractCall::BalanceOf(owner)).await? {
            ReadValue::Uint(balance) => Ok(balance),
            other => Err(ChainError::Other(format!("balanceOf returned {:?}", other))),
        }
    }
}

/// Signed write access to the badge contract.
#[async_trait]
pub trait ChainWriter: Send + Sync {
    async fn write(&self, call: ContractCall) -> Result<TxHash, ChainError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: TxHash,
    block_number: Option<String>,
    status: Option<String>,
}

fn parse_quantity(s: &str) -> Result<u64, ChainError> {
    u64::from_str_radix(s.trim_start_matches("0x"), 16)
        .map_err(|e| ChainError::Other(format!("bad quantity {:?}: {}", s, e)))
}

impl RawReceipt {
    fn into_receipt(self) -> Result<Option<TxReceipt>, ChainError> {
        // Pending receipts (some nodes return them) have no block yet.
        let Some(block) = self.block_number else {
            return Ok(None);
        };
        let status = match self.status.as_deref().map(parse_quantity).transpose()? {
            Some(1) => ReceiptStatus::Success,
            Some(0) => ReceiptStatus::Reverted,
            other => {
                return Err(ChainError::Other(format!(
                    "unknown receipt status {:?}",
                    other
                )))
            }
        };
        Ok(Some(TxReceipt {
            transaction_hash: self.transaction_hash,
            block_number: parse_quantity(&block)?,
            status,
        }))
    }
}

/// `ChainReader` over the chain's public JSON-RPC endpoint.
#[derive(Clone)]
pub struct RpcReader {
    rpc: RpcClient,
    contract: Address,
}

impl RpcReader {
    pub fn new(rpc: RpcClient, contract: Address) -> Self {
        Self { rpc, contract }
    }
}

#[async_trait]
impl ChainReader for RpcReader {
    async fn read(&self, call: ContractCall) -> Result<ReadValue, ChainError> {
        let tx = serde_json::json!({
            "to": self.contract,
            "data": eth::encode_hex(&call.calldata()),
        });
        let out: String = self.rpc.call("eth_call", (tx, "latest")).await?;
        let bytes = eth::decode_hex(&out)?;
        Ok(match call {
            ContractCall::ClaimOpen => ReadValue::Bool(eth::decode_bool(&bytes)?),
            ContractCall::BalanceOf(_) => ReadValue::Uint(eth::decode_uint(&bytes)?),
            ContractCall::Claim => ReadValue::Unit,
        })
    }

    async fn receipt(&self, hash: &TxHash) -> Result<Option<TxReceipt>, ChainError> {
        let raw: Option<RawReceipt> = self
            .rpc
            .call("eth_getTransactionReceipt", [hash])
            .await?;
        match raw {
            Some(raw) => raw.into_receipt(),
            None => Ok(None),
        }
    }
}

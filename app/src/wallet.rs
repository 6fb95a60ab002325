//! Wallet session: connection to an external EIP-1193 style wallet.
//!
//! Keys never live in this process. The wallet endpoint (a browser-extension
//! bridge, a desktop signer, or a dev node with unlocked accounts) owns the
//! accounts and signs whatever we ask it to send.

use crate::chain::{ChainConfig, ChainError, ChainWriter, ContractCall};
use crate::eth::{self, Address, TxHash};
use crate::rpc::{RpcClient, RpcError};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// EIP-1193 "user rejected request".
pub const USER_REJECTED: i64 = 4001;
/// EIP-3326 "unrecognized chain id": the wallet must be told about the chain first.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

/// Wallet errors.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("User rejected the request")]
    Rejected,

    #[error("No wallet connected")]
    NoAccounts,

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl WalletError {
    fn from_rpc(err: RpcError) -> Self {
        if err.code() == Some(USER_REJECTED) {
            WalletError::Rejected
        } else {
            WalletError::Rpc(err)
        }
    }
}

impl From<WalletError> for ChainError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::Rpc(e) => ChainError::Rpc(e),
            other => ChainError::Other(other.to_string()),
        }
    }
}

/// The external wallet session provider.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the wallet for account access (login).
    async fn connect(&self) -> Result<Vec<Address>, WalletError>;

    /// Drop account access (logout).
    async fn disconnect(&self) -> Result<(), WalletError>;

    async fn switch_chain(&self, chain: &ChainConfig) -> Result<(), WalletError>;

    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Vec<u8>,
    ) -> Result<TxHash, WalletError>;
}

/// `WalletProvider` over a JSON-RPC wallet endpoint.
pub struct RpcWallet {
    rpc: RpcClient,
}

impl RpcWallet {
    /// The app id identifies this dApp to wallets that gate access per application.
    pub fn new(url: impl Into<String>, app_id: &str) -> Self {
        Self {
            rpc: RpcClient::new(url).with_header("X-App-Id", app_id),
        }
    }
}

#[async_trait]
impl WalletProvider for RpcWallet {
    async fn connect(&self) -> Result<Vec<Address>, WalletError> {
        let accounts: Vec<Address> = self
            .rpc
            .call("eth_requestAccounts", serde_json::json!([]))
            .await
            .map_err(WalletError::from_rpc)?;
        if accounts.is_empty() {
            return Err(WalletError::NoAccounts);
        }
        Ok(accounts)
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.rpc
            .call::<serde_json::Value, _>(
                "wallet_revokePermissions",
                [serde_json::json!({ "eth_accounts": {} })],
            )
            .await
            .map_err(WalletError::from_rpc)?;
        Ok(())
    }

    async fn switch_chain(&self, chain: &ChainConfig) -> Result<(), WalletError> {
        let switch = self
            .rpc
            .call::<serde_json::Value, _>(
                "wallet_switchEthereumChain",
                [serde_json::json!({ "chainId": chain.hex_id() })],
            )
            .await;

        match switch {
            Ok(_) => Ok(()),
            Err(e) if e.code() == Some(UNRECOGNIZED_CHAIN) => {
                tracing::info!(chain_id = chain.id, "wallet does not know chain, adding it");
                self.rpc
                    .call::<serde_json::Value, _>(
                        "wallet_addEthereumChain",
                        [chain.add_chain_params()],
                    )
                    .await
                    .map_err(WalletError::from_rpc)?;
                Ok(())
            }
            Err(e) => Err(WalletError::from_rpc(e)),
        }
    }

    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Vec<u8>,
    ) -> Result<TxHash, WalletError> {
        let tx = serde_json::json!({
            "from": from,
            "to": to,
            "data": eth::encode_hex(&data),
        });
        self.rpc
            .call("eth_sendTransaction", [tx])
            .await
            .map_err(WalletError::from_rpc)
    }
}

/// One connected wallet account.
#[derive(Clone)]
pub struct WalletHandle {
    pub address: Address,
    provider: Arc<dyn WalletProvider>,
}

impl fmt::Debug for WalletHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletHandle")
            .field("address", &self.address)
            .finish()
    }
}

impl PartialEq for WalletHandle {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && Arc::ptr_eq(&self.provider, &other.provider)
    }
}

impl WalletHandle {
    pub fn new(address: Address, provider: Arc<dyn WalletProvider>) -> Self {
        Self { address, provider }
    }

    /// Signing transport for transactions to `contract` from this account.
    pub fn signer(&self, contract: Address) -> WalletWriter {
        WalletWriter {
            from: self.address,
            contract,
            provider: self.provider.clone(),
        }
    }

    pub async fn switch_chain(&self, chain: &ChainConfig) -> Result<(), WalletError> {
        self.provider.switch_chain(chain).await
    }
}

/// `ChainWriter` that has the wallet sign and send each call.
pub struct WalletWriter {
    from: Address,
    contract: Address,
    provider: Arc<dyn WalletProvider>,
}

#[async_trait]
impl ChainWriter for WalletWriter {
    async fn write(&self, call: ContractCall) -> Result<TxHash, ChainError> {
        tracing::info!(from = %self.from, call = call.signature(), "sending transaction");
        Ok(self
            .provider
            .send_transaction(self.from, self.contract, call.calldata())
            .await?)
    }
}

/// Authentication state supplied by the wallet provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub authenticated: bool,
    pub wallets: Vec<WalletHandle>,
}

impl Session {
    /// Session after a successful login.
    pub fn login(accounts: Vec<Address>, provider: Arc<dyn WalletProvider>) -> Self {
        let wallets = accounts
            .into_iter()
            .map(|address| WalletHandle::new(address, provider.clone()))
            .collect();
        Self {
            authenticated: true,
            wallets,
        }
    }

    /// Clear the session (logout).
    pub fn logout(&mut self) {
        self.authenticated = false;
        self.wallets.clear();
    }

    /// The wallet the app acts on.
    pub fn primary(&self) -> Option<&WalletHandle> {
        self.wallets.first()
    }

    pub fn primary_address(&self) -> Option<Address> {
        self.primary().map(|w| w.address)
    }
}

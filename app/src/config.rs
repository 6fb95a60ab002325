//! Configuration: runtime settings and the small persisted state file.

use crate::eth::Address;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_WALLET_APP_ID: &str = "YOUR_PRIVY_APP_ID";
pub const DEFAULT_VIDEO_URL: &str = "/assets/video.mp4";
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0xBc5C49AbC5282994Bd2c641438391D5E2e730c25";
pub const DEFAULT_WALLET_URL: &str = "http://127.0.0.1:1248";

/// Runtime settings, resolved from the command line and environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Identifies this app to the wallet provider.
    pub wallet_app_id: String,
    pub video_url: String,
    pub contract_address: Address,
    /// EIP-1193 style JSON-RPC wallet endpoint.
    pub wallet_url: String,
    /// Chain RPC endpoint for reads and receipts.
    pub rpc_url: String,
}

impl Settings {
    pub fn new(
        wallet_app_id: String,
        video_url: String,
        contract_address: &str,
        wallet_url: String,
        rpc_url: String,
    ) -> Result<Self> {
        let contract_address = contract_address
            .parse()
            .with_context(|| format!("invalid contract address {:?}", contract_address))?;
        Ok(Self {
            wallet_app_id,
            video_url,
            contract_address,
            wallet_url,
            rpc_url,
        })
    }

    pub fn has_placeholder_app_id(&self) -> bool {
        self.wallet_app_id == DEFAULT_WALLET_APP_ID
    }
}

/// State persisted across restarts. Only the navigation fragment lives here;
/// the wallet session is never written to disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    /// Last navigation fragment (`""`, `"video"`, `"claim"`).
    #[serde(default)]
    pub fragment: String,
}

impl AppConfig {
    /// Directory holding the state file and logs.
    pub fn dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("genesis-badge")
    }

    /// Get the config file path.
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load config from disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to disk.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

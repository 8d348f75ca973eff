use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::http::{build_client, DEFAULT_TIMEOUT};
use crate::psp::{LygosGateway, MockGateway, MoneyFusionGateway, PaymentGateway, PaymentStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum GatewayConfig {
    Lygos {
        api_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        shop_name: Option<String>,
    },
    MoneyFusion {
        api_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status_url: Option<String>,
    },
    Mock {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<PaymentStatus>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdkConfig {
    /// Per-request timeout applied to every gateway.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub gateways: Vec<GatewayConfig>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            gateways: Vec::new(),
        }
    }
}

impl SdkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `<config dir>/pay-sdk/config.json`, or `./config.json` when the platform
/// has no config directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("pay-sdk"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.json")
}

pub fn load_config(path: &Path) -> Result<SdkConfig> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}

pub fn save_config(path: &Path, config: &SdkConfig) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let data = serde_json::to_string_pretty(config)?;
    std::fs::write(path, data).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn build_gateway(cfg: &GatewayConfig, client: reqwest::Client) -> Arc<dyn PaymentGateway> {
    match cfg {
        GatewayConfig::Lygos {
            api_key,
            base_url,
            shop_name,
        } => {
            let mut gateway = LygosGateway::with_client(api_key.clone(), client);
            if let Some(url) = base_url {
                gateway = gateway.with_base_url(url.clone());
            }
            if let Some(name) = shop_name {
                gateway = gateway.with_shop_name(name.clone());
            }
            Arc::new(gateway)
        }
        GatewayConfig::MoneyFusion {
            api_url,
            status_url,
        } => {
            let mut gateway = MoneyFusionGateway::with_client(api_url.clone(), client);
            if let Some(url) = status_url {
                gateway = gateway.with_status_url(url.clone());
            }
            Arc::new(gateway)
        }
        GatewayConfig::Mock { status } => {
            Arc::new(MockGateway::with_status(status.unwrap_or(PaymentStatus::Paid)))
        }
    }
}

/// Build every configured gateway, all sharing one HTTP client.
pub fn build_gateways(config: &SdkConfig) -> Result<Vec<Arc<dyn PaymentGateway>>> {
    let client = build_client(config.timeout()).context("building HTTP client")?;
    let gateways: Vec<_> = config
        .gateways
        .iter()
        .map(|cfg| build_gateway(cfg, client.clone()))
        .collect();
    tracing::debug!(count = gateways.len(), "gateways configured");
    Ok(gateways)
}

use std::path::PathBuf;

use serde::Deserialize;

use crate::{retry::RetryPolicy, ItemId};

const EMBEDDED: &str = include_str!("../config.yaml");

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the price API, the item id gets appended as the last path segment
    pub endpoint: String,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub transport: TransportConfig,
    pub items: Vec<ItemId>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum TransportConfig {
    Direct {
        #[serde(default = "default_user_agent")]
        user_agent: String,
    },
    Rotating {
        relays: Vec<String>,
        #[serde(default)]
        user_agents: Vec<String>,
        #[serde(default = "default_relay_attempts")]
        relay_attempts: u32,
        check_item: Option<ItemId>,
    },
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Direct {
            user_agent: default_user_agent(),
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("southseasprices.json")
}

fn default_concurrency() -> usize {
    15
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_relay_attempts() -> u32 {
    2
}

impl Config {
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    /// The configuration compiled into the binary
    pub fn embedded() -> Result<Self, serde_yaml::Error> {
        Self::from_yaml(EMBEDDED)
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    pub fn item_url(&self, item: ItemId) -> String {
        crate::api::item_url(&self.endpoint, item)
    }
}

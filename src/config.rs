//! Network configuration for the Klever SDK

/// Default mainnet node endpoint.
const MAINNET_NODE_URL: &str = "https://node.mainnet.klever.finance";

/// Default testnet node endpoint.
const TESTNET_NODE_URL: &str = "https://node.testnet.klever.finance";

/// Network configuration: chain identity and node endpoint.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Chain ID ("108" for mainnet, "109" for testnet)
    pub chain_id: String,
    /// Node REST endpoint URL
    pub node_url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl NetworkConfig {
    /// Mainnet configuration. `KLEVER_NODE_URL` overrides the node endpoint
    /// when set.
    pub fn mainnet() -> Self {
        Self {
            chain_id: "108".to_string(),
            node_url: std::env::var("KLEVER_NODE_URL")
                .unwrap_or_else(|_| MAINNET_NODE_URL.to_string()),
        }
    }

    /// Testnet configuration.
    pub fn testnet() -> Self {
        Self {
            chain_id: "109".to_string(),
            node_url: std::env::var("KLEVER_NODE_URL")
                .unwrap_or_else(|_| TESTNET_NODE_URL.to_string()),
        }
    }

    /// Create custom configuration with a specific node URL
    pub fn with_node_url(mut self, node_url: impl Into<String>) -> Self {
        self.node_url = node_url.into();
        self
    }

    /// Set the chain ID
    pub fn with_chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = chain_id.into();
        self
    }
}

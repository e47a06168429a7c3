//! GoldRush (Covalent) blockchain data tools
//!
//! Four read-only lookups against the GoldRush REST API: token balances, NFT
//! balances, recent transactions and historical token prices. All of them share a
//! single authenticated client. Upstream failures come back to the model as error
//! results; transient ones carry a backoff hint.

use crate::error::{Result, WorkflowError};
use crate::tools::http_retry::{is_reqwest_error_retryable, HttpRetryManager};
use crate::tools::registry::Tool;
use crate::tools::types::{PropertySchema, ToolContext, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const GOLDRUSH_API_KEY_ENV: &str = "GOLDRUSH_API_KEY";
const GOLDRUSH_BASE_URL: &str = "https://api.covalenthq.com";
const RETRY_KEY: &str = "goldrush";

/// Which GoldRush lookup a tool performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoldRushKind {
    TokenBalances,
    NftBalances,
    Transactions,
    HistoricalTokenPrice,
}

impl GoldRushKind {
    pub fn all() -> [GoldRushKind; 4] {
        [
            GoldRushKind::TokenBalances,
            GoldRushKind::NftBalances,
            GoldRushKind::Transactions,
            GoldRushKind::HistoricalTokenPrice,
        ]
    }

    pub fn tool_name(&self) -> &'static str {
        match self {
            GoldRushKind::TokenBalances => "token-balances",
            GoldRushKind::NftBalances => "nft-balances",
            GoldRushKind::Transactions => "transactions",
            GoldRushKind::HistoricalTokenPrice => "historical-token-price",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            GoldRushKind::TokenBalances => {
                "Fetch token balances for a wallet address on a specific blockchain"
            }
            GoldRushKind::NftBalances => {
                "Fetch NFT balances for a wallet address on a specific blockchain"
            }
            GoldRushKind::Transactions => {
                "Fetch transactions for a wallet address on a specific blockchain"
            }
            GoldRushKind::HistoricalTokenPrice => {
                "Fetch historical token prices for a specific token on a blockchain"
            }
        }
    }

    fn result_title(&self) -> &'static str {
        match self {
            GoldRushKind::TokenBalances => "Token balances",
            GoldRushKind::NftBalances => "NFT balances",
            GoldRushKind::Transactions => "Transactions",
            GoldRushKind::HistoricalTokenPrice => "Historical token prices",
        }
    }

    fn result_label(&self) -> &'static str {
        match self {
            GoldRushKind::TokenBalances => "token balances",
            GoldRushKind::NftBalances => "NFT balances",
            GoldRushKind::Transactions => "transactions",
            GoldRushKind::HistoricalTokenPrice => "historical token prices",
        }
    }
}

/// Lookback window accepted by the transaction and price tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Hour,
    Day,
    Week,
    Month,
}

impl Timeframe {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1h" => Some(Timeframe::Hour),
            "24h" => Some(Timeframe::Day),
            "7d" => Some(Timeframe::Week),
            "30d" => Some(Timeframe::Month),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Hour => "1h",
            Timeframe::Day => "24h",
            Timeframe::Week => "7d",
            Timeframe::Month => "30d",
        }
    }

    fn lookback(&self) -> ChronoDuration {
        match self {
            Timeframe::Hour => ChronoDuration::hours(1),
            Timeframe::Day => ChronoDuration::hours(24),
            Timeframe::Week => ChronoDuration::days(7),
            Timeframe::Month => ChronoDuration::days(30),
        }
    }
}

/// Authenticated GoldRush HTTP client shared by the tools
pub struct GoldRushApi {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GoldRushApi {
    /// Uses the explicit key when given, otherwise `GOLDRUSH_API_KEY`
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_key_lookup(api_key, |name| std::env::var(name).ok())
    }

    pub fn with_key_lookup<F>(api_key: Option<String>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .or_else(|| lookup(GOLDRUSH_API_KEY_ENV).filter(|k| !k.is_empty()))
            .ok_or_else(|| WorkflowError::MissingCredential(GOLDRUSH_API_KEY_ENV.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WorkflowError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))?;

        Ok(GoldRushApi {
            client,
            api_key,
            base_url: GOLDRUSH_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url_for(&self, kind: GoldRushKind, params: &GoldRushParams) -> String {
        let chain = &params.chain;
        let address = &params.address;
        match kind {
            GoldRushKind::TokenBalances => {
                format!("{}/v1/{}/address/{}/balances_v2/", self.base_url, chain, address)
            }
            GoldRushKind::NftBalances => {
                format!("{}/v1/{}/address/{}/balances_nft/", self.base_url, chain, address)
            }
            GoldRushKind::Transactions => format!(
                "{}/v1/{}/address/{}/transactions_v3/?quote-currency=USD&no-logs=true&with-safe=true",
                self.base_url, chain, address
            ),
            GoldRushKind::HistoricalTokenPrice => {
                let timeframe = params.timeframe.unwrap_or(Timeframe::Day);
                let now = Utc::now();
                let from = (now - timeframe.lookback()).format("%Y-%m-%d");
                let to = now.format("%Y-%m-%d");
                format!(
                    "{}/v1/pricing/historical_by_addresses_v2/{}/USD/{}/?from={}&to={}",
                    self.base_url,
                    chain,
                    params.contract_address.as_deref().unwrap_or_default(),
                    from,
                    to
                )
            }
        }
    }

    async fn fetch(&self, url: &str) -> std::result::Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| FetchError {
                retryable: is_reqwest_error_retryable(&e),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body: GoldRushEnvelope = response.json().await.map_err(|e| FetchError {
            retryable: HttpRetryManager::is_retryable_status(status.as_u16()),
            message: format!("HTTP {}: {}", status, e),
        })?;

        if body.error || !status.is_success() {
            return Err(FetchError {
                retryable: HttpRetryManager::is_retryable_status(status.as_u16()),
                message: body
                    .error_message
                    .unwrap_or_else(|| format!("HTTP {}", status)),
            });
        }

        Ok(body.data.unwrap_or(Value::Null))
    }
}

#[derive(Debug, Deserialize)]
struct GoldRushEnvelope {
    data: Option<Value>,
    #[serde(default)]
    error: bool,
    error_message: Option<String>,
}

struct FetchError {
    message: String,
    retryable: bool,
}

#[derive(Debug)]
struct GoldRushParams {
    chain: String,
    address: String,
    contract_address: Option<String>,
    timeframe: Option<Timeframe>,
}

#[derive(Debug, Deserialize)]
struct RawParams {
    chain: String,
    address: String,
    #[serde(rename = "contractAddress")]
    contract_address: Option<String>,
    timeframe: Option<String>,
}

/// A single GoldRush lookup exposed to agents as a tool
pub struct GoldRushTool {
    kind: GoldRushKind,
    api: Arc<GoldRushApi>,
}

impl GoldRushTool {
    pub fn new(kind: GoldRushKind, api: Arc<GoldRushApi>) -> Self {
        GoldRushTool { kind, api }
    }

    fn parse_params(&self, params: Value) -> std::result::Result<GoldRushParams, String> {
        let raw: RawParams =
            serde_json::from_value(params).map_err(|e| format!("Invalid parameters: {}", e))?;

        if raw.chain.trim().is_empty() || raw.address.trim().is_empty() {
            return Err("Invalid parameters: 'chain' and 'address' must be non-empty".to_string());
        }

        let timeframe = match raw.timeframe.as_deref() {
            None => None,
            Some(tf) => Some(Timeframe::from_str(tf).ok_or_else(|| {
                format!("Invalid timeframe '{}'. Use one of: 1h, 24h, 7d, 30d", tf)
            })?),
        };

        match self.kind {
            GoldRushKind::HistoricalTokenPrice => {
                if raw.contract_address.as_deref().map_or(true, |c| c.trim().is_empty()) {
                    return Err("Invalid parameters: 'contractAddress' is required".to_string());
                }
                if timeframe.is_none() {
                    return Err("Invalid parameters: 'timeframe' is required".to_string());
                }
            }
            GoldRushKind::Transactions if timeframe.is_none() => {
                return Err("Invalid parameters: 'timeframe' is required".to_string());
            }
            _ => {}
        }

        Ok(GoldRushParams {
            chain: raw.chain,
            address: raw.address,
            contract_address: raw.contract_address,
            timeframe,
        })
    }
}

#[async_trait]
impl Tool for GoldRushTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert(
            "chain".to_string(),
            PropertySchema::string("Chain name, e.g. 'eth-mainnet', 'base-mainnet', 'matic-mainnet'"),
        );
        properties.insert(
            "address".to_string(),
            PropertySchema::string("Wallet address, ENS or other resolvable name"),
        );
        let mut required = vec!["chain".to_string(), "address".to_string()];

        let timeframe = PropertySchema::string("Lookback window").with_enum(&["1h", "24h", "7d", "30d"]);
        match self.kind {
            GoldRushKind::Transactions => {
                properties.insert("timeframe".to_string(), timeframe);
                required.push("timeframe".to_string());
            }
            GoldRushKind::HistoricalTokenPrice => {
                properties.insert(
                    "contractAddress".to_string(),
                    PropertySchema::string("Token contract address"),
                );
                properties.insert("timeframe".to_string(), timeframe);
                required.push("contractAddress".to_string());
                required.push("timeframe".to_string());
            }
            _ => {}
        }

        ToolDefinition {
            name: self.kind.tool_name().to_string(),
            description: self.kind.description().to_string(),
            input_schema: ToolInputSchema {
                schema_type: "object".to_string(),
                properties,
                required,
            },
        }
    }

    async fn execute(&self, params: Value, _context: &ToolContext) -> ToolResult {
        let params = match self.parse_params(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e),
        };

        let url = self.api.url_for(self.kind, &params);
        log::info!("[GOLDRUSH] {} for {} on {}", self.kind.tool_name(), params.address, params.chain);
        log::debug!("[GOLDRUSH] GET {}", url);

        let label = self.kind.result_label();
        match self.api.fetch(&url).await {
            Ok(data) => {
                HttpRetryManager::global().record_success(RETRY_KEY);
                let subject = match self.kind {
                    GoldRushKind::HistoricalTokenPrice => {
                        params.contract_address.clone().unwrap_or_default()
                    }
                    _ => params.address.clone(),
                };
                let window = params
                    .timeframe
                    .map(|tf| format!(" in last {}", tf.as_str()))
                    .unwrap_or_default();
                ToolResult::success(format!(
                    "{} for {} on {}{}: {}",
                    self.kind.result_title(),
                    subject,
                    params.chain,
                    window,
                    data
                ))
                .with_metadata(json!({
                    "tool": self.kind.tool_name(),
                    "chain": params.chain,
                    "address": params.address,
                }))
            }
            Err(e) if e.retryable => {
                let delay = HttpRetryManager::global().record_error(RETRY_KEY);
                ToolResult::retryable_error(format!("Error fetching {}: {}", label, e.message), delay)
            }
            Err(e) => ToolResult::error(format!("Error fetching {}: {}", label, e.message)),
        }
    }
}

/// All four GoldRush tools over one shared client
pub fn goldrush_tools(api_key: Option<String>) -> Result<Vec<Arc<dyn Tool>>> {
    let api = Arc::new(GoldRushApi::new(api_key)?);
    Ok(GoldRushKind::all()
        .into_iter()
        .map(|kind| Arc::new(GoldRushTool::new(kind, api.clone())) as Arc<dyn Tool>)
        .collect())
}

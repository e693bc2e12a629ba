//! HTTP client for the Pathfinder `/quote` endpoint

use super::types::{QuoteResponse, SwapRequest};
use super::QuoteSource;
use crate::config::PathfinderConfig;
use crate::error::{SwapError, SwapResult};

use async_trait::async_trait;
use ethers::utils::to_checksum;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};

/// Pathfinder quoting API client
pub struct PathfinderClient {
    http: Client,
    quote_url: String,
}

impl PathfinderClient {
    pub fn new(config: &PathfinderConfig) -> SwapResult<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let http = builder.build()?;
        let quote_url = format!("{}/quote", config.base_url.trim_end_matches('/'));

        Ok(Self { http, quote_url })
    }

    pub fn quote_url(&self) -> &str {
        &self.quote_url
    }
}

/// Query string for a quote request
pub fn query_params(request: &SwapRequest) -> Vec<(&'static str, String)> {
    vec![
        ("fromTokenAddress", to_checksum(&request.from_token_address, None)),
        ("toTokenAddress", to_checksum(&request.to_token_address, None)),
        ("amount", request.amount.to_string()),
        ("fromTokenChainId", request.from_chain_id.to_string()),
        ("toTokenChainId", request.to_chain_id.to_string()),
        ("userAddress", to_checksum(&request.user_address, None)),
        ("feeTokenAddress", to_checksum(&request.fee_token_address, None)),
        ("slippageTolerance", request.slippage_tolerance.to_string()),
    ]
}

#[async_trait]
impl QuoteSource for PathfinderClient {
    async fn fetch_quote(&self, request: &SwapRequest) -> SwapResult<QuoteResponse> {
        info!("Requesting quote from {}", self.quote_url());
        debug!(
            "Quote for {} of {:?} (chain {}) -> {:?} (chain {})",
            request.amount,
            request.from_token_address,
            request.from_chain_id,
            request.to_token_address,
            request.to_chain_id
        );

        let response = self
            .http
            .get(&self.quote_url)
            .query(&query_params(request))
            .send()
            .await
            .map_err(|e| {
                error!("Fetching data from pathfinder: {}", e);
                SwapError::Http(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Pathfinder returned status {}: {}", status, body);
            return Err(SwapError::QuoteStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to decode pathfinder quote: {}", e);
            SwapError::InvalidQuote(format!("undecodable quote body: {}", e))
        })
    }
}

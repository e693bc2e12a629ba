//! Router Pathfinder quoting API
//!
//! One GET per run; no retries.

mod client;
mod types;

pub use client::PathfinderClient;
pub use types::{ExecutionTx, QuoteResponse, SwapRequest};

use crate::error::SwapResult;

use async_trait::async_trait;

/// Source of swap quotes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self, request: &SwapRequest) -> SwapResult<QuoteResponse>;
}

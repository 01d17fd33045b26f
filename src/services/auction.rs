//! Auction service for bid forwarding.
//!
//! The gateway performs no bid validation of its own: the external
//! auction API is the sole arbiter. Every outcome, success or failure,
//! is folded into a `BiddingUpdate` payload; failures never surface as
//! errors to the connection task.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::UpstreamConfig;
use crate::models::{BiddingUpdate, PlaceBid};

/// Client for the external auction bidding API.
#[derive(Clone)]
pub struct AuctionService {
    client: Client,
    base_url: String,
}

/// Successful bid response from the auction API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BidResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    new_highest_bid: Option<f64>,
    #[serde(default)]
    highest_bidder_name: Option<String>,
}

/// Error body from the auction API, when it bothers to send one.
#[derive(Debug, Deserialize)]
struct BidErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

impl AuctionService {
    /// Create a new auction service.
    pub fn new(config: &UpstreamConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("AgoraGateway/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.clone(),
        }
    }

    /// Forward a bid to the auction API, passing the caller's bearer
    /// token through verbatim. No retry, no idempotency key.
    pub async fn place_bid(&self, bid: &PlaceBid, bearer_token: Option<&str>) -> BiddingUpdate {
        let url = format!("{}/api/auctions/{}/bids", self.base_url, bid.auction_id);

        let mut request = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "amount": bid.amount }));
        if let Some(token) = bearer_token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(auction_id = bid.auction_id, error = %e, "auction API unreachable");
                return BiddingUpdate::rejected(bid.auction_id, "Bidding service unavailable");
            }
        };

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<BidErrorResponse>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| format!("Bid rejected ({})", status));
            info!(auction_id = bid.auction_id, %status, "bid rejected by auction API");
            return BiddingUpdate::rejected(bid.auction_id, message);
        }

        match response.json::<BidResponse>().await {
            Ok(body) => {
                info!(
                    auction_id = bid.auction_id,
                    amount = bid.amount,
                    "bid accepted by auction API"
                );
                BiddingUpdate::accepted(
                    bid.auction_id,
                    body.message
                        .unwrap_or_else(|| "Bid placed successfully".to_string()),
                    body.new_highest_bid.unwrap_or(bid.amount),
                    body.highest_bidder_name.unwrap_or_default(),
                )
            }
            Err(e) => {
                warn!(auction_id = bid.auction_id, error = %e, "malformed auction API response");
                BiddingUpdate::rejected(bid.auction_id, "Malformed response from bidding service")
            }
        }
    }
}

//! Bidding relay payloads.

use serde::{Deserialize, Serialize};

/// Client request to place a bid on an auction.
///
/// The browser validates `amount > 0` before emitting; the gateway
/// forwards as-is and lets the auction API arbitrate validity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBid {
    pub auction_id: i64,
    pub amount: f64,
}

/// Result of a bid attempt, relayed back over the bidding namespace.
///
/// Successful updates are broadcast to every connected bidding socket;
/// rejections go only to the socket that placed the bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiddingUpdate {
    pub success: bool,
    pub message: String,
    pub auction_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_highest_bid: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_bidder_name: Option<String>,
}

impl BiddingUpdate {
    pub fn accepted(
        auction_id: i64,
        message: String,
        new_highest_bid: f64,
        highest_bidder_name: String,
    ) -> Self {
        Self {
            success: true,
            message,
            auction_id,
            new_highest_bid: Some(new_highest_bid),
            highest_bidder_name: Some(highest_bidder_name),
        }
    }

    pub fn rejected(auction_id: i64, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            auction_id,
            new_highest_bid: None,
            highest_bidder_name: None,
        }
    }
}

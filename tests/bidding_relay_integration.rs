//! Integration tests for the bidding relay.
//!
//! Drives the relay through its frame dispatcher against a mock
//! auction API and asserts the broadcast/unicast split: accepted bids
//! reach every bidding socket, rejections only the bidder.

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use agora_gateway::api::bidding;
use agora_gateway::config::{ChatConfig, Config, ServerConfig, UpstreamConfig};
use agora_gateway::models::Frame;
use agora_gateway::AppState;

fn test_config(auction_url: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            public_url: "http://localhost".to_string(),
        },
        auction_api: UpstreamConfig {
            base_url: auction_url.trim_end_matches('/').to_string(),
            timeout_seconds: 2,
        },
        chat_api: UpstreamConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 1,
        },
        chat: ChatConfig {
            sweep_interval_seconds: 60,
            max_idle_seconds: 300,
        },
    }
}

fn place_bid_frame(auction_id: i64, amount: f64) -> Frame {
    Frame::new("placeBid", &json!({ "auctionId": auction_id, "amount": amount }))
}

#[tokio::test]
async fn accepted_bid_broadcasts_to_all_sockets() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auctions/7/bids"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Bid placed successfully",
            "newHighestBid": 120.0,
            "highestBidderName": "alice"
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let state = AppState::from_config(&test_config(&mock.uri()));
    let mut bidder = state.bidding_rooms.register("bidder").await;
    let mut watcher1 = state.bidding_rooms.register("watcher1").await;
    let mut watcher2 = state.bidding_rooms.register("watcher2").await;

    bidding::handle_frame(&state, "bidder", None, place_bid_frame(7, 120.0)).await;

    for rx in [&mut bidder, &mut watcher1, &mut watcher2] {
        let frame = rx.recv().await.expect("every socket sees the update");
        assert_eq!(frame.event, "bidding_update");
        assert_eq!(frame.data["success"], json!(true));
        assert_eq!(frame.data["auctionId"], json!(7));
        assert_eq!(frame.data["newHighestBid"], json!(120.0));
        assert_eq!(frame.data["highestBidderName"], json!("alice"));
    }
}

#[tokio::test]
async fn rejected_bid_reaches_only_the_bidder() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auctions/3/bids"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Bid too low" })),
        )
        .mount(&mock)
        .await;

    let state = AppState::from_config(&test_config(&mock.uri()));
    let mut bidder = state.bidding_rooms.register("bidder").await;
    let mut watcher = state.bidding_rooms.register("watcher").await;

    bidding::handle_frame(&state, "bidder", None, place_bid_frame(3, 5.0)).await;

    let frame = bidder.recv().await.expect("bidder sees the rejection");
    assert_eq!(frame.event, "bidding_update");
    assert_eq!(frame.data["success"], json!(false));
    assert_eq!(frame.data["message"], json!("Bid too low"));
    assert_eq!(frame.data["auctionId"], json!(3));
    assert!(frame.data.get("newHighestBid").is_none());

    assert!(watcher.try_recv().is_err(), "watchers see nothing");
}

#[tokio::test]
async fn bearer_token_is_forwarded_verbatim() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auctions/9/bids"))
        .and(header("authorization", "Bearer user-jwt-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "newHighestBid": 55.0,
            "highestBidderName": "bob"
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let state = AppState::from_config(&test_config(&mock.uri()));
    let mut bidder = state.bidding_rooms.register("bidder").await;

    bidding::handle_frame(&state, "bidder", Some("user-jwt-token"), place_bid_frame(9, 55.0))
        .await;

    let frame = bidder.recv().await.unwrap();
    assert_eq!(frame.data["success"], json!(true));
    // No message from upstream falls back to the default
    assert_eq!(frame.data["message"], json!("Bid placed successfully"));
}

#[tokio::test]
async fn unreachable_auction_api_degrades_to_rejection() {
    // Unroutable port; the request fails without an HTTP response.
    let state = AppState::from_config(&test_config("http://127.0.0.1:9"));
    let mut bidder = state.bidding_rooms.register("bidder").await;
    let mut watcher = state.bidding_rooms.register("watcher").await;

    bidding::handle_frame(&state, "bidder", None, place_bid_frame(1, 10.0)).await;

    let frame = bidder.recv().await.unwrap();
    assert_eq!(frame.data["success"], json!(false));
    assert_eq!(frame.data["message"], json!("Bidding service unavailable"));
    assert!(watcher.try_recv().is_err());
}

#[tokio::test]
async fn malformed_frames_are_ignored() {
    let state = AppState::from_config(&test_config("http://127.0.0.1:9"));
    let mut bidder = state.bidding_rooms.register("bidder").await;

    // Wrong payload shape for placeBid
    bidding::handle_frame(
        &state,
        "bidder",
        None,
        Frame::new("placeBid", &json!({ "auctionId": "seven" })),
    )
    .await;
    // Unknown event
    bidding::handle_frame(&state, "bidder", None, Frame::new("subscribe", &json!({}))).await;

    assert!(bidder.try_recv().is_err());
}

mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn titles(server: &common::TestServer, token: &str, current: &str, page_size: &str) -> Result<Vec<String>> {
    let (status, body) = server
        .get("bill/list", &[("current", current), ("pageSize", page_size)], Some(token))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    Ok(body["bills"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .filter_map(|bill| bill["title"].as_str().map(str::to_string))
        .collect())
}

#[tokio::test]
async fn created_bill_comes_back_formatted() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let (access, _) = server.register("amy", "pw").await?;

    let (status, body) = server
        .post(
            "createBill",
            json!({ "type": "food", "date": "2024-03-01 12:30:00", "amount": 18.5, "title": "lunch" }),
            Some(access.as_str()),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);

    let bill: &Value = &body["data"]["bill"];
    assert_eq!(bill["title"], "lunch");
    assert_eq!(bill["amount"], 18.5);
    assert_eq!(bill["date"], "2024-03-01T12:30:00Z");
    assert!(bill["id"].is_string());
    assert!(bill.get("userId").is_none());
    Ok(())
}

#[tokio::test]
async fn list_pages_over_only_the_callers_bills() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let (amy, _) = server.register("amy", "pw").await?;
    let (bob, _) = server.register("bob", "pw").await?;

    for i in 0..25 {
        let (status, _) = server
            .post(
                "createBill",
                json!({ "type": "misc", "date": "2024-01-01", "amount": i, "title": format!("bill-{}", i) }),
                Some(amy.as_str()),
            )
            .await?;
        assert_eq!(status, StatusCode::OK);
    }

    let page = |range: std::ops::Range<usize>| -> Vec<String> { range.map(|i| format!("bill-{}", i)).collect() };

    assert_eq!(titles(&server, &amy, "1", "10").await?, page(0..10));
    assert_eq!(titles(&server, &amy, "3", "10").await?, page(20..25));
    assert!(titles(&server, &amy, "4", "10").await?.is_empty());
    assert!(titles(&server, &bob, "1", "10").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn bills_need_a_token() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let (status, _) = server.get("bill/list", &[], None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = server
        .post("createBill", json!({ "type": "x", "date": "2024-01-01", "amount": 1, "title": "t" }), None)
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

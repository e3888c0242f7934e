mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn health_reports_store_ok() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let res = server.client.get(format!("{}/health", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_lists_every_mock_route() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let body = server
        .client
        .get(format!("{}/", server.base_url))
        .send()
        .await?
        .json::<Value>()
        .await?;

    let routes = body["data"]["routes"].as_array().cloned().unwrap_or_default();
    let paths: Vec<&str> = routes.iter().filter_map(|r| r["path"].as_str()).collect();
    for expected in [
        "/api/register",
        "/api/login",
        "/api/checkCaptcha",
        "/api/captcha",
        "/api/refresh",
        "/api/createBill",
        "/api/getUserInfo",
        "/api/bill/list",
        "/api/test",
    ] {
        assert!(paths.contains(&expected), "missing {} in {:?}", expected, paths);
    }
    Ok(())
}

#[tokio::test]
async fn unknown_routes_are_404_with_message() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let (status, body) = server.get("nope", &[], None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap_or_default().contains("nope"));
    Ok(())
}

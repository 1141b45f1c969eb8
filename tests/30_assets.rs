mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn static_asset_gets_cache_header() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = common::client()
        .get(format!("{}/assets/app.css", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get("cache-control").and_then(|v| v.to_str().ok()),
        Some(format!("public, max-age={}", common::ASSET_MAX_AGE).as_str())
    );
    Ok(())
}

#[tokio::test]
async fn missing_asset_gets_no_cache_header() -> Result<()> {
    let server = common::ensure_server().await?;
    assert!(server.asset_dir.exists());

    let res = common::client()
        .get(format!("{}/assets/missing.js", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.headers().get("cache-control").is_none());
    Ok(())
}

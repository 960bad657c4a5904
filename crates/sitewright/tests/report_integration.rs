//! A small smoke suite: content checks over several pages, recorded into a
//! report and written to disk

use serde_json::json;
use sitewright::{
    ClientOptions, ContentCheck, Report, ReportEntry, ReportStatus, ToolClient, expect_text,
};
use std::time::{Duration, Instant};

mod common;

#[tokio::test]
async fn test_smoke_suite_report() -> anyhow::Result<()> {
    common::init_tracing();

    let connection = common::connect(Duration::from_secs(5)).serve(|request| {
        match request["method"].as_str() {
            Some("initialize") => Some(json!({"result": {"serverInfo": {"name": "mock"}}})),
            Some("tools/call") => {
                let name = request["params"]["name"].as_str().unwrap_or_default();
                let url = request["params"]["arguments"]["url"].as_str().unwrap_or_default();
                Some(match name {
                    "navigate-to" => common::text_result(url),
                    // Every page renders the same body
                    _ => common::text_result("Example Domain <b>for illustrative examples</b>"),
                })
            }
            _ => None,
        }
    });
    let client = ToolClient::attach(connection, ClientOptions::new("in-memory")).await?;

    let pages = [
        ("home", "https://example.com/", ContentCheck::new().require("example domain")),
        ("pricing", "https://example.com/pricing", ContentCheck::new().require("Pricing")),
    ];

    let mut report = Report::new("smoke <example.com>");
    for (name, url, check) in &pages {
        let started = Instant::now();
        client.navigate_to(url, None).await?;

        let entry = match expect_text(&client, "body")
            .with_timeout(Duration::from_millis(50))
            .with_poll_interval(Duration::from_millis(10))
            .to_satisfy(check)
            .await
        {
            Ok(_) => ReportEntry::passed(*name),
            Err(e) => ReportEntry::failed(*name, e.to_string()),
        };
        report.record(entry.url(*url).duration(started.elapsed()));
    }
    report.record(ReportEntry::skipped("checkout").message("no test account"));

    let summary = report.summary();
    assert_eq!((summary.passed, summary.failed, summary.skipped), (1, 1, 1));
    assert_eq!(report.entries[1].status, ReportStatus::Failed);
    assert!(
        report.entries[1]
            .message
            .as_deref()
            .unwrap_or_default()
            .contains("missing 'Pricing'")
    );

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out/smoke.html");
    report.write_html(&path).await?;

    let html = tokio::fs::read_to_string(&path).await?;
    assert!(html.contains("smoke &lt;example.com&gt;"));
    assert!(html.contains("https://example.com/pricing"));
    assert!(html.contains("no test account"));

    client.close().await?;
    Ok(())
}

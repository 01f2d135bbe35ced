// End-to-end harvest tests against a mock catalog

use specharvest_core::error::PipelineError;
use specharvest_core::harvest::{HarvestOptions, HarvestProgressCallback, execute_harvest};
use specharvest_core::store::{RawTable, read_raw_table};
use specharvest_scanner::{RetryPolicy, SiteLayout};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html")
        .set_body_string(body)
}

fn listing_page(pages: usize, tiles: &[(&str, &str, &str)]) -> String {
    let mut body = String::from("<html><body><ul class=\"pagination\">");
    for n in 1..=pages {
        body.push_str(&format!("<li><a class=\"pagination__link\">{}</a></li>", n));
    }
    body.push_str("</ul><ul class=\"catalog-grid\">");
    for (href, title, price) in tiles {
        body.push_str(&format!(
            "<li class=\"catalog-grid__cell\"><a class=\"goods-tile__heading\" href=\"{}\">{}</a>\
             <span class=\"goods-tile__price-value\">{}</span></li>",
            href, title, price
        ));
    }
    body.push_str("</ul></body></html>");
    body
}

fn spec_page(fields: &[(&str, &str)]) -> String {
    let mut body = String::from("<html><body>");
    for (label, value) in fields {
        body.push_str(&format!(
            "<section class=\"group\"><dt class=\"label\">{}</dt><dd class=\"value\">{}</dd></section>",
            label, value
        ));
    }
    body.push_str("</body></html>");
    body
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

fn options(server: &MockServer, output: &TempDir, workers: usize) -> HarvestOptions {
    HarvestOptions {
        url_template: format!("{}/laptopy/page={{page}}/", server.uri()),
        workers,
        layout: SiteLayout {
            spec_tab_item: None,
            ..SiteLayout::default()
        },
        retry: RetryPolicy::none(),
        timeout_secs: 5,
        output_dir: output.path().to_path_buf(),
        show_progress_bars: false,
    }
}

/// Two listing pages, four products; the third omits SSD, the fourth is gone.
async fn two_page_catalog() -> MockServer {
    let server = MockServer::start().await;

    mount(
        &server,
        "/laptopy/page=1/",
        html(listing_page(
            2,
            &[("/p/1/", "MacBook Air", "4 999 zł"), ("/p/2/", "MacBook Pro", "8 999 zł")],
        )),
    )
    .await;
    mount(
        &server,
        "/laptopy/page=2/",
        html(listing_page(
            2,
            &[("/p/3/", "MacBook Max", "12 999 zł"), ("/p/4/", "MacBook Gone", "1 zł")],
        )),
    )
    .await;

    mount(
        &server,
        "/p/1/",
        html(spec_page(&[("RAM", "8GB"), ("SSD", "256GB"), ("Battery", "52.6")])),
    )
    .await;
    mount(
        &server,
        "/p/2/",
        html(spec_page(&[("RAM", "16GB"), ("SSD", "512GB"), ("Battery", "70")])),
    )
    .await;
    // Slow on purpose so it completes after /p/4/
    mount(
        &server,
        "/p/3/",
        html(spec_page(&[("RAM", "16GB"), ("Battery", "99.5")])).set_delay(Duration::from_millis(200)),
    )
    .await;
    mount(&server, "/p/4/", ResponseTemplate::new(404)).await;

    server
}

// ============================================================================
// Full run
// ============================================================================

#[tokio::test]
async fn test_two_page_harvest_aligns_every_record() {
    let server = two_page_catalog().await;
    let output = TempDir::new().unwrap();

    let outcome = execute_harvest(options(&server, &output, 4), None)
        .await
        .unwrap();

    assert_eq!(outcome.pages, 2);
    assert_eq!(outcome.dataset.schema().labels(), ["RAM", "SSD", "Battery"]);

    let records = outcome.dataset.records();
    let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["MacBook Air", "MacBook Pro", "MacBook Max", "MacBook Gone"]);

    for record in records {
        assert_eq!(record.arity(), 5);
    }
    assert_eq!(records[0].specs, vec!["8GB", "256GB", "52.6"]);
    assert_eq!(records[0].price, "4 999 zł");
    assert_eq!(records[2].specs, vec!["16GB", "", "99.5"]);
    assert_eq!(records[3].specs, vec!["", "", ""]);
}

#[tokio::test]
async fn test_raw_file_matches_dataset() {
    let server = two_page_catalog().await;
    let output = TempDir::new().unwrap();

    let outcome = execute_harvest(options(&server, &output, 2), None)
        .await
        .unwrap();

    assert!(outcome.raw_path.starts_with(output.path()));
    let file_name = outcome.raw_path.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with("Raw_data_"));
    assert!(file_name.ends_with(".csv"));

    let table = read_raw_table(&outcome.raw_path).unwrap();
    assert_eq!(table, RawTable::from(&outcome.dataset));
    assert_eq!(table.header, vec!["Name", "Price", "RAM", "SSD", "Battery"]);
}

#[tokio::test]
async fn test_worker_count_does_not_change_output() {
    let server = two_page_catalog().await;

    let mut datasets = Vec::new();
    for workers in [1, 8] {
        let output = TempDir::new().unwrap();
        let outcome = execute_harvest(options(&server, &output, workers), None)
            .await
            .unwrap();
        datasets.push(RawTable::from(&outcome.dataset));
    }
    assert_eq!(datasets[0], datasets[1]);
}

#[tokio::test]
async fn test_progress_callback_reports_each_page() {
    let server = two_page_catalog().await;
    let output = TempDir::new().unwrap();

    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = messages.clone();
    let callback: HarvestProgressCallback = Arc::new(move |msg: String| {
        sink.lock().unwrap().push(msg);
    });

    execute_harvest(options(&server, &output, 2), Some(callback))
        .await
        .unwrap();

    let messages = messages.lock().unwrap();
    assert!(messages[0].starts_with("Schema discovered: 3 field(s)"));
    assert!(messages.iter().any(|m| m.starts_with("Page 1/2 done")));
    assert!(messages.iter().any(|m| m.starts_with("Page 2/2 done, 4 record(s)")));
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn test_unreachable_schema_page_gives_empty_schema() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/laptopy/page=1/",
        html(listing_page(1, &[("/p/1/", "MacBook Air", "4 999 zł"), ("/p/2/", "MacBook Pro", "1")])),
    )
    .await;
    mount(&server, "/p/1/", ResponseTemplate::new(500)).await;
    mount(&server, "/p/2/", html(spec_page(&[("RAM", "16GB")]))).await;
    let output = TempDir::new().unwrap();

    let outcome = execute_harvest(options(&server, &output, 2), None)
        .await
        .unwrap();

    assert!(outcome.dataset.schema().is_empty());
    assert_eq!(outcome.dataset.len(), 2);
    for record in outcome.dataset.records() {
        assert_eq!(record.arity(), 2);
    }
}

#[tokio::test]
async fn test_first_listing_failure_writes_nothing() {
    let server = MockServer::start().await;
    mount(&server, "/laptopy/page=1/", ResponseTemplate::new(503)).await;
    let output = TempDir::new().unwrap();

    let err = execute_harvest(options(&server, &output, 2), None)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Scan(_)));
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_later_listing_failure_keeps_checkpoint() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/laptopy/page=1/",
        html(listing_page(3, &[("/p/1/", "MacBook Air", "4 999 zł"), ("/p/2/", "MacBook Pro", "1")])),
    )
    .await;
    mount(&server, "/laptopy/page=2/", ResponseTemplate::new(500)).await;
    mount(&server, "/p/1/", html(spec_page(&[("RAM", "8GB")]))).await;
    mount(&server, "/p/2/", html(spec_page(&[("RAM", "16GB")]))).await;
    let output = TempDir::new().unwrap();

    let err = execute_harvest(options(&server, &output, 2), None)
        .await
        .unwrap_err();

    let (path, pages) = match err {
        PipelineError::Checkpointed { path, pages, .. } => (path, pages),
        other => panic!("expected a checkpointed error, got {other}"),
    };
    assert_eq!(pages, 1);

    let table = read_raw_table(&path).unwrap();
    assert_eq!(table.header, vec!["Name", "Price", "RAM"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[1], vec!["MacBook Pro", "1", "16GB"]);
}

#[tokio::test]
async fn test_invalid_template_is_rejected() {
    let output = TempDir::new().unwrap();
    let options = HarvestOptions {
        url_template: "http://shop.test/laptopy/".to_string(),
        output_dir: output.path().to_path_buf(),
        ..HarvestOptions::default()
    };

    let err = execute_harvest(options, None).await.unwrap_err();
    assert!(matches!(err, PipelineError::Scan(_)));
}

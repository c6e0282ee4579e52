//! Integration tests for the grabber
//!
//! These tests use wiremock to serve a small catalog and test
//! the full run cycle end-to-end against a temporary download root.

use catalog_grabber::config::{
    Config, CrawlerConfig, CredentialsConfig, FormatSelector, OutputConfig, SelectorConfig,
};
use catalog_grabber::crawler::{run_crawl, Coordinator, Pacer, RunOptions};
use catalog_grabber::output::{AssetResult, RunManifest};
use catalog_grabber::state::EntryState;
use catalog_grabber::{Credentials, GrabberError};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, root: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            catalog_url: format!("{}/catalog/", base_url),
            site_name: "Test Site".to_string(),
            request_timeout: 5,
            max_attempts: 3,
            delay_floor: 0, // No pacing in tests
            delay_jitter: 0,
            user_agent: "catalog-grabber-tests".to_string(),
        },
        credentials: CredentialsConfig::default(),
        output: OutputConfig {
            download_root: root.join("videos").to_string_lossy().into_owned(),
            manifest_dir: root.join("log").to_string_lossy().into_owned(),
        },
        selectors: SelectorConfig {
            detail_pages: "a.w-portfolio-item-anchor".to_string(),
            detail_attribute: "href".to_string(),
            title_heading: "h1.title".to_string(),
            title_subtitle: "h2.subtitle".to_string(),
            covers: "img.cover".to_string(),
            cover_attribute: "src".to_string(),
            formats: vec![
                format_selector("Best", "3200×1600 High"),
                format_selector("Android", "1080p"),
            ],
        },
    }
}

fn format_selector(name: &str, text: &str) -> FormatSelector {
    FormatSelector {
        name: name.to_string(),
        selector: "td a".to_string(),
        attribute: "href".to_string(),
        text: Some(text.to_string()),
        required: false,
    }
}

fn listing_page(slugs: &[&str]) -> String {
    let anchors: String = slugs
        .iter()
        .map(|slug| {
            format!(
                r#"<div class="item"><a class="w-portfolio-item-anchor" href="/videos/{}/">{}</a></div>"#,
                slug, slug
            )
        })
        .collect();
    format!(
        r#"<html><body><a href="/about/">About</a>{}</body></html>"#,
        anchors
    )
}

fn detail_page(slug: &str, heading: &str, subtitle: &str) -> String {
    format!(
        r#"<html><body>
            <h1 class="title">{heading}</h1>
            <h2 class="subtitle">{subtitle}</h2>
            <img class="cover" src="/covers/{slug}.jpg">
            <table>
                <tr><td><a href="/dl/{slug}_high.mp4">3200×1600 High</a></td></tr>
                <tr><td><a href="/dl/{slug}_1080.mp4">1080p</a></td></tr>
            </table>
        </body></html>"#
    )
}

/// Serves the listing, the detail page and the three assets of `slug`
async fn mount_entry(server: &MockServer, slug: &str, heading: &str, subtitle: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/videos/{}/", slug)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page(slug, heading, subtitle))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;

    for asset in [
        format!("/dl/{}_high.mp4", slug),
        format!("/dl/{}_1080.mp4", slug),
        format!("/covers/{}.jpg", slug),
    ] {
        Mock::given(method("GET"))
            .and(path(asset.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(asset.into_bytes()))
            .mount(server)
            .await;
    }
}

async fn mount_listing(server: &MockServer, slugs: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/catalog/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(slugs))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(Result::ok).count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_full_run_downloads_every_asset() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    mount_listing(&mock_server, &["sunset", "harbor"]).await;
    mount_entry(&mock_server, "sunset", "Sunset", "Part 1").await;
    mount_entry(&mock_server, "harbor", "Harbor & Lights", "Night").await;

    let config = create_test_config(&base_url, temp_dir.path());
    let report = run_crawl(config, &Credentials::empty(), RunOptions::default())
        .await
        .expect("Run failed");

    assert_eq!(report.entries.len(), 2);
    assert!(report.entries.iter().all(|e| e.state == EntryState::Done));

    let site_dir = temp_dir.path().join("videos").join("Test Site");
    let sunset = site_dir.join("Sunset (Part 1)");
    let harbor = site_dir.join("Harbor and Lights (Night)");

    assert_eq!(
        std::fs::read(sunset.join("sunset_high.mp4")).unwrap(),
        b"/dl/sunset_high.mp4"
    );
    assert!(sunset.join("sunset_1080.mp4").is_file());
    assert!(sunset.join("covers").join("sunset.jpg").is_file());
    assert_eq!(file_count(&sunset.join("covers")), 1);
    assert!(harbor.join("harbor_high.mp4").is_file());
    assert!(harbor.join("covers").join("harbor.jpg").is_file());

    let manifest_path = report.manifest_path.expect("No manifest written");
    assert!(manifest_path.starts_with(temp_dir.path().join("log")));
    let manifest = RunManifest::load(&manifest_path).unwrap();
    assert_eq!(
        manifest.urls(),
        [
            format!("{}/dl/sunset_high.mp4", base_url),
            format!("{}/dl/sunset_1080.mp4", base_url),
            format!("{}/dl/harbor_high.mp4", base_url),
            format!("{}/dl/harbor_1080.mp4", base_url),
        ]
    );
    assert_eq!(report.statistics.assets_downloaded, 6);
}

#[tokio::test]
async fn test_entry_without_title_is_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();

    mount_listing(&mock_server, &["broken", "sunset"]).await;
    mount_entry(&mock_server, "sunset", "Sunset", "Part 1").await;
    Mock::given(method("GET"))
        .and(path("/videos/broken/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><h2 class="subtitle">Part 9</h2>
               <table><tr><td><a href="/dl/broken_high.mp4">3200×1600 High</a></td></tr></table>
               </body></html>"#,
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dl/broken_high.mp4"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, temp_dir.path());
    let report = run_crawl(config, &Credentials::empty(), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.entries[0].state, EntryState::Skipped);
    assert!(report.entries[0].directory.is_none());
    assert!(report.entries[0].error.is_some());
    assert_eq!(report.entries[1].state, EntryState::Done);

    // Only the good entry produced a directory
    assert_eq!(file_count(&temp_dir.path().join("videos").join("Test Site")), 1);
    assert_eq!(report.manifest.len(), 2);
    assert!(report
        .manifest
        .urls()
        .iter()
        .all(|url| !url.contains("broken")));
}

#[tokio::test]
async fn test_listing_failure_aborts_run() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/catalog/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, temp_dir.path());
    let result = run_crawl(config, &Credentials::empty(), RunOptions::default()).await;

    match result {
        Err(GrabberError::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("Expected RetriesExhausted, got {:?}", other.map(|r| r.entries)),
    }
    assert!(!temp_dir.path().join("log").exists());
    assert!(!temp_dir.path().join("videos").exists());
}

#[tokio::test]
async fn test_failing_asset_is_retried_and_siblings_continue() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();

    mount_listing(&mock_server, &["sunset"]).await;

    // Mounted first so it takes precedence over the healthy asset mock
    Mock::given(method("GET"))
        .and(path("/dl/sunset_1080.mp4"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;
    mount_entry(&mock_server, "sunset", "Sunset", "Part 1").await;

    let config = create_test_config(&base_url, temp_dir.path());
    let report = run_crawl(config, &Credentials::empty(), RunOptions::default())
        .await
        .unwrap();

    let entry = &report.entries[0];
    assert_eq!(entry.state, EntryState::PartiallyDone);
    assert_eq!(entry.failed(), 1);
    assert_eq!(entry.succeeded(), 2);

    let dir = temp_dir
        .path()
        .join("videos")
        .join("Test Site")
        .join("Sunset (Part 1)");
    assert!(dir.join("sunset_high.mp4").is_file());
    assert!(!dir.join("sunset_1080.mp4").exists());
    assert!(!dir.join("sunset_1080.mp4.part").exists());
    assert!(dir.join("covers").join("sunset.jpg").is_file());

    assert_eq!(
        report.manifest.urls(),
        [format!("{}/dl/sunset_high.mp4", base_url)]
    );
    assert!(report.statistics.has_failures());
}

#[tokio::test]
async fn test_formats_sharing_a_file_name_do_not_overwrite() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();

    mount_listing(&mock_server, &["sunset"]).await;
    Mock::given(method("GET"))
        .and(path("/videos/sunset/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
               <h1 class="title">Sunset</h1><h2 class="subtitle">Part 1</h2>
               <table>
                   <tr><td><a href="/high/video.mp4">3200×1600 High</a></td></tr>
                   <tr><td><a href="/android/video.mp4">1080p</a></td></tr>
               </table>
               </body></html>"#,
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/high/video.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_string("high"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/android/video.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_string("android"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, temp_dir.path());
    let report = run_crawl(config, &Credentials::empty(), RunOptions::default())
        .await
        .unwrap();

    let entry = &report.entries[0];
    assert_eq!(entry.state, EntryState::PartiallyDone);
    assert!(matches!(entry.assets[1].result, AssetResult::Failed { .. }));

    let video = temp_dir
        .path()
        .join("videos")
        .join("Test Site")
        .join("Sunset (Part 1)")
        .join("video.mp4");
    assert_eq!(std::fs::read(video).unwrap(), b"high");
    assert_eq!(
        report.manifest.urls(),
        [format!("{}/high/video.mp4", base_url)]
    );
}

#[tokio::test]
async fn test_second_run_skips_existing_files() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();

    mount_listing(&mock_server, &["sunset"]).await;
    Mock::given(method("GET"))
        .and(path("/videos/sunset/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(
            "sunset", "Sunset", "Part 1",
        )))
        .mount(&mock_server)
        .await;
    for asset in ["/dl/sunset_high.mp4", "/dl/sunset_1080.mp4", "/covers/sunset.jpg"] {
        Mock::given(method("GET"))
            .and(path(asset))
            .respond_with(ResponseTemplate::new(200).set_body_string("payload"))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(&base_url, temp_dir.path());
    let coordinator = Coordinator::new(config, &Credentials::empty(), RunOptions::default())
        .unwrap()
        .with_pacer(Pacer::disabled());

    let first = coordinator.run().await.unwrap();
    let second = coordinator.run().await.unwrap();

    assert_eq!(first.statistics.assets_downloaded, 3);
    assert_eq!(second.statistics.assets_downloaded, 0);
    assert_eq!(second.statistics.assets_present, 3);
    assert_eq!(second.entries[0].state, EntryState::Done);
    assert!(second.entries[0]
        .assets
        .iter()
        .all(|a| matches!(a.result, AssetResult::AlreadyPresent { .. })));

    // Both runs keep their own manifest listing the same videos
    assert_ne!(first.manifest_path, second.manifest_path);
    assert_eq!(first.manifest, second.manifest);
    assert_eq!(file_count(&temp_dir.path().join("log")), 2);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();

    mount_listing(&mock_server, &["sunset", "harbor"]).await;
    mount_entry(&mock_server, "sunset", "Sunset", "Part 1").await;
    mount_entry(&mock_server, "harbor", "Harbor", "Night").await;

    let options = RunOptions {
        dry_run: true,
        limit: Some(1),
    };
    let config = create_test_config(&base_url, temp_dir.path());
    let report = run_crawl(config, &Credentials::empty(), options)
        .await
        .unwrap();

    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.statistics.assets_planned, 3);
    assert!(report.manifest_path.is_none());
    assert!(!temp_dir.path().join("videos").exists());
    assert!(!temp_dir.path().join("log").exists());

    let requested: Vec<String> = mock_server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(requested, ["/catalog/", "/videos/sunset/"]);
}

#[tokio::test]
async fn test_session_cookies_are_sent() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();

    // Without the cookie the listing is a 404 and the run aborts
    Mock::given(method("GET"))
        .and(path("/catalog/"))
        .and(header("cookie", "session=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let credentials = Credentials::from_pairs([("session", "abc123")]);
    let config = create_test_config(&base_url, temp_dir.path());
    let report = run_crawl(config, &credentials, RunOptions::default())
        .await
        .unwrap();

    assert!(report.entries.is_empty());
    assert!(report.manifest.is_empty());
    assert!(report.manifest_path.unwrap().is_file());
}

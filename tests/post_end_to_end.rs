//! A full publishing pass with the stock-photo service and the page API both
//! served by mock servers.

use caption_press::bank::ContentBank;
use caption_press::config::{Credentials, PressConfig};
use caption_press::pipeline::{RunEvent, RunOutcome, post_once};
use caption_press::publish::{PagePublisher, PublishError};
use caption_press::render::{FontPathResolver, PicsumSource};
use caption_press::types::PostId;
use httpmock::MockServer;
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;

const SIZE: u32 = 96;

fn png_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(SIZE, SIZE, image::Rgb([30, 90, 150]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn credentials() -> Credentials {
    Credentials {
        api_key: None,
        page_access_token: Some("page-token".into()),
        page_id: Some("12345".into()),
    }
}

fn config_for(tmp: &TempDir, stock: &MockServer, graph: &MockServer) -> PressConfig {
    let mut config = PressConfig::default();
    config.bank.path = tmp.path().join("bank.jsonl");
    config.stock.url = stock.base_url();
    config.graph.base_url = graph.base_url();
    config.render.width = SIZE;
    config.render.height = SIZE;
    config.render.font_size = 12;
    config.render.output = tmp.path().join("temp_post_image.jpg");
    config.render.fonts = vec![tmp.path().join("no-such-font.ttf")];
    config
}

fn run(config: &PressConfig) -> (RunOutcome, Vec<RunEvent>) {
    let source = PicsumSource::new(&config.stock).unwrap();
    let resolver = FontPathResolver::new(config.render.fonts.clone());
    let mut events = Vec::new();
    let outcome = post_once(
        config,
        &credentials(),
        &ContentBank::new(&config.bank.path),
        &source,
        &resolver,
        &mut |e: &RunEvent| events.push(e.clone()),
    );
    (outcome, events)
}

fn write_bank(path: &Path) {
    std::fs::write(
        path,
        "{\"caption\":\"A\",\"image_prompt\":\"x\"}\n{\"caption\":\"B\",\"image_prompt\":\"y\"}\n",
    )
    .unwrap();
}

#[test]
fn publishes_first_entry_and_cleans_up() {
    let stock = MockServer::start();
    let photo = stock.mock(|when, then| {
        when.method("GET").path(format!("/{SIZE}/{SIZE}"));
        then.status(200)
            .header("content-type", "image/png")
            .body(png_bytes());
    });
    let graph = MockServer::start();
    let upload = graph.mock(|when, then| {
        when.method("POST")
            .path("/v21.0/12345/photos")
            .body_includes("name=\"message\"")
            .body_includes("Coffee or tea?")
            .body_includes("name=\"access_token\"")
            .body_includes("page-token")
            .body_includes("name=\"source\"; filename=\"post.jpg\"")
            .body_includes("image/jpeg");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"id":"67890","post_id":"12345_67890"}"#);
    });

    let tmp = TempDir::new().unwrap();
    let config = config_for(&tmp, &stock, &graph);
    std::fs::write(
        &config.bank.path,
        "{\"caption\":\"Coffee or tea?\",\"image_prompt\":\"x\"}\n{\"caption\":\"B\",\"image_prompt\":\"y\"}\n",
    )
    .unwrap();

    let (outcome, events) = run(&config);
    photo.assert();
    upload.assert();
    assert_eq!(
        outcome,
        RunOutcome::Published {
            post_id: PostId("12345_67890".into())
        }
    );
    assert_eq!(outcome.exit_code(false), 0);
    assert_eq!(
        events[0],
        RunEvent::Loaded {
            caption: "Coffee or tea?".into(),
            remaining: 1
        }
    );
    assert!(!config.render.output.exists());
    assert_eq!(
        std::fs::read_to_string(&config.bank.path).unwrap(),
        "{\"caption\":\"B\",\"image_prompt\":\"y\"}\n"
    );
}

#[test]
fn rejected_upload_keeps_image_and_consumes_entry() {
    let stock = MockServer::start();
    stock.mock(|when, then| {
        when.method("GET").path(format!("/{SIZE}/{SIZE}"));
        then.status(200).body(png_bytes());
    });
    let graph = MockServer::start();
    graph.mock(|when, then| {
        when.method("POST").path("/v21.0/12345/photos");
        then.status(400)
            .header("content-type", "application/json")
            .body(r#"{"error":{"message":"Invalid OAuth access token"}}"#);
    });

    let tmp = TempDir::new().unwrap();
    let config = config_for(&tmp, &stock, &graph);
    write_bank(&config.bank.path);

    let (outcome, events) = run(&config);
    assert_eq!(
        outcome,
        RunOutcome::PublishFailed {
            image: config.render.output.clone()
        }
    );
    assert_eq!(outcome.exit_code(false), 0);
    assert_eq!(outcome.exit_code(true), 1);
    assert!(config.render.output.exists());
    match events.last() {
        Some(RunEvent::PublishFailed { message, .. }) => {
            assert!(message.contains("400"));
            assert!(message.contains("Invalid OAuth"));
        }
        other => panic!("expected PublishFailed, got {other:?}"),
    }
    assert_eq!(ContentBank::new(&config.bank.path).len().unwrap(), 1);
}

#[test]
fn stock_outage_is_a_render_failure() {
    let stock = MockServer::start();
    stock.mock(|when, then| {
        when.method("GET").path(format!("/{SIZE}/{SIZE}"));
        then.status(503);
    });
    let graph = MockServer::start();

    let tmp = TempDir::new().unwrap();
    let config = config_for(&tmp, &stock, &graph);
    write_bank(&config.bank.path);

    let (outcome, _) = run(&config);
    assert_eq!(outcome, RunOutcome::RenderFailed);
    assert_eq!(outcome.exit_code(false), 1);
    assert!(!config.render.output.exists());
    assert_eq!(ContentBank::new(&config.bank.path).len().unwrap(), 1);
}

#[test]
fn publisher_reports_unknown_id_when_response_has_none() {
    let graph = MockServer::start();
    graph.mock(|when, then| {
        when.method("POST").path("/v21.0/12345/photos");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"success":true}"#);
    });

    let tmp = TempDir::new().unwrap();
    let image = tmp.path().join("post.jpg");
    std::fs::write(&image, b"not really a jpeg").unwrap();

    let mut config = PressConfig::default();
    config.graph.base_url = graph.base_url();
    let publisher = PagePublisher::new(&config.graph, &config.publish, &credentials()).unwrap();
    let post_id = publisher.publish_photo("Caption", &image).unwrap();
    assert_eq!(post_id, PostId("unknown".into()));
    assert!(!image.exists());
}

#[test]
fn publisher_missing_image_is_io_error() {
    let graph = MockServer::start();
    let tmp = TempDir::new().unwrap();

    let mut config = PressConfig::default();
    config.graph.base_url = graph.base_url();
    let publisher = PagePublisher::new(&config.graph, &config.publish, &credentials()).unwrap();
    let err = publisher
        .publish_photo("Caption", &tmp.path().join("gone.jpg"))
        .unwrap_err();
    assert!(matches!(err, PublishError::Io(_)));
}

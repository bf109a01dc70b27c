use car_detect_cli::render::{self, Message};
use car_detect_cli::ui;
use car_detect_cli::{ApiClient, Config, DetectError, DetectionResult, UploadRequest};
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// The blocking client owns its own runtime, so it is built, used and
// dropped on a blocking thread.
async fn run_detect(
    config: Config,
    req: UploadRequest,
) -> Result<DetectionResult, DetectError> {
    tokio::task::spawn_blocking(move || ApiClient::new(&config)?.detect(&req))
        .await
        .unwrap()
}

fn config_for(server: &MockServer) -> Config {
    Config::new(&server.uri()).unwrap()
}

fn image_req() -> UploadRequest {
    UploadRequest::from_data_uri("data:image/jpeg;base64,/9j/4AAQ")
}

#[tokio::test]
async fn posts_stripped_payload_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "image": "/9j/4AAQ" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Image analyzed & stored successfully",
            "id": "rec-1",
            "labels": [{ "Name": "Car", "Confidence": 91.234 }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = run_detect(config_for(&server), image_req()).await.unwrap();
    assert_eq!(result.id.as_deref(), Some("rec-1"));
    assert_eq!(
        render::render_result(&result),
        Message::Success("Labels: Car (91.23%)".into())
    );
}

#[tokio::test]
async fn analyze_file_sends_file_contents() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .and(body_json(json!({ "image": "aGVsbG8=" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "labels": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    file.write_all(b"hello").unwrap();
    let image: PathBuf = file.path().to_path_buf();
    let config = config_for(&server);

    let result = tokio::task::spawn_blocking(move || ApiClient::new(&config)?.analyze_file(&image))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(render::render_result(&result).text(), "No labels detected");
}

#[tokio::test]
async fn unreadable_file_issues_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let err = tokio::task::spawn_blocking(move || {
        ApiClient::new(&config)?.analyze_file(std::path::Path::new("/no/such/car.png"))
    })
    .await
    .unwrap()
    .unwrap_err();
    assert!(matches!(err, DetectError::FileRead { .. }));
    assert!(render::render_error(&err).unwrap().text().starts_with("Fetch error: "));
}

#[tokio::test]
async fn backend_error_message_is_rendered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "bad image" })))
        .expect(1)
        .mount(&server)
        .await;

    let err = run_detect(config_for(&server), image_req()).await.unwrap_err();
    assert_eq!(render::render_error(&err).unwrap().text(), "Error: bad image");
}

#[tokio::test]
async fn backend_error_without_message_is_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = run_detect(config_for(&server), image_req()).await.unwrap_err();
    assert!(matches!(err, DetectError::Backend { message: None, .. }));
    assert_eq!(render::render_error(&err).unwrap().text(), "Error: Unknown error");
}

#[tokio::test]
async fn non_json_success_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = run_detect(config_for(&server), image_req()).await.unwrap_err();
    assert!(matches!(err, DetectError::MalformedResponse(_)));
}

#[tokio::test]
async fn connection_refused_is_network_error() {
    // Port 1 is reserved and nothing listens on it.
    let config = Config::new("http://127.0.0.1:1").unwrap();
    let err = run_detect(config, image_req()).await.unwrap_err();
    match &err {
        DetectError::Network(inner) => assert_eq!(err.to_string(), inner.to_string()),
        other => panic!("expected network error, got {other:?}"),
    }
    let text = render::render_error(&err).unwrap().text().to_string();
    assert!(text.starts_with("Fetch error: "));
    assert!(text.len() > "Fetch error: ".len());
}

#[tokio::test]
async fn timeout_is_retried_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "labels": [] }))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.timeout = Duration::from_millis(200);
    let err = run_detect(config, image_req()).await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn no_retry_sends_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "labels": [] }))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.timeout = Duration::from_millis(200);
    config.retry = false;
    let err = run_detect(config, image_req()).await.unwrap_err();
    assert!(matches!(err, DetectError::Network(_)));
}

#[tokio::test]
async fn backend_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "error": "busy" })))
        .expect(1)
        .mount(&server)
        .await;

    let err = run_detect(config_for(&server), image_req()).await.unwrap_err();
    assert_eq!(render::render_error(&err).unwrap().text(), "Error: busy");
}

#[tokio::test]
async fn empty_backend_error_falls_back_to_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "" })))
        .expect(1)
        .mount(&server)
        .await;

    let err = run_detect(config_for(&server), image_req()).await.unwrap_err();
    assert!(matches!(err, DetectError::Backend { message: None, .. }));
    assert_eq!(render::render_error(&err).unwrap().text(), "Error: Unknown error");
}

#[tokio::test]
async fn success_without_labels_renders_no_labels() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok", "id": "x" })))
        .expect(1)
        .mount(&server)
        .await;

    let result = run_detect(config_for(&server), image_req()).await.unwrap();
    assert_eq!(
        render::render_result(&result),
        Message::Success("No labels detected".into())
    );
}

#[tokio::test]
async fn null_labels_render_no_labels() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "labels": null })))
        .mount(&server)
        .await;

    let result = run_detect(config_for(&server), image_req()).await.unwrap();
    assert_eq!(render::render_result(&result).text(), "No labels detected");
}

#[tokio::test]
async fn submit_without_file_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let ok = tokio::task::spawn_blocking(move || ui::submit(&ApiClient::new(&config)?, None))
        .await
        .unwrap()
        .unwrap();
    assert!(ok);
}

#[tokio::test]
async fn submit_rejects_non_image_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "labels": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    file.write_all(b"not an image").unwrap();
    let notes: PathBuf = file.path().to_path_buf();
    let config = config_for(&server);

    let ok = tokio::task::spawn_blocking(move || ui::submit(&ApiClient::new(&config)?, Some(notes)))
        .await
        .unwrap()
        .unwrap();
    assert!(!ok);
}

#[tokio::test]
async fn second_detect_while_pending_is_busy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "labels": [] }))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let (first, second) = tokio::task::spawn_blocking(move || {
        let api = ApiClient::new(&config).unwrap();
        let other = api.clone();
        let handle = std::thread::spawn(move || other.detect(&image_req()));

        let deadline = Instant::now() + Duration::from_secs(5);
        while !api.is_pending() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        let second = api.detect(&image_req());
        (handle.join().unwrap(), second)
    })
    .await
    .unwrap();

    assert!(first.is_ok());
    assert!(matches!(second, Err(DetectError::Busy)));
}

use std::sync::{Arc, Mutex};
use std::time::Duration;

use drhp_client::{
    ApiSettings, Backend, FailureKind, ProgressSink, Readiness, ReportSourceKind, ReqwestBackend,
    StatusUpdate, StreamOutcome,
};
use pretty_assertions::assert_eq;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;
use wiremock::matchers::{body_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    updates: Arc<Mutex<Vec<StatusUpdate>>>,
}

impl TestSink {
    fn take(&self) -> Vec<StatusUpdate> {
        self.updates.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, update: StatusUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

fn settings(server: &MockServer) -> ApiSettings {
    ApiSettings::new(Url::parse(&server.uri()).unwrap())
}

fn backend(server: &MockServer) -> ReqwestBackend {
    ReqwestBackend::new(settings(server)).unwrap()
}

fn event_stream(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/event-stream")
}

fn pdf_file(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"%PDF-1.7 test").unwrap();
    path
}

#[tokio::test]
async fn lists_companies_in_either_schema() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"[{"id":"1","name":"Acme","corporate_identity_number":"U1","website_link":null,
                 "created_at":"2024-01-15T10:00:00Z","processing_status":"PROCESSING"},
                {"id":"65a1","name":"Beta","uin":"U2","uploadDate":"2024-02-01","hasMarkdown":true}]"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let companies = backend(&server).list_companies().await.unwrap();
    assert_eq!(companies.len(), 2);
    assert_eq!(companies[0].readiness(), Readiness::Processing);
    assert_eq!(companies[1].readiness(), Readiness::Ready);
    assert_eq!(companies[1].corporate_identity_number, "U2");
}

#[tokio::test]
async fn upload_streams_progress_then_completes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/companies/"))
        .and(body_string_contains("filename=\"drhp.pdf\""))
        .respond_with(event_stream(
            "data: {\"step\":\"parse\",\"message\":\"Parsing\",\"status\":\"PROCESSING\",\"progress\":40}\n\n\
             data: {\"status\":\"COMPLETED\",\"markdown\":\"# Title\"}\n\n",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = pdf_file(&dir, "drhp.pdf");
    let sink = TestSink::default();

    let outcome = backend(&server).upload_drhp(&file, &sink).await.unwrap();
    assert_eq!(
        outcome,
        StreamOutcome::Completed {
            markdown: "# Title".to_string()
        }
    );
    let updates = sink.take();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].progress, Some(40));
    assert_eq!(updates[0].step.as_deref(), Some("parse"));
}

#[tokio::test]
async fn failed_record_ends_the_stream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/companies/"))
        .respond_with(event_stream(
            "data: {\"status\":\"FAILED\",\"message\":\"Could not parse DRHP\"}\n\n\
             data: {\"status\":\"COMPLETED\",\"markdown\":\"ignored\"}\n\n",
        ))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = pdf_file(&dir, "drhp.pdf");
    let outcome = backend(&server)
        .upload_drhp(&file, &TestSink::default())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        StreamOutcome::Failed {
            message: "Could not parse DRHP".to_string()
        }
    );
}

#[tokio::test]
async fn stream_without_terminal_record_reports_ended() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/companies/42/regenerate"))
        .respond_with(event_stream(
            "data: {\"step\":\"embed\",\"message\":\"Embedding\",\"status\":\"PROCESSING\",\"progress\":60}\n\n\
             data: {\"status\":\"PROCE",
        ))
        .mount(&server)
        .await;

    let sink = TestSink::default();
    let outcome = backend(&server).regenerate("42", &sink).await.unwrap();
    assert_eq!(outcome, StreamOutcome::Ended);
    assert_eq!(sink.take().len(), 1);
}

#[tokio::test]
async fn slow_response_headers_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/companies/42/regenerate"))
        .respond_with(
            event_stream("data: {\"status\":\"COMPLETED\",\"markdown\":\"late\"}\n\n")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let mut settings = settings(&server);
    settings.stream_idle_timeout = Duration::from_millis(100);
    let backend = ReqwestBackend::new(settings).unwrap();

    let outcome = backend
        .regenerate("42", &TestSink::default())
        .await
        .unwrap();
    assert_eq!(outcome, StreamOutcome::TimedOut);
}

/// Serves one progress record over chunked encoding, then holds the connection open.
async fn stalling_stream_server(record: &'static str) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            let read = socket.read(&mut buf).await.unwrap();
            if read == 0 {
                return;
            }
            request.extend_from_slice(&buf[..read]);
        }
        let head = "HTTP/1.1 200 OK\r\n\
                    content-type: text/event-stream\r\n\
                    transfer-encoding: chunked\r\n\r\n";
        let chunk = format!("{:x}\r\n{record}\r\n", record.len());
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(chunk.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

#[tokio::test]
async fn stream_that_stalls_after_progress_times_out() {
    let base_url = stalling_stream_server(
        "data: {\"step\":\"parse\",\"message\":\"Parsing\",\"status\":\"PROCESSING\",\"progress\":10}\n\n",
    )
    .await;
    let mut settings = ApiSettings::new(base_url);
    settings.stream_idle_timeout = Duration::from_millis(200);
    let backend = ReqwestBackend::new(settings).unwrap();

    let sink = TestSink::default();
    let outcome = backend.regenerate("42", &sink).await.unwrap();
    assert_eq!(outcome, StreamOutcome::TimedOut);
    let updates = sink.take();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].message, "Parsing");
    assert_eq!(updates[0].progress, Some(10));
}

#[tokio::test]
async fn error_detail_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/companies/"))
        .respond_with(ResponseTemplate::new(400).set_body_raw(
            r#"{"detail":"Company already exists"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = pdf_file(&dir, "drhp.pdf");
    let err = backend(&server)
        .upload_drhp(&file, &TestSink::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(400));
    assert_eq!(err.message, "Company already exists");
}

#[tokio::test]
async fn missing_upload_file_is_an_io_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let err = backend(&server)
        .upload_drhp(&dir.path().join("gone.pdf"), &TestSink::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Io);
}

#[tokio::test]
async fn render_pdf_posts_markdown_and_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reports/generate-pdf"))
        .and(body_json(serde_json::json!({
            "markdown_content": "# Title",
            "company_name": "drhp"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-report".to_vec(), "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;

    let pdf = backend(&server).render_pdf("# Title", "drhp").await.unwrap();
    assert_eq!(&pdf[..], b"%PDF-report");
}

#[tokio::test]
async fn fetch_report_via_markdown_renders_pdf() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies/1/report"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r##"{"markdown":"# Acme"}"##,
            "application/json",
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/reports/generate-pdf"))
        .and(body_json(serde_json::json!({
            "markdown_content": "# Acme",
            "company_name": "Acme"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-acme".to_vec(), "application/pdf"))
        .mount(&server)
        .await;

    let artifact = backend(&server).fetch_report("1", "Acme").await.unwrap();
    assert_eq!(&artifact.pdf[..], b"%PDF-acme");
    assert_eq!(artifact.markdown.as_deref(), Some("# Acme"));
}

#[tokio::test]
async fn fetch_report_as_pdf() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/report/65a1"))
        .and(query_param("format", "pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-direct".to_vec(), "application/pdf"))
        .mount(&server)
        .await;

    let mut settings = settings(&server);
    settings.report_source = ReportSourceKind::Pdf;
    let artifact = ReqwestBackend::new(settings)
        .unwrap()
        .fetch_report("65a1", "Beta")
        .await
        .unwrap();
    assert_eq!(&artifact.pdf[..], b"%PDF-direct");
    assert_eq!(artifact.markdown, None);
}

#[tokio::test]
async fn delete_company_hits_the_company_resource() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/companies/7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    backend(&server).delete_company("7").await.unwrap();
}

#[tokio::test]
async fn delete_failure_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/companies/7"))
        .respond_with(ResponseTemplate::new(404).set_body_raw(
            r#"{"detail":"Company not found"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let err = backend(&server).delete_company("7").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
    assert_eq!(err.message, "Company not found");
}

#[tokio::test]
async fn company_ids_are_encoded_as_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/companies/a%2Fb%3Fc%23d"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    backend(&server).delete_company("a/b?c#d").await.unwrap();
}

#[tokio::test]
async fn endpoints_keep_the_base_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/companies/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
        .mount(&server)
        .await;

    let base_url = Url::parse(&format!("{}/api/", server.uri())).unwrap();
    let companies = ReqwestBackend::new(ApiSettings::new(base_url))
        .unwrap()
        .list_companies()
        .await
        .unwrap();
    assert!(companies.is_empty());
}

#[tokio::test]
async fn logo_upload_returns_asset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/assets/logos"))
        .and(body_string_contains("image/svg+xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"filename":"acme.png","logo_id":"logo-1"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let logo = dir.path().join("acme.svg");
    std::fs::write(&logo, b"<svg/>").unwrap();

    let asset = backend(&server)
        .upload_logo(&logo, "image/svg+xml")
        .await
        .unwrap();
    assert_eq!(asset.filename, "acme.png");
    assert_eq!(asset.logo_id, "logo-1");
}

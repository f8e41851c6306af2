//! Integration tests for the resumable upload session.

use bytes::Bytes;
use reelvault::config::StorageConfig;
use reelvault::upload::{TransferProgress, UploadSession};
use reelvault::UploadError;
use tokio::sync::mpsc;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, headers, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Acknowledge an append by echoing back the advanced offset, the way a
/// conformant resumable-upload server does.
struct AppendResponder;

impl Respond for AppendResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let offset: u64 = request
            .headers
            .get("Upload-Offset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let next = offset + request.body.len() as u64;
        ResponseTemplate::new(204).insert_header("Upload-Offset", next.to_string().as_str())
    }
}

fn storage_config(server: &MockServer, chunk_bytes: usize) -> StorageConfig {
    StorageConfig {
        api_base: server.uri(),
        api_key: "test-api-key".to_string(),
        vault_id: "vault-1".to_string(),
        upload_chunk_bytes: chunk_bytes,
        ..StorageConfig::default()
    }
}

async fn mount_create(server: &MockServer, file_id: &str) {
    Mock::given(method("POST"))
        .and(path("/uploads"))
        .and(header("Tus-Resumable", "1.0.0"))
        .and(header("Api-Key", "test-api-key"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Location", format!("{}/uploads/{}", server.uri(), file_id).as_str()),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_ten_megabyte_upload_in_three_chunks() {
    let server = MockServer::start().await;
    mount_create(&server, "remote-file-1").await;
    Mock::given(method("PATCH"))
        .and(path("/uploads/remote-file-1"))
        .and(header("Content-Type", "application/offset+octet-stream"))
        .respond_with(AppendResponder)
        .expect(3)
        .mount(&server)
        .await;

    let total: u64 = 10_485_760;
    let session = UploadSession::new(&storage_config(&server, 4 * 1024 * 1024));
    let metadata = session.metadata_for("clip.mp4", "video/mp4");
    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let file_id = session
        .upload(
            Bytes::from(vec![7u8; total as usize]),
            &metadata,
            Some(tx),
            &cancel,
        )
        .await
        .unwrap();

    // The remote id is the trailing path segment of the resource URL.
    assert_eq!(file_id.as_str(), "remote-file-1");

    let mut events: Vec<TransferProgress> = Vec::new();
    while let Ok(progress) = rx.try_recv() {
        events.push(progress);
    }
    assert_eq!(events.len(), 3);

    // Progress is monotonic, bounded by the total, and finishes exactly there.
    let mut last = 0;
    for progress in &events {
        assert!(progress.uploaded >= last);
        assert!(progress.uploaded <= progress.total);
        assert_eq!(progress.total, total);
        last = progress.uploaded;
    }
    assert_eq!(events.last().unwrap().uploaded, total);
    assert_eq!(events.last().unwrap().percent(), 100.0);
}

#[tokio::test]
async fn test_upload_metadata_names_the_vault() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/uploads"))
        .and(headers(
            "Upload-Metadata",
            vec![
                "filename Y2xpcC5tcDQ=",
                "filetype dmlkZW8vbXA0",
                "vaultId dmF1bHQtMQ==",
            ],
        ))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Location", format!("{}/uploads/f1", server.uri()).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/uploads/f1"))
        .respond_with(AppendResponder)
        .mount(&server)
        .await;

    let session = UploadSession::new(&storage_config(&server, 1024));
    let metadata = session.metadata_for("clip.mp4", "video/mp4");
    let cancel = CancellationToken::new();

    let file_id = assert_ok!(
        session
            .upload(Bytes::from_static(b"payload"), &metadata, None, &cancel)
            .await
    );
    assert_eq!(file_id.as_str(), "f1");
}

#[tokio::test]
async fn test_server_rejection_fails_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/uploads"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let session = UploadSession::new(&storage_config(&server, 1024));
    let metadata = session.metadata_for("clip.mp4", "video/mp4");
    let cancel = CancellationToken::new();

    let err = session
        .upload(Bytes::from_static(b"payload"), &metadata, None, &cancel)
        .await
        .unwrap_err();
    match err {
        UploadError::ServerRejected { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid api key");
        }
        other => panic!("expected ServerRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_mid_transfer_rejection_surfaces_without_retry() {
    let server = MockServer::start().await;
    mount_create(&server, "f2").await;
    Mock::given(method("PATCH"))
        .and(path("/uploads/f2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let session = UploadSession::new(&storage_config(&server, 1024));
    let metadata = session.metadata_for("clip.mp4", "video/mp4");
    let cancel = CancellationToken::new();

    let err = session
        .upload(Bytes::from_static(b"payload"), &metadata, None, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::ServerRejected { status: 500, .. }));
}

#[tokio::test]
async fn test_network_failure_is_reported() {
    // Nothing listens here; the create call fails at the transport level.
    let config = StorageConfig {
        api_base: "http://127.0.0.1:9".to_string(),
        ..StorageConfig::default()
    };
    let session = UploadSession::new(&config);
    let metadata = session.metadata_for("clip.mp4", "video/mp4");
    let cancel = CancellationToken::new();

    let err = session
        .upload(Bytes::from_static(b"payload"), &metadata, None, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Network(_)));
}

#[tokio::test]
async fn test_zero_byte_payload_makes_no_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let session = UploadSession::new(&storage_config(&server, 1024));
    let metadata = session.metadata_for("clip.mp4", "video/mp4");
    let cancel = CancellationToken::new();

    let err = session
        .upload(Bytes::new(), &metadata, None, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::EmptyPayload));
}

#[tokio::test]
async fn test_cancelled_session_aborts_and_goes_quiet() {
    let server = MockServer::start().await;
    mount_create(&server, "f3").await;
    Mock::given(method("PATCH"))
        .and(path("/uploads/f3"))
        .respond_with(AppendResponder)
        .mount(&server)
        .await;

    let session = UploadSession::new(&storage_config(&server, 1));
    let metadata = session.metadata_for("clip.mp4", "video/mp4");
    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = session
        .upload(Bytes::from_static(b"payload"), &metadata, Some(tx), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Cancelled));
    // No progress events are delivered after cancellation.
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_offset_regression_is_rejected() {
    struct StuckResponder;
    impl Respond for StuckResponder {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            ResponseTemplate::new(204).insert_header("Upload-Offset", "0")
        }
    }

    let server = MockServer::start().await;
    mount_create(&server, "f4").await;
    Mock::given(method("PATCH"))
        .and(path("/uploads/f4"))
        .respond_with(StuckResponder)
        .mount(&server)
        .await;

    let session = UploadSession::new(&storage_config(&server, 1024));
    let metadata = session.metadata_for("clip.mp4", "video/mp4");
    let cancel = CancellationToken::new();

    let err = session
        .upload(Bytes::from_static(b"payload"), &metadata, None, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        UploadError::OffsetMismatch {
            expected: 7,
            reported: 0
        }
    ));
}

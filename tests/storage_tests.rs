use procure_portal::storage::{
    MockStorageService, S3StorageClient, StorageError, StorageService, sanitize_key,
};
use uuid::Uuid;

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_presign_success() {
        let mock = MockStorageService::new();
        let key = "evidence/u1/e1/receipt.pdf";
        let result = mock.get_presigned_upload_url(key, "application/pdf").await;
        assert!(result.is_ok());

        let url = result.unwrap();
        assert!(url.contains("signature=fake"));
        assert!(url.contains(key));
    }

    #[tokio::test]
    async fn test_mock_presign_failure() {
        let mock = MockStorageService::new_failing();
        let result = mock.get_presigned_upload_url("receipt.pdf", "application/pdf").await;
        assert!(matches!(result, Err(StorageError::Backend(_))));
    }

    #[tokio::test]
    async fn test_mock_sanitization() {
        let mock = MockStorageService::new();
        let url = mock
            .get_presigned_upload_url("../../etc/passwd", "text/plain")
            .await
            .unwrap();
        assert!(!url.contains(".."));
    }

    #[tokio::test]
    async fn test_mock_download_and_delete() {
        let mock = MockStorageService::new().with_object("evidence/a.png", b"png", "image/png");

        let object = mock.download("evidence/a.png").await.unwrap();
        assert_eq!(object.bytes, b"png");
        assert!(matches!(
            mock.download("evidence/b.png").await,
            Err(StorageError::NotFound)
        ));

        mock.delete("evidence/a.png").await.unwrap();
        assert!(!mock.contains("evidence/a.png"));
        assert_eq!(mock.deleted_keys(), vec!["evidence/a.png".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_denied_key() {
        let mock = MockStorageService::new()
            .with_object("evidence/a.png", b"png", "image/png")
            .with_denied_key("evidence/a.png");

        assert!(matches!(
            mock.download("evidence/a.png").await,
            Err(StorageError::AccessDenied(_))
        ));
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("evidence/../../secrets/x"), "evidence/secrets/x");
        assert_eq!(sanitize_key("/evidence//u1/./a.pdf"), "evidence/u1/a.pdf");
    }
}

#[cfg(test)]
mod s3_tests {
    use super::*;

    #[tokio::test]
    async fn test_s3_client_creation() {
        let client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
        )
        .await;
        assert_eq!(client.bucket(), "testbucket");
    }

    #[tokio::test]
    async fn test_s3_presigned_url_format() {
        let client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
        )
        .await;

        // Presigning is local; no server needs to be listening.
        let key = format!("evidence/{}/{}/{}.pdf", Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let url = client
            .get_presigned_upload_url(&key, "application/pdf")
            .await
            .unwrap();

        assert!(url.contains("localhost:9000"));
        assert!(url.contains(&key));
    }
}

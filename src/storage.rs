use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::{
    config::http::HttpResponse,
    error::{DisplayErrorContext, SdkError},
    presigning::PresigningConfig,
};
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};
use thiserror::Error;

/// StoredObject
///
/// A blob fetched from the evidence bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    /// MIME type reported by the backend, when it has one.
    pub content_type: Option<String>,
}

impl StoredObject {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: Option<&str>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.map(str::to_string),
        }
    }
}

/// StorageError
///
/// Failure kinds of a single storage call. `AccessDenied` is kept apart from
/// `NotFound` so callers can tell a bucket policy problem from a missing key.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found")]
    NotFound,
    #[error("access denied for key {0}")]
    AccessDenied(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

// 1. StorageService Contract
/// StorageService
///
/// Abstract contract for the object storage layer holding payment evidence.
/// Handlers and the evidence resolver only see this trait, so the real S3
/// client (`S3StorageClient`) and the in-memory `MockStorageService` are
/// interchangeable.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the configured bucket exists. Used in `Env::Local` to provision
    /// the MinIO bucket. No-op in production.
    async fn ensure_bucket_exists(&self);

    /// Generates a temporary, signed URL that lets the browser upload a
    /// payment-proof file straight to the bucket.
    ///
    /// # Arguments
    /// * `key`: The final object key, e.g. `evidence/{user}/{event}/{uuid}.pdf`.
    /// * `content_type`: The MIME type the upload is constrained to.
    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Fetches the object stored at `key`.
    async fn download(&self, key: &str) -> Result<StoredObject, StorageError>;

    /// Removes the object at `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// The bucket every key is resolved against.
    fn bucket(&self) -> &str;
}

// 2. The Real Implementation (S3/MinIO/Supabase)
/// S3StorageClient
///
/// AWS SDK client pointed at the Supabase Storage S3 gateway in production
/// and at MinIO locally. `force_path_style(true)` is required by both.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    /// new
    ///
    /// Constructs the S3 client using credentials and configuration from AppConfig.
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        let client = s3::Client::from_conf(config);

        Self {
            client,
            bucket_name: bucket.to_string(),
        }
    }
}

/// Maps an SDK failure onto `StorageError` using the HTTP status of the raw
/// response, when one was received.
fn classify_sdk_error<E>(key: &str, err: &SdkError<E, HttpResponse>) -> StorageError
where
    E: std::error::Error + Send + Sync + 'static,
{
    match err.raw_response().map(|raw| raw.status().as_u16()) {
        Some(404) => StorageError::NotFound,
        Some(401) | Some(403) => StorageError::AccessDenied(key.to_string()),
        _ => StorageError::Backend(DisplayErrorContext(err).to_string()),
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// ensure_bucket_exists
    ///
    /// CreateBucket is idempotent, so this is safe to call at every startup.
    async fn ensure_bucket_exists(&self) {
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!("create_bucket returned: {}", e);
        }
    }

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        // Expiration constrained to 10 minutes.
        let expires_in = Duration::from_secs(600);
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            // Forces the client request to include this Content-Type header.
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(presigned_req.uri().to_string())
    }

    async fn download(&self, key: &str) -> Result<StoredObject, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if let SdkError::ServiceError(service) = &e {
                    if service.err().is_no_such_key() {
                        return StorageError::NotFound;
                    }
                }
                classify_sdk_error(key, &e)
            })?;

        let content_type = output.content_type().map(str::to_string);
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(StoredObject {
            bytes,
            content_type,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| classify_sdk_error(key, &e))?;
        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket_name
    }
}

/// sanitize_key
///
/// Removes directory navigation components (`..`, `.`) and empty segments
/// from a key.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

// 3. The Mock Implementation (For Tests)
/// MockStorageService
///
/// In-memory `StorageService` for tests. Objects live in a shared map; keys
/// can be marked as failing or access-denied, and every `download` call is
/// recorded so tests can assert probe order.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, presigning and downloads return a simulated backend failure.
    pub should_fail: bool,
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
    failing_keys: Arc<Mutex<HashSet<String>>>,
    denied_keys: Arc<Mutex<HashSet<String>>>,
    downloads: Arc<Mutex<Vec<String>>>,
    deleted: Arc<Mutex<Vec<String>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Seeds an object. Returns `self` for chaining in test setup.
    pub fn with_object(self, key: &str, bytes: &[u8], content_type: &str) -> Self {
        self.put(key, bytes, content_type);
        self
    }

    /// Downloads of `key` fail with a backend error.
    pub fn with_failing_key(self, key: &str) -> Self {
        lock(&self.failing_keys).insert(key.to_string());
        self
    }

    /// Downloads of `key` fail with `AccessDenied`.
    pub fn with_denied_key(self, key: &str) -> Self {
        lock(&self.denied_keys).insert(key.to_string());
        self
    }

    pub fn put(&self, key: &str, bytes: &[u8], content_type: &str) {
        lock(&self.objects).insert(
            key.to_string(),
            StoredObject::new(bytes.to_vec(), Some(content_type)),
        );
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.objects).contains_key(key)
    }

    /// Every key passed to `download`, in call order.
    pub fn download_calls(&self) -> Vec<String> {
        lock(&self.downloads).clone()
    }

    /// Every key passed to `delete`, in call order.
    pub fn deleted_keys(&self) -> Vec<String> {
        lock(&self.deleted).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // A poisoned lock only means another test thread panicked mid-update.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        if self.should_fail {
            return Err(StorageError::Backend(
                "Mock Storage Error: Simulation requested".to_string(),
            ));
        }

        let sanitized_key = sanitize_key(key);

        // Deterministic, local-style URL for mock assertions.
        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitized_key
        ))
    }

    async fn download(&self, key: &str) -> Result<StoredObject, StorageError> {
        lock(&self.downloads).push(key.to_string());

        if self.should_fail || lock(&self.failing_keys).contains(key) {
            return Err(StorageError::Backend(format!("simulated failure for {}", key)));
        }
        if lock(&self.denied_keys).contains(key) {
            return Err(StorageError::AccessDenied(key.to_string()));
        }

        lock(&self.objects)
            .get(key)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        lock(&self.deleted).push(key.to_string());
        lock(&self.objects).remove(key);
        Ok(())
    }

    fn bucket(&self) -> &str {
        "mock-bucket"
    }
}

/// StorageState
///
/// The concrete type used to share the storage service across the application state.
pub type StorageState = Arc<dyn StorageService>;

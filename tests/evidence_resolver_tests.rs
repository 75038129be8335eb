use async_trait::async_trait;
use procure_portal::{
    evidence::{EvidenceResolution, EvidenceResolver, evidence_key},
    storage::{MockStorageService, StorageError, StorageService, StoredObject},
};
use std::time::Duration;
use uuid::Uuid;

const SUPABASE_PUBLIC_PATH: &str = "/storage/v1/object/public/evidence/u1/e1/file.pdf";
const CANONICAL: &str = "evidence/u1/e1/file.pdf";

// --- Candidate generation ---

#[test]
fn test_public_storage_path_yields_canonical_candidate() {
    let storage = MockStorageService::new();
    let resolver = EvidenceResolver::new(&storage).for_user("u1");

    let candidates = resolver.candidate_paths(SUPABASE_PUBLIC_PATH);
    assert_eq!(candidates[0], SUPABASE_PUBLIC_PATH);
    assert!(candidates.contains(&CANONICAL.to_string()));

    let probes = resolver.probe_order(SUPABASE_PUBLIC_PATH);
    assert!(probes.contains(&CANONICAL.to_string()));
    assert!(probes.iter().all(|p| p.contains("u1")));
    // The bare filename is generated but filtered out.
    assert!(candidates.contains(&"file.pdf".to_string()));
    assert!(!probes.contains(&"file.pdf".to_string()));
}

#[test]
fn test_each_prefix_is_stripped_independently() {
    let storage = MockStorageService::new();
    let resolver = EvidenceResolver::new(&storage);

    let candidates = resolver.candidate_paths(SUPABASE_PUBLIC_PATH);
    assert_eq!(
        &candidates[..4],
        &[
            SUPABASE_PUBLIC_PATH.to_string(),
            "public/evidence/u1/e1/file.pdf".to_string(),
            CANONICAL.to_string(),
            "storage/v1/object/public/evidence/u1/e1/file.pdf".to_string(),
        ]
    );
}

#[test]
fn test_surrounding_whitespace_is_tried_as_stored_first() {
    let storage = MockStorageService::new();
    let resolver = EvidenceResolver::new(&storage);

    let stored = format!(" {}\n", CANONICAL);
    let candidates = resolver.candidate_paths(&stored);
    assert_eq!(candidates[0], stored);
    assert_eq!(candidates[1], CANONICAL);
}

#[test]
fn test_legacy_folder_is_renamed() {
    let storage = MockStorageService::new();
    let resolver = EvidenceResolver::new(&storage);

    let candidates = resolver.candidate_paths("payment-evidence/u1/file.pdf");
    assert_eq!(candidates[0], "payment-evidence/u1/file.pdf");
    assert!(candidates.contains(&"evidence/u1/file.pdf".to_string()));
}

#[test]
fn test_candidates_are_unique_and_non_empty() {
    let storage = MockStorageService::new();
    let resolver = EvidenceResolver::new(&storage);

    for path in [
        SUPABASE_PUBLIC_PATH,
        "payment-evidence/u1/file.pdf",
        "public/evidence/u1/e1/file.pdf",
        "//evidence//u1/e1/file.pdf",
        "file.pdf",
    ] {
        let candidates = resolver.candidate_paths(path);
        let mut deduped = candidates.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), candidates.len(), "duplicates for {}", path);
        assert!(candidates.iter().all(|c| !c.is_empty()));
    }
}

#[test]
fn test_full_url_strips_origin_query_and_bucket() {
    let storage = MockStorageService::new();
    let resolver = EvidenceResolver::new(&storage);
    let url = "https://abc.supabase.co/storage/v1/object/public/mock-bucket/evidence/u1/e1/file.pdf?token=xyz";

    let candidates = resolver.candidate_paths(url);
    assert_eq!(candidates[0], url);
    assert!(candidates.contains(&CANONICAL.to_string()));
    assert!(candidates.iter().skip(1).all(|c| !c.contains('?')));
}

#[test]
fn test_missing_user_folder_is_rebuilt_from_uuid_segments() {
    let storage = MockStorageService::new();
    let user_id = Uuid::new_v4();
    let event_id = Uuid::new_v4();
    let stored = format!("uploads/{}/proof.png", event_id);

    let resolver = EvidenceResolver::new(&storage).for_user(user_id.to_string());
    let probes = resolver.probe_order(&stored);

    assert_eq!(
        probes,
        vec![format!("evidence/{}/{}/proof.png", user_id, event_id)]
    );
}

#[test]
fn test_empty_user_id_disables_filter() {
    let storage = MockStorageService::new();
    let resolver = EvidenceResolver::new(&storage).for_user("");

    assert_eq!(
        resolver.probe_order(SUPABASE_PUBLIC_PATH),
        resolver.candidate_paths(SUPABASE_PUBLIC_PATH)
    );
}

// --- Probing ---

#[tokio::test]
async fn test_first_successful_candidate_wins() {
    let storage = MockStorageService::new()
        .with_object(CANONICAL, b"%PDF-1.7", "application/pdf")
        .with_object("u1/e1/file.pdf", b"stale copy", "application/pdf");
    let resolver = EvidenceResolver::new(&storage).for_user("u1");

    let resolution = resolver.resolve_and_download(SUPABASE_PUBLIC_PATH).await;

    match resolution {
        EvidenceResolution::Found {
            resolved_path,
            object,
        } => {
            assert_eq!(resolved_path, CANONICAL);
            assert_eq!(object.bytes, b"%PDF-1.7");
            assert_eq!(object.content_type.as_deref(), Some("application/pdf"));
        }
        other => panic!("expected a hit, got {:?}", other),
    }
    // Probing stops at the first hit.
    assert_eq!(
        storage.download_calls(),
        vec![
            SUPABASE_PUBLIC_PATH.to_string(),
            "public/evidence/u1/e1/file.pdf".to_string(),
            CANONICAL.to_string(),
        ]
    );
}

#[tokio::test]
async fn test_blob_under_partially_stripped_key_is_found() {
    for key in [
        "public/evidence/u1/e1/file.pdf",
        "storage/v1/object/public/evidence/u1/e1/file.pdf",
    ] {
        let storage = MockStorageService::new().with_object(key, b"legacy", "application/pdf");
        let resolver = EvidenceResolver::new(&storage).for_user("u1");

        let resolution = resolver.resolve_and_download(SUPABASE_PUBLIC_PATH).await;

        assert_eq!(resolution.resolved_path(), Some(key));
    }
}

#[tokio::test]
async fn test_verbatim_path_is_tried_first() {
    let storage =
        MockStorageService::new().with_object(SUPABASE_PUBLIC_PATH, b"as stored", "image/png");
    let resolver = EvidenceResolver::new(&storage);

    let resolution = resolver.resolve_and_download(SUPABASE_PUBLIC_PATH).await;

    assert_eq!(resolution.resolved_path(), Some(SUPABASE_PUBLIC_PATH));
    assert_eq!(storage.download_calls().len(), 1);
}

#[tokio::test]
async fn test_exhaustion_reports_every_attempt() {
    let storage = MockStorageService::new();
    let resolver = EvidenceResolver::new(&storage);

    let resolution = resolver.resolve_and_download(SUPABASE_PUBLIC_PATH).await;

    assert!(!resolution.is_found());
    assert_eq!(
        resolution.attempted_paths(),
        resolver.candidate_paths(SUPABASE_PUBLIC_PATH).as_slice()
    );
    assert_eq!(storage.download_calls(), resolution.attempted_paths());
}

#[tokio::test]
async fn test_ownership_filter_limits_probes() {
    let storage = MockStorageService::new().with_object("file.pdf", b"someone else's", "application/pdf");
    let resolver = EvidenceResolver::new(&storage).for_user("u1");

    let resolution = resolver.resolve_and_download(SUPABASE_PUBLIC_PATH).await;

    assert!(!resolution.is_found());
    assert!(storage.download_calls().iter().all(|k| k.contains("u1")));
}

#[tokio::test]
async fn test_failing_probe_does_not_stop_resolution() {
    let storage = MockStorageService::new()
        .with_failing_key(SUPABASE_PUBLIC_PATH)
        .with_object(CANONICAL, b"ok", "application/pdf");
    let resolver = EvidenceResolver::new(&storage).for_user("u1");

    let resolution = resolver.resolve_and_download(SUPABASE_PUBLIC_PATH).await;

    assert_eq!(resolution.resolved_path(), Some(CANONICAL));
}

#[tokio::test]
async fn test_access_denied_is_reported_separately() {
    let storage = MockStorageService::new().with_denied_key(CANONICAL);
    let resolver = EvidenceResolver::new(&storage).for_user("u1");

    match resolver.resolve_and_download(SUPABASE_PUBLIC_PATH).await {
        EvidenceResolution::NotFound {
            attempted_paths,
            denied_paths,
        } => {
            assert!(attempted_paths.contains(&CANONICAL.to_string()));
            assert_eq!(denied_paths, vec![CANONICAL.to_string()]);
        }
        other => panic!("expected a miss, got {:?}", other),
    }
}

/// Storage whose first key never answers.
struct StallingStorage {
    stalled_key: &'static str,
    inner: MockStorageService,
}

#[async_trait]
impl StorageService for StallingStorage {
    async fn ensure_bucket_exists(&self) {}

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.inner.get_presigned_upload_url(key, content_type).await
    }

    async fn download(&self, key: &str) -> Result<StoredObject, StorageError> {
        if key == self.stalled_key {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.inner.download(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.inner.delete(key).await
    }

    fn bucket(&self) -> &str {
        self.inner.bucket()
    }
}

#[tokio::test]
async fn test_stalled_probe_times_out_and_moves_on() {
    let storage = StallingStorage {
        stalled_key: SUPABASE_PUBLIC_PATH,
        inner: MockStorageService::new().with_object(CANONICAL, b"ok", "application/pdf"),
    };
    let resolver = EvidenceResolver::new(&storage)
        .for_user("u1")
        .with_probe_timeout(Duration::from_millis(50));

    let started = std::time::Instant::now();
    let resolution = resolver.resolve_and_download(SUPABASE_PUBLIC_PATH).await;

    assert_eq!(resolution.resolved_path(), Some(CANONICAL));
    assert!(started.elapsed() < Duration::from_secs(5));
}

// --- Key helpers ---

#[test]
fn test_evidence_key_layout() {
    let user_id = Uuid::from_u128(1);
    let event_id = Uuid::from_u128(2);
    let file_id = Uuid::from_u128(3);

    assert_eq!(
        evidence_key(user_id, event_id, file_id, "pdf"),
        format!("evidence/{}/{}/{}.pdf", user_id, event_id, file_id)
    );
}

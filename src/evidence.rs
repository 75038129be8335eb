//! Payment-evidence path resolution.
//!
//! Registration records store the location of their payment proof as a
//! free-form string. Over the life of the portal that string has been written
//! in several shapes:
//!
//! * full Supabase public URLs (`https://x.supabase.co/storage/v1/object/public/...`),
//! * keys carrying a redundant `storage/v1/object/public/` or `public/` prefix,
//! * keys under the old `payment-evidence/` folder instead of `evidence/`,
//! * the canonical `evidence/{user_id}/{event_id}/{file}` layout.
//!
//! [`EvidenceResolver`] reconciles these at read time. It expands the stored
//! string into an ordered set of candidate keys, most specific first, and
//! probes storage one candidate at a time until a download succeeds.

use std::{collections::HashSet, time::Duration};

use uuid::Uuid;

use crate::storage::{StorageError, StorageService, StoredObject};

/// Current evidence folder inside the bucket.
pub const EVIDENCE_PREFIX: &str = "evidence/";
/// Folder name used before the rename.
pub const LEGACY_EVIDENCE_PREFIX: &str = "payment-evidence/";

/// Default bound on a single storage probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Prefixes stripped from the stored path one at a time, in priority order.
const STRIPPABLE_PREFIXES: [&str; 3] = [
    "/storage/v1/object/",
    "/storage/v1/object/public/",
    "public/",
];

/// Storage API path markers, longest first so the public variant wins.
const STORAGE_API_MARKERS: [&str; 2] = ["storage/v1/object/public/", "storage/v1/object/"];

/// EvidenceResolution
///
/// Outcome of [`EvidenceResolver::resolve_and_download`]. A miss is a value,
/// not an error.
#[derive(Debug)]
pub enum EvidenceResolution {
    Found {
        /// The candidate key that produced the blob.
        resolved_path: String,
        object: StoredObject,
    },
    NotFound {
        /// Every key that was probed, in probe order.
        attempted_paths: Vec<String>,
        /// The subset of `attempted_paths` the backend refused with an
        /// authorization error rather than a plain miss.
        denied_paths: Vec<String>,
    },
}

impl EvidenceResolution {
    pub fn is_found(&self) -> bool {
        matches!(self, EvidenceResolution::Found { .. })
    }

    pub fn resolved_path(&self) -> Option<&str> {
        match self {
            EvidenceResolution::Found { resolved_path, .. } => Some(resolved_path),
            EvidenceResolution::NotFound { .. } => None,
        }
    }

    pub fn attempted_paths(&self) -> &[String] {
        match self {
            EvidenceResolution::Found { .. } => &[],
            EvidenceResolution::NotFound {
                attempted_paths, ..
            } => attempted_paths,
        }
    }
}

/// Insertion-ordered set of candidate keys. Empty strings are never stored.
#[derive(Debug, Default)]
struct CandidateSet {
    ordered: Vec<String>,
    seen: HashSet<String>,
}

impl CandidateSet {
    fn push(&mut self, candidate: impl Into<String>) {
        let candidate = candidate.into();
        if candidate.is_empty() || self.seen.contains(&candidate) {
            return;
        }
        self.seen.insert(candidate.clone());
        self.ordered.push(candidate);
    }

    fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}

/// EvidenceResolver
///
/// Per-request resolver. Holds no state beyond its configuration, so one can
/// be built for every call.
pub struct EvidenceResolver<'a> {
    storage: &'a dyn StorageService,
    user_id: Option<String>,
    probe_timeout: Duration,
}

impl<'a> EvidenceResolver<'a> {
    pub fn new(storage: &'a dyn StorageService) -> Self {
        Self {
            storage,
            user_id: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Restricts probing to keys containing `user_id`.
    ///
    /// The check is a substring match on the key, not a structural ownership
    /// proof. Handlers verify `registration.user_id` against the database
    /// before resolving.
    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        self.user_id = (!user_id.is_empty()).then_some(user_id);
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// All candidate keys for `original_path`, in priority order, before the
    /// ownership filter.
    pub fn candidate_paths(&self, original_path: &str) -> Vec<String> {
        let mut set = CandidateSet::default();

        // a. verbatim, then without surrounding whitespace
        set.push(original_path);
        let original = original_path.trim();
        set.push(original);

        // b. each known prefix stripped on its own, then URL, query and
        // bucket cleanup
        let normalized = normalized_forms(original, self.storage.bucket());
        let mut stripped = prefix_stripped(original);
        stripped.extend(normalized.iter().cloned());
        for variant in &stripped {
            set.push(variant.as_str());
        }

        let cleaned = normalized.last().cloned().unwrap_or_default();
        let segments: Vec<&str> = cleaned.split('/').filter(|s| !s.is_empty()).collect();
        let filename = segments.last().copied();

        // c. bare filename
        if let Some(name) = filename {
            set.push(name);
        }

        // d. evidence/ folder toggled on each stripped variant
        for variant in &stripped {
            let variant = variant.trim_start_matches('/');
            if let Some(rest) = variant.strip_prefix(LEGACY_EVIDENCE_PREFIX) {
                set.push(format!("{EVIDENCE_PREFIX}{rest}"));
            }
            match variant.strip_prefix(EVIDENCE_PREFIX) {
                Some(rest) => set.push(rest),
                None => set.push(format!("{EVIDENCE_PREFIX}{variant}")),
            }
        }

        // e. trailing segment windows
        let max_window = segments.len().min(4);
        for window in 2..=max_window {
            let tail = segments[segments.len() - window..].join("/");
            if !tail.starts_with(EVIDENCE_PREFIX) {
                set.push(format!("{EVIDENCE_PREFIX}{tail}"));
            }
            set.push(tail);
        }

        // f. canonical evidence/{user}/{event}/{file} rebuilt from UUID segments
        if let (Some(user_id), Some(name)) = (self.user_id.as_deref(), filename) {
            for event_id in uuid_segments(original) {
                if event_id == user_id {
                    continue;
                }
                set.push(format!("{EVIDENCE_PREFIX}{user_id}/{event_id}/{name}"));
            }
        }

        set.into_vec()
    }

    /// Candidates that survive the ownership filter, in probe order.
    pub fn probe_order(&self, original_path: &str) -> Vec<String> {
        let candidates = self.candidate_paths(original_path);
        match self.user_id.as_deref() {
            None => candidates,
            Some(user_id) => candidates
                .into_iter()
                .filter(|candidate| candidate.contains(user_id))
                .collect(),
        }
    }

    /// Probes candidates in order and returns the first blob found.
    ///
    /// Storage errors and timeouts on one candidate are logged and count as a
    /// miss for that candidate only.
    pub async fn resolve_and_download(&self, original_path: &str) -> EvidenceResolution {
        let candidates = self.probe_order(original_path);
        let mut attempted_paths = Vec::with_capacity(candidates.len());
        let mut denied_paths = Vec::new();

        tracing::debug!(
            original = %original_path,
            candidates = candidates.len(),
            "Resolving evidence path"
        );

        for candidate in candidates {
            attempted_paths.push(candidate.clone());

            match tokio::time::timeout(self.probe_timeout, self.storage.download(&candidate)).await
            {
                Ok(Ok(object)) => {
                    tracing::info!(
                        original = %original_path,
                        resolved = %candidate,
                        attempts = attempted_paths.len(),
                        "Evidence resolved"
                    );
                    return EvidenceResolution::Found {
                        resolved_path: candidate,
                        object,
                    };
                }
                Ok(Err(StorageError::NotFound)) => {
                    tracing::debug!(path = %candidate, "Evidence probe miss");
                }
                Ok(Err(StorageError::AccessDenied(_))) => {
                    tracing::warn!(path = %candidate, "Evidence probe refused by storage");
                    denied_paths.push(candidate);
                }
                Ok(Err(e)) => {
                    tracing::warn!(path = %candidate, error = %e, "Evidence probe failed");
                }
                Err(_) => {
                    tracing::warn!(
                        path = %candidate,
                        timeout_ms = self.probe_timeout.as_millis() as u64,
                        "Evidence probe timed out"
                    );
                }
            }
        }

        tracing::warn!(
            original = %original_path,
            attempted = attempted_paths.len(),
            denied = denied_paths.len(),
            "Evidence not found after trying all variants"
        );

        EvidenceResolution::NotFound {
            attempted_paths,
            denied_paths,
        }
    }
}

/// Canonical key for a fresh upload.
pub fn evidence_key(user_id: Uuid, event_id: Uuid, file_id: Uuid, extension: &str) -> String {
    format!("{EVIDENCE_PREFIX}{user_id}/{event_id}/{file_id}.{extension}")
}

/// `path` with each of [`STRIPPABLE_PREFIXES`] removed independently, then
/// with its leading slashes removed.
fn prefix_stripped(path: &str) -> Vec<String> {
    let mut variants: Vec<String> = STRIPPABLE_PREFIXES
        .iter()
        .filter_map(|prefix| path.strip_prefix(prefix))
        .map(str::to_string)
        .collect();

    let unslashed = path.trim_start_matches('/');
    if unslashed != path {
        variants.push(unslashed.to_string());
    }
    variants
}

/// Successive cleanup forms of `path`, each derived from the previous one.
/// The last element is the fully cleaned key.
fn normalized_forms(path: &str, bucket: &str) -> Vec<String> {
    let mut variants = Vec::new();
    let mut current = without_query(path).to_string();

    if let Some(rest) = without_origin(&current) {
        current = rest.to_string();
        variants.push(current.clone());
    }

    for marker in STORAGE_API_MARKERS {
        if let Some(idx) = current.find(marker) {
            current = current[idx + marker.len()..].to_string();
            variants.push(current.clone());
        }
    }

    let unslashed = current.trim_start_matches('/');
    if unslashed != current {
        current = unslashed.to_string();
        variants.push(current.clone());
    }

    if let Some(rest) = current.strip_prefix("public/") {
        current = rest.trim_start_matches('/').to_string();
        variants.push(current.clone());
    }

    // Supabase public URLs carry the bucket name as their first segment.
    // The current folder name is never treated as a bucket prefix.
    if !bucket.is_empty() && format!("{bucket}/") != EVIDENCE_PREFIX {
        if let Some(rest) = current.strip_prefix(&format!("{bucket}/")) {
            current = rest.to_string();
            variants.push(current.clone());
        }
    }

    if variants.last() != Some(&current) {
        variants.push(current);
    }
    variants
}

/// `https://host/a/b` becomes `/a/b`. Returns `None` when there is no scheme.
fn without_origin(path: &str) -> Option<&str> {
    let (_, after_scheme) = path.split_once("://")?;
    Some(match after_scheme.find('/') {
        Some(idx) => &after_scheme[idx..],
        None => "",
    })
}

fn without_query(path: &str) -> &str {
    match path.find(['?', '#']) {
        Some(idx) => &path[..idx],
        None => path,
    }
}

/// Hyphenated UUID segments of `path`, in order of appearance.
fn uuid_segments(path: &str) -> Vec<&str> {
    let mut found: Vec<&str> = Vec::new();
    for segment in without_query(path).split('/') {
        if segment.len() == 36 && Uuid::try_parse(segment).is_ok() && !found.contains(&segment) {
            found.push(segment);
        }
    }
    found
}

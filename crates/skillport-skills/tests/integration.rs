//! End-to-end install / remove flows against an in-memory GitHub.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use ring::digest;
use serde_json::json;

use skillport_skills::{
    DetectPlatform, Detection, Fetch, FetchResponse, FormatterRegistry, GitHubSource,
    InstallOptions, ManifestError, MarkerFileDetector, Platform, SkillError, SkillInstaller,
};
use skillport_store::{CONTENT_HASH_ALGORITHM, StateStore};

const REPO: &str = "https://github.com/acme/skills";
const RAW: &str = "https://raw.githubusercontent.com/acme/skills/main";

/// Serves a fixed URL map and records every request.
#[derive(Default)]
struct StubFetcher {
    routes: HashMap<String, (StatusCode, String)>,
    timeouts: HashSet<String>,
    requested: Mutex<Vec<String>>,
}

impl StubFetcher {
    fn route(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.routes.insert(url.into(), (StatusCode::OK, body.into()));
        self
    }

    fn status(mut self, url: impl Into<String>, status: StatusCode) -> Self {
        self.routes.insert(url.into(), (status, String::new()));
        self
    }

    /// Requests to `url` fail the way an expired request does.
    fn timeout(mut self, url: impl Into<String>) -> Self {
        self.timeouts.insert(url.into());
        self
    }

    fn manifest(self, manifest: serde_json::Value) -> Self {
        self.route(format!("{RAW}/manifest.json"), manifest.to_string())
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetch for StubFetcher {
    async fn fetch(&self, url: &str) -> skillport_skills::Result<FetchResponse> {
        self.requested.lock().unwrap().push(url.to_owned());
        if self.timeouts.contains(url) {
            return Err(SkillError::Timeout {
                url: url.to_owned(),
            });
        }
        let (status, body) = self
            .routes
            .get(url)
            .cloned()
            .unwrap_or((StatusCode::NOT_FOUND, String::new()));
        Ok(FetchResponse {
            url: url.to_owned(),
            status,
            body,
        })
    }
}

struct NeverDetects;

impl DetectPlatform for NeverDetects {
    fn detect(&self) -> Detection {
        MarkerFileDetector::new("/nonexistent/skillport-project").detect()
    }
}

fn foo_manifest() -> serde_json::Value {
    json!({
        "version": "1",
        "skills": [{
            "id": "foo",
            "name": "Foo",
            "version": "1.0.0",
            "category": "style",
            "description": "Formatting rules.",
            "platforms": ["cursor", "claude"],
            "rules": ["a.md"],
        }],
    })
}

fn foo_repo() -> StubFetcher {
    StubFetcher::default()
        .manifest(foo_manifest())
        .route(format!("{RAW}/skills/foo/a.md"), "Use tabs.")
}

fn installer(fetcher: Arc<StubFetcher>, dir: &Path) -> SkillInstaller {
    SkillInstaller::new(
        fetcher,
        FormatterRegistry::builtin(),
        Box::new(NeverDetects),
        StateStore::in_dir(dir),
    )
}

fn sha256_hex(data: &[u8]) -> String {
    digest::digest(&digest::SHA256, data)
        .as_ref()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[tokio::test]
async fn install_cursor_writes_bare_rules_and_records_hash() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(foo_repo());
    let installer = installer(fetcher.clone(), dir.path());

    let options = InstallOptions::new(REPO, "foo")
        .platform("cursor")
        .output_dir(dir.path());
    let result = installer.install(&options).await.unwrap();

    assert_eq!(result.skill_name, "Foo");
    assert_eq!(result.version, "1.0.0");
    assert_eq!(result.platform, Platform::Cursor);
    assert!(result.output_file.ends_with(".cursorrules"));
    assert_eq!(result.config_path, dir.path().join(".skillsrc.json"));
    assert_eq!(result.content_hash, sha256_hex(b"Use tabs."));

    let written = std::fs::read_to_string(&result.output_file).unwrap();
    assert_eq!(written, "Use tabs.\n\n");

    let records = installer.list().unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.id, "foo");
    assert_eq!(record.platform, "cursor");
    assert_eq!(record.source, REPO);
    assert_eq!(record.content_hash.as_deref(), Some(result.content_hash.as_str()));
    assert_eq!(
        record.content_hash_algorithm.as_deref(),
        Some(CONTENT_HASH_ALGORITHM)
    );
    assert!(record.installed_date().is_some());

    let requested = fetcher.requested();
    assert_eq!(requested[0], format!("{RAW}/manifest.json"));
    assert!(requested.contains(&format!("{RAW}/skills/foo/README.md")));
    assert!(!requested.iter().any(|u| u.ends_with("skill.yaml")));
}

#[tokio::test]
async fn install_claude_creates_nested_directory() {
    let dir = tempfile::tempdir().unwrap();
    let installer = installer(Arc::new(foo_repo()), dir.path());

    let options = InstallOptions::new(REPO, "foo")
        .platform("claude")
        .output_dir(dir.path());
    let result = installer.install(&options).await.unwrap();

    assert!(result.output_file.ends_with(".claude/custom-instructions.md"));
    let written = std::fs::read_to_string(&result.output_file).unwrap();
    assert!(written.starts_with("# Foo\n\n**Version:** 1.0.0\n**Category:** style\n"));
    assert!(written.ends_with("## Guidelines\n\nUse tabs.\n\n"));
}

#[tokio::test]
async fn unsupported_platform_makes_no_requests() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(foo_repo());
    let installer = installer(fetcher.clone(), dir.path());

    let options = InstallOptions::new(REPO, "foo")
        .platform("nonexistent")
        .output_dir(dir.path());
    let err = installer.install(&options).await.unwrap_err();

    let msg = err.to_string();
    for key in ["claude", "cursor", "openai", "windsurf"] {
        assert!(msg.contains(key), "{msg}");
    }
    assert!(fetcher.requested().is_empty());
    assert!(!dir.path().join(".skillsrc.json").exists());
}

#[tokio::test]
async fn non_github_host_makes_no_requests() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(foo_repo());
    let installer = installer(fetcher.clone(), dir.path());

    let options = InstallOptions::new("https://gitlab.com/acme/skills", "foo")
        .platform("cursor")
        .output_dir(dir.path());
    let err = installer.install(&options).await.unwrap_err();

    match err {
        SkillError::HostNotAllowed { host, .. } => assert_eq!(host, "gitlab.com"),
        other => panic!("unexpected: {other}"),
    }
    assert!(fetcher.requested().is_empty());
}

#[tokio::test]
async fn missing_platform_without_markers_fails() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(foo_repo());
    let installer = installer(fetcher.clone(), dir.path());

    let options = InstallOptions::new(REPO, "foo").output_dir(dir.path());
    let err = installer.install(&options).await.unwrap_err();
    assert!(matches!(err, SkillError::PlatformNotDetected { .. }));
    assert!(fetcher.requested().is_empty());
}

#[tokio::test]
async fn detected_platform_is_used() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".windsurfrules"), "old").unwrap();

    let installer = SkillInstaller::new(
        Arc::new(foo_repo()),
        FormatterRegistry::builtin(),
        Box::new(MarkerFileDetector::new(dir.path())),
        StateStore::in_dir(dir.path()),
    );
    let options = InstallOptions::new(REPO, "foo").output_dir(dir.path());
    let result = installer.install(&options).await.unwrap();

    assert_eq!(result.platform, Platform::Windsurf);
    let written = std::fs::read_to_string(dir.path().join(".windsurfrules")).unwrap();
    assert_eq!(written, "Use tabs.\n\n");
}

#[tokio::test]
async fn unknown_skill_lists_available_ids() {
    let dir = tempfile::tempdir().unwrap();
    let installer = installer(Arc::new(foo_repo()), dir.path());

    let options = InstallOptions::new(REPO, "bar")
        .platform("cursor")
        .output_dir(dir.path());
    let err = installer.install(&options).await.unwrap_err();

    match err {
        SkillError::SkillNotFound { id, available } => {
            assert_eq!(id, "bar");
            assert_eq!(available, vec!["foo"]);
        }
        other => panic!("unexpected: {other}"),
    }
}

#[tokio::test]
async fn missing_manifest_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = StubFetcher::default().status(format!("{RAW}/manifest.json"), StatusCode::NOT_FOUND);
    let installer = installer(Arc::new(fetcher), dir.path());

    let options = InstallOptions::new(REPO, "foo")
        .platform("cursor")
        .output_dir(dir.path());
    let err = installer.install(&options).await.unwrap_err();
    assert!(matches!(err, SkillError::Fetch { status: 404, .. }));
}

#[tokio::test]
async fn suspicious_manifest_aborts_before_any_write() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = StubFetcher::default().manifest(json!({
        "skills": [{
            "id": "evil", "name": "Evil", "version": "1",
            "rules": ["../../etc/passwd"],
        }],
    }));
    let installer = installer(Arc::new(fetcher), dir.path());

    let options = InstallOptions::new(REPO, "evil")
        .platform("cursor")
        .output_dir(dir.path());
    let err = installer.install(&options).await.unwrap_err();

    assert!(matches!(
        err,
        SkillError::Manifest(ManifestError::SuspiciousRulePath { .. })
    ));
    assert!(!dir.path().join(".cursorrules").exists());
    assert!(!dir.path().join(".skillsrc.json").exists());
}

#[tokio::test]
async fn reinstall_replaces_record() {
    let dir = tempfile::tempdir().unwrap();
    let installer = installer(Arc::new(foo_repo()), dir.path());
    let options = InstallOptions::new(REPO, "foo")
        .platform("cursor")
        .output_dir(dir.path());

    installer.install(&options).await.unwrap();
    installer
        .install(&options.clone().platform("openai"))
        .await
        .unwrap();

    let records = installer.list().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].platform, "openai");
}

#[tokio::test]
async fn remove_deletes_file_and_record() {
    let dir = tempfile::tempdir().unwrap();
    let installer = installer(Arc::new(foo_repo()), dir.path());
    let options = InstallOptions::new(REPO, "foo")
        .platform("cursor")
        .output_dir(dir.path());
    let installed = installer.install(&options).await.unwrap();

    let removed = installer.remove("foo", dir.path()).await.unwrap();
    assert_eq!(removed.record.id, "foo");
    assert_eq!(removed.removed_file, Some(installed.output_file.clone()));
    assert!(!installed.output_file.exists());
    assert!(installer.list().unwrap().is_empty());
}

#[tokio::test]
async fn remove_tolerates_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let installer = installer(Arc::new(foo_repo()), dir.path());
    let options = InstallOptions::new(REPO, "foo")
        .platform("cursor")
        .output_dir(dir.path());
    let installed = installer.install(&options).await.unwrap();
    std::fs::remove_file(&installed.output_file).unwrap();

    let removed = installer.remove("foo", dir.path()).await.unwrap();
    assert_eq!(removed.removed_file, None);
    assert!(installer.list().unwrap().is_empty());
}

#[tokio::test]
async fn remove_unknown_leaves_state_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let installer = installer(Arc::new(foo_repo()), dir.path());
    let options = InstallOptions::new(REPO, "foo")
        .platform("cursor")
        .output_dir(dir.path());
    installer.install(&options).await.unwrap();

    let state_path = dir.path().join(".skillsrc.json");
    let before = std::fs::read_to_string(&state_path).unwrap();

    let err = installer.remove("bar", dir.path()).await.unwrap_err();
    assert!(matches!(err, SkillError::NotInstalled { .. }));
    assert_eq!(std::fs::read_to_string(&state_path).unwrap(), before);
    assert!(dir.path().join(".cursorrules").exists());
}

// ----- GitHubSource -----

#[tokio::test]
async fn optional_failures_degrade_to_empty() {
    let fetcher = StubFetcher::default()
        .manifest(json!({
            "skills": [{
                "id": "foo", "name": "Foo", "version": "1",
                "rules": ["a.md", "missing.md", "b.md"],
            }],
        }))
        .route(format!("{RAW}/skills/foo/a.md"), "A")
        .status(
            format!("{RAW}/skills/foo/missing.md"),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .route(format!("{RAW}/skills/foo/b.md"), "B");
    let source = GitHubSource::new(REPO, Arc::new(fetcher)).unwrap();

    let download = source.download_skill("foo").await.unwrap();
    assert_eq!(download.readme, "");
    let pairs: Vec<_> = download.rules_content.iter().collect();
    assert_eq!(pairs, vec![("a.md", "A"), ("b.md", "B")]);
    assert_eq!(download.content_hash, sha256_hex(b"A\nB"));
}

#[tokio::test]
async fn yaml_fallback_when_manifest_lists_no_rules() {
    let fetcher = StubFetcher::default()
        .manifest(json!({
            "skills": [{ "id": "foo", "name": "Foo", "version": "1", "rules": [] }],
        }))
        .route(format!("{RAW}/skills/foo/README.md"), "# Foo")
        .route(
            format!("{RAW}/skills/foo/skill.yaml"),
            "id: foo\nrules:\n  - rules/one.md\n  - rules/two.md\n",
        )
        .route(format!("{RAW}/skills/foo/rules/one.md"), "One")
        .route(format!("{RAW}/skills/foo/rules/two.md"), "Two");
    let source = GitHubSource::new(REPO, Arc::new(fetcher)).unwrap();

    let download = source.download_skill("foo").await.unwrap();
    assert_eq!(download.readme, "# Foo");
    let contents: Vec<_> = download.rules_content.contents().collect();
    assert_eq!(contents, vec!["One", "Two"]);
}

#[tokio::test]
async fn yaml_fallback_rejects_suspicious_paths() {
    let fetcher = StubFetcher::default()
        .manifest(json!({ "skills": [{ "id": "foo", "name": "Foo", "version": "1" }] }))
        .route(format!("{RAW}/skills/foo/skill.yaml"), "rules:\n  - ../secret.md\n");
    let fetcher = Arc::new(fetcher);
    let source = GitHubSource::new(REPO, fetcher.clone()).unwrap();

    let err = source.download_skill("foo").await.unwrap_err();
    assert!(err.to_string().contains("../secret.md"));
    assert!(!fetcher.requested().iter().any(|u| u.contains("secret")));
}

#[tokio::test]
async fn rule_list_is_truncated_and_deduplicated() {
    let rules: Vec<String> = (0..5).map(|i| format!("r{i}.md")).collect();
    let mut listed = rules.clone();
    listed.insert(1, "r0.md".to_owned());

    let mut fetcher = StubFetcher::default().manifest(json!({
        "skills": [{ "id": "foo", "name": "Foo", "version": "1", "rules": listed }],
    }));
    for rule in &rules {
        fetcher = fetcher.route(format!("{RAW}/skills/foo/{rule}"), rule.clone());
    }
    let fetcher = Arc::new(fetcher);
    let source = GitHubSource::new(REPO, fetcher.clone())
        .unwrap()
        .with_max_rules(3);

    let download = source.download_skill("foo").await.unwrap();
    let contents: Vec<_> = download.rules_content.contents().collect();
    assert_eq!(contents, vec!["r0.md", "r1.md", "r2.md"]);

    let rule_requests = fetcher
        .requested()
        .into_iter()
        .filter(|u| u.ends_with(".md") && !u.ends_with("README.md"))
        .count();
    assert_eq!(rule_requests, 3);
}

#[tokio::test]
async fn custom_branch_changes_raw_base() {
    let fetcher = Arc::new(StubFetcher::default());
    let source = GitHubSource::with_branch(REPO, "dev", fetcher.clone()).unwrap();
    assert_eq!(
        source.raw_base(),
        "https://raw.githubusercontent.com/acme/skills/dev"
    );
    assert!(source.fetch_manifest().await.is_err());
    assert_eq!(
        fetcher.requested(),
        vec!["https://raw.githubusercontent.com/acme/skills/dev/manifest.json"]
    );
}

#[tokio::test]
async fn erroring_optional_fetches_do_not_fail_install() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = StubFetcher::default()
        .manifest(json!({
            "skills": [{
                "id": "foo", "name": "Foo", "version": "1.0.0",
                "rules": ["a.md", "slow.md"],
            }],
        }))
        .route(format!("{RAW}/skills/foo/a.md"), "Use tabs.")
        .timeout(format!("{RAW}/skills/foo/slow.md"))
        .timeout(format!("{RAW}/skills/foo/README.md"));
    let fetcher = Arc::new(fetcher);
    let installer = installer(fetcher.clone(), dir.path());

    let options = InstallOptions::new(REPO, "foo")
        .platform("cursor")
        .output_dir(dir.path());
    let result = installer.install(&options).await.unwrap();

    assert_eq!(std::fs::read_to_string(&result.output_file).unwrap(), "Use tabs.\n\n");
    assert_eq!(result.content_hash, sha256_hex(b"Use tabs."));
    assert!(fetcher.requested().contains(&format!("{RAW}/skills/foo/slow.md")));
}

#[tokio::test]
async fn erroring_yaml_fallback_yields_no_rules() {
    let fetcher = StubFetcher::default()
        .manifest(json!({ "skills": [{ "id": "foo", "name": "Foo", "version": "1" }] }))
        .timeout(format!("{RAW}/skills/foo/skill.yaml"));
    let source = GitHubSource::new(REPO, Arc::new(fetcher)).unwrap();

    let download = source.download_skill("foo").await.unwrap();
    assert!(download.rules_content.is_empty());
    assert_eq!(download.readme, "");
    assert_eq!(download.content_hash, sha256_hex(b""));
}

#[tokio::test]
async fn erroring_manifest_fetch_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = StubFetcher::default().timeout(format!("{RAW}/manifest.json"));
    let installer = installer(Arc::new(fetcher), dir.path());

    let options = InstallOptions::new(REPO, "foo")
        .platform("cursor")
        .output_dir(dir.path());
    let err = installer.install(&options).await.unwrap_err();
    assert!(matches!(err, SkillError::Timeout { .. }));
    assert!(!dir.path().join(".skillsrc.json").exists());
}

#[tokio::test]
async fn sibling_with_mistyped_fields_does_not_block_install() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = StubFetcher::default()
        .manifest(json!({
            "count": "2",
            "skills": [
                { "id": "foo", "name": "Foo", "version": "1.0.0", "rules": ["a.md"] },
                { "id": "bar", "name": "Bar", "version": "1.0.0", "tags": null, "description": null },
            ],
        }))
        .route(format!("{RAW}/skills/foo/a.md"), "Use tabs.");
    let installer = installer(Arc::new(fetcher), dir.path());

    let options = InstallOptions::new(REPO, "foo")
        .platform("cursor")
        .output_dir(dir.path());
    let result = installer.install(&options).await.unwrap();
    assert_eq!(result.skill_name, "Foo");
}

#[tokio::test]
async fn record_keeps_repository_url_as_typed() {
    let dir = tempfile::tempdir().unwrap();
    let installer = installer(Arc::new(foo_repo()), dir.path());

    let typed = "https://github.com/acme/skills.git";
    let options = InstallOptions::new(typed, "foo")
        .platform("cursor")
        .output_dir(dir.path());
    installer.install(&options).await.unwrap();

    let records = installer.list().unwrap();
    assert_eq!(records[0].source, typed);
}

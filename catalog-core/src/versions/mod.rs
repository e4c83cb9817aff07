//! Remote version discovery.
//!
//! Lists the refs of a package's git remote, keeps the ones whose last path
//! component looks like a version, and takes the last one listed as current.
//! Every failure degrades to "no versions"; nothing here returns an error to
//! the caller.

mod classify;

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::models::Package;

pub use classify::{classify, is_version_tag, TagGrammar};

pub const DEFAULT_LS_REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of `ls-remote`-style output for a URL.
#[async_trait]
pub trait RefLister: Send + Sync {
    async fn list_refs(&self, url: &str) -> anyhow::Result<String>;
}

/// Runs `<program> ls-remote <url>`.
#[derive(Debug, Clone)]
pub struct GitLsRemote {
    program: String,
}

impl GitLsRemote {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GitLsRemote {
    fn default() -> Self {
        Self::new("git")
    }
}

#[async_trait]
impl RefLister for GitLsRemote {
    async fn list_refs(&self, url: &str) -> anyhow::Result<String> {
        let output = Command::new(&self.program)
            .arg("ls-remote")
            .arg(url)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run {} ls-remote", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "{} ls-remote exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Versions discovered on a remote, in the order the remote listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedVersions {
    /// Last entry of `all`, or empty.
    pub current: String,
    pub all: Vec<String>,
}

impl ResolvedVersions {
    /// Parse `ls-remote` output. Only refs under `tags` or `heads` count.
    pub fn from_ls_remote(output: &str) -> Self {
        let all: Vec<String> = output
            .lines()
            .filter(|line| line.contains("refs/tags/") || line.contains("refs/heads/"))
            .filter_map(|line| line.trim_end().rsplit('/').next())
            .filter(|tag| is_version_tag(tag))
            .map(str::to_string)
            .collect();

        Self {
            current: all.last().cloned().unwrap_or_default(),
            all,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Overwrite the package's version info. `version` is only replaced when
    /// something was discovered.
    pub fn apply_to(self, package: &mut Package) {
        if !self.current.is_empty() {
            package.version = self.current;
        }
        package.versions = self.all;
    }
}

#[derive(Clone)]
pub struct RemoteVersionResolver {
    lister: Arc<dyn RefLister>,
    timeout: Duration,
}

impl RemoteVersionResolver {
    pub fn new(lister: Arc<dyn RefLister>, timeout: Duration) -> Self {
        Self { lister, timeout }
    }

    pub fn git(program: impl Into<String>, timeout: Duration) -> Self {
        Self::new(Arc::new(GitLsRemote::new(program)), timeout)
    }

    pub async fn resolve(&self, git_url: &str) -> ResolvedVersions {
        if git_url.is_empty() {
            return ResolvedVersions::default();
        }

        let output = match tokio::time::timeout(self.timeout, self.lister.list_refs(git_url)).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(url = git_url, "Listing remote refs failed: {:#}", e);
                return ResolvedVersions::default();
            }
            Err(_) => {
                warn!(url = git_url, timeout = ?self.timeout, "Listing remote refs timed out");
                return ResolvedVersions::default();
            }
        };

        let resolved = ResolvedVersions::from_ls_remote(&output);
        debug!(
            url = git_url,
            current = %resolved.current,
            count = resolved.all.len(),
            "Resolved remote versions"
        );
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const LS_REMOTE: &str = "\
4f1b2c3d4e5f60718293a4b5c6d7e8f901234567\tHEAD
1111111111111111111111111111111111111111\trefs/tags/v1.0.0
2222222222222222222222222222222222222222\trefs/tags/v1.0.0^{}
3333333333333333333333333333333333333333\trefs/tags/v1.1.0
4444444444444444444444444444444444444444\trefs/pull/12/head
5555555555555555555555555555555555555555\trefs/heads/feature/foo-bar
6666666666666666666666666666666666666666\trefs/heads/main
";

    struct FixedRefs {
        output: Result<String, String>,
        calls: AtomicUsize,
    }

    impl FixedRefs {
        fn ok(output: &str) -> Arc<Self> {
            Arc::new(Self {
                output: Ok(output.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                output: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RefLister for FixedRefs {
        async fn list_refs(&self, _url: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.output.clone().map_err(anyhow::Error::msg)
        }
    }

    struct SlowRefs;

    #[async_trait]
    impl RefLister for SlowRefs {
        async fn list_refs(&self, _url: &str) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("1111111111111111111111111111111111111111\trefs/tags/v9.9.9\n".to_string())
        }
    }

    #[test]
    fn keeps_listing_order_and_takes_last_as_current() {
        let resolved = ResolvedVersions::from_ls_remote(
            "a\trefs/tags/v1.0.0\nb\trefs/tags/v1.1.0\nc\trefs/heads/main\n",
        );

        assert_eq!(resolved.all, vec!["v1.0.0", "v1.1.0", "main"]);
        assert_eq!(resolved.current, "main");
    }

    #[test]
    fn ignores_peeled_tags_and_foreign_namespaces() {
        let resolved = ResolvedVersions::from_ls_remote(LS_REMOTE);
        assert_eq!(resolved.all, vec!["v1.0.0", "v1.1.0", "main"]);
    }

    #[test]
    fn no_qualifying_refs_means_empty() {
        let resolved = ResolvedVersions::from_ls_remote("a\tHEAD\nb\trefs/heads/develop\n");
        assert!(resolved.is_empty());
        assert_eq!(resolved.current, "");
    }

    #[test]
    fn apply_keeps_manifest_version_when_nothing_found() {
        let mut pkg = Package::new("zlib");
        pkg.version = "1.3.1".into();

        ResolvedVersions::default().apply_to(&mut pkg);
        assert_eq!(pkg.version, "1.3.1");
        assert!(pkg.versions.is_empty());

        ResolvedVersions::from_ls_remote("a\trefs/tags/v1.3.1\nb\trefs/tags/v1.4.0\n").apply_to(&mut pkg);
        assert_eq!(pkg.version, "v1.4.0");
        assert_eq!(pkg.versions, vec!["v1.3.1", "v1.4.0"]);
    }

    #[tokio::test]
    async fn empty_url_never_invokes_remote() {
        let lister = FixedRefs::ok(LS_REMOTE);
        let resolver = RemoteVersionResolver::new(lister.clone(), DEFAULT_LS_REMOTE_TIMEOUT);

        let resolved = resolver.resolve("").await;

        assert_eq!(resolved, ResolvedVersions::default());
        assert_eq!(lister.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resolves_through_lister() {
        let lister = FixedRefs::ok(LS_REMOTE);
        let resolver = RemoteVersionResolver::new(lister.clone(), DEFAULT_LS_REMOTE_TIMEOUT);

        let resolved = resolver.resolve("https://github.com/madler/zlib").await;

        assert_eq!(resolved.current, "main");
        assert_eq!(lister.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn lister_failure_degrades_to_empty() {
        let resolver = RemoteVersionResolver::new(
            FixedRefs::failing("fatal: repository not found"),
            DEFAULT_LS_REMOTE_TIMEOUT,
        );

        assert!(resolver.resolve("https://example.invalid/repo").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_degrades_to_empty() {
        let resolver = RemoteVersionResolver::new(Arc::new(SlowRefs), Duration::from_secs(5));

        assert!(resolver.resolve("https://example.invalid/slow").await.is_empty());
    }

    #[tokio::test]
    async fn missing_git_program_degrades_to_empty() {
        let resolver = RemoteVersionResolver::git(
            "definitely-not-a-real-vcs-binary",
            DEFAULT_LS_REMOTE_TIMEOUT,
        );

        assert!(resolver.resolve("https://github.com/madler/zlib").await.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_degrades_to_empty() {
        // `false` ignores its arguments and exits 1.
        let resolver = RemoteVersionResolver::git("false", DEFAULT_LS_REMOTE_TIMEOUT);

        assert!(resolver.resolve("https://github.com/madler/zlib").await.is_empty());
    }
}

// Version probes: ask each candidate binary for its version
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::Result;
use crate::process::{ProcessConfig, ProcessManager};
use crate::scanner::Candidate;
use crate::version::extract_version;

/// Outcome of one probe; `version` is `None` when unresolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub candidate: Candidate,
    pub version: Option<String>,
}

/// Runs version queries against candidate binaries
#[derive(Debug, Clone)]
pub struct ProbeRunner {
    manager: ProcessManager,
    timeout: Duration,
}

impl ProbeRunner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            manager: ProcessManager::with_default_timeout(timeout),
            timeout,
        }
    }

    /// Query one candidate; failures degrade to `None`
    pub async fn probe(&self, candidate: &Candidate) -> Option<String> {
        match self.query_version(candidate).await {
            Ok(Some(version)) => {
                debug!(client = %candidate.client, path = %candidate.path.display(), %version, "Probed version");
                Some(version)
            }
            Ok(None) => {
                debug!(client = %candidate.client, path = %candidate.path.display(), "No version in output");
                None
            }
            Err(e) => {
                debug!(client = %candidate.client, error = %e, "Version probe failed");
                None
            }
        }
    }

    async fn query_version(&self, candidate: &Candidate) -> Result<Option<String>> {
        let config = ProcessConfig::new(candidate.path.clone())
            .with_args(candidate.client.version_args().iter().copied())
            .with_timeout(self.timeout);
        let command = config.command_line();

        let result = self
            .manager
            .execute_async(config)
            .await?
            .into_success(command)?;

        Ok(extract_version(&result.stdout()))
    }

    /// Launch one independent task per candidate.
    ///
    /// Each task reports on `reports`; a closed receiver means the arbiter
    /// stopped listening, and the late report is dropped.
    pub fn spawn_all(&self, candidates: Vec<Candidate>, reports: mpsc::Sender<ProbeReport>) {
        for candidate in candidates {
            let runner = self.clone();
            let reports = reports.clone();
            tokio::spawn(async move {
                let version = runner.probe(&candidate).await;
                let _ = reports.send(ProbeReport { candidate, version }).await;
            });
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::client::ClientType;
    use crate::scanner::CandidateSource;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write_script(path: &Path, body: &str) {
        std::fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn candidate(client: ClientType, path: PathBuf) -> Candidate {
        Candidate {
            client,
            path,
            source: CandidateSource::Bundled,
        }
    }

    #[tokio::test]
    async fn test_probe_uses_client_convention() {
        let temp = TempDir::new().unwrap();
        let geth = temp.path().join("geth");
        write_script(
            &geth,
            r#"[ "$1" = "version" ] || exit 2
echo "Geth"
echo "Version: 1.8.2-stable""#,
        );
        let parity = temp.path().join("parity");
        write_script(
            &parity,
            r#"[ "$1" = "--version" ] || exit 2
echo "Parity/v1.7.0-beta""#,
        );

        let runner = ProbeRunner::new(Duration::from_secs(5));
        assert_eq!(
            runner.probe(&candidate(ClientType::Geth, geth)).await,
            Some("1.8.2".to_string())
        );
        assert_eq!(
            runner.probe(&candidate(ClientType::Parity, parity)).await,
            Some("1.7.0".to_string())
        );
    }

    #[tokio::test]
    async fn test_probe_failures_are_unresolved() {
        let temp = TempDir::new().unwrap();
        let failing = temp.path().join("geth");
        write_script(&failing, "echo 'Version: 1.8.2'\nexit 1");
        let silent = temp.path().join("eth");
        write_script(&silent, "echo 'eth'");

        let runner = ProbeRunner::new(Duration::from_secs(5));
        assert_eq!(runner.probe(&candidate(ClientType::Geth, failing)).await, None);
        assert_eq!(runner.probe(&candidate(ClientType::Eth, silent)).await, None);
        assert_eq!(
            runner
                .probe(&candidate(ClientType::Geth, temp.path().join("missing")))
                .await,
            None
        );
    }

    #[tokio::test]
    async fn test_spawn_all_reports_every_candidate() {
        let temp = TempDir::new().unwrap();
        let eth = temp.path().join("eth");
        write_script(&eth, "echo 'eth version 1.3.0'");

        let runner = ProbeRunner::new(Duration::from_secs(5));
        let (tx, mut rx) = mpsc::channel(4);
        runner.spawn_all(
            vec![
                candidate(ClientType::Eth, eth),
                candidate(ClientType::Geth, temp.path().join("missing")),
            ],
            tx,
        );

        let mut reports = Vec::new();
        while let Some(report) = rx.recv().await {
            reports.push(report);
        }
        reports.sort_by_key(|r| r.candidate.client);

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].candidate.client, ClientType::Geth);
        assert_eq!(reports[0].version, None);
        assert_eq!(reports[1].version, Some("1.3.0".to_string()));
    }
}

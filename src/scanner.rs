// Candidate discovery: bundled binaries plus system PATH installs
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::client::ClientType;
use crate::config::ResolverConfig;
use crate::layout::{self, PackagingMode};
use crate::platform::Platform;

/// How long system lookups may take before probing starts without them
pub const PRE_PROBE_WINDOW: Duration = Duration::from_millis(50);

/// Where a candidate was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    Bundled,
    System,
}

/// One place a client binary might live
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub client: ClientType,
    pub path: PathBuf,
    pub source: CandidateSource,
}

/// Candidates per client type, in scan order (bundled first)
pub type CandidateMap = BTreeMap<ClientType, Vec<Candidate>>;

/// Enumerates candidate executables for every client type
#[derive(Debug, Clone)]
pub struct CandidateScanner {
    mode: PackagingMode,
    platform: Platform,
    search_path: Option<OsString>,
}

impl CandidateScanner {
    pub fn new(mode: PackagingMode, platform: Platform, search_path: Option<OsString>) -> Self {
        Self {
            mode,
            platform,
            search_path,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(
            config.packaging_mode(),
            config.platform(),
            config.effective_search_path(),
        )
    }

    /// Bundled candidates, one per client folder below the base directory.
    ///
    /// An unreadable base directory yields no candidates at all.
    pub fn bundled_candidates(&self) -> Vec<Candidate> {
        let base = layout::resolve_base_dir(&self.mode, self.platform.os);

        let clients = match layout::list_client_dirs(&base) {
            Ok(clients) => clients,
            Err(e) => {
                warn!(error = %e, "No bundled clients available");
                return Vec::new();
            }
        };

        clients
            .into_iter()
            .map(|client| Candidate {
                client,
                path: layout::bundled_path(&base, client, &self.mode, &self.platform),
                source: CandidateSource::Bundled,
            })
            .collect()
    }

    /// All candidates: bundled ones, then system installs on Linux and macOS
    pub async fn enumerate(&self) -> CandidateMap {
        let mut candidates = CandidateMap::new();
        for candidate in self.bundled_candidates() {
            debug!(client = %candidate.client, path = %candidate.path.display(), "Bundled candidate");
            candidates.entry(candidate.client).or_default().push(candidate);
        }

        if !self.platform.os.supports_system_lookup() {
            return candidates;
        }

        let clients: Vec<ClientType> = candidates.keys().copied().collect();
        for (client, path) in self.system_lookups(&clients).await {
            let entry = candidates.entry(client).or_default();
            if entry.iter().any(|existing| same_file(&existing.path, &path)) {
                debug!(client = %client, path = %path.display(), "System binary is the bundled one");
                continue;
            }
            debug!(client = %client, path = %path.display(), "System candidate");
            entry.push(Candidate {
                client,
                path,
                source: CandidateSource::System,
            });
        }

        candidates
    }

    /// Look every client up on the search path concurrently.
    ///
    /// Lookups still running when the pre-probe window closes are dropped.
    async fn system_lookups(&self, clients: &[ClientType]) -> Vec<(ClientType, PathBuf)> {
        let deadline = Instant::now() + PRE_PROBE_WINDOW;
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        let mut lookups = JoinSet::new();
        for &client in clients {
            let search_path = self.search_path.clone();
            let cwd = cwd.clone();
            let name = client.executable_name(self.platform.os);
            lookups.spawn_blocking(move || {
                (client, which::which_in(name, search_path, cwd).ok())
            });
        }

        let mut found = Vec::new();
        loop {
            match timeout_at(deadline, lookups.join_next()).await {
                Ok(Some(Ok((client, Some(path))))) => found.push((client, path)),
                Ok(Some(Ok((client, None)))) => debug!(client = %client, "Not on system path"),
                Ok(Some(Err(e))) => warn!(error = %e, "System lookup task failed"),
                Ok(None) => break,
                Err(_) => {
                    debug!(pending = lookups.len(), "System lookups timed out");
                    lookups.detach_all();
                    break;
                }
            }
        }

        // Keep results in client order regardless of completion order
        found.sort_by_key(|(client, _)| *client);
        found
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    let canonical = |path: &Path| std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    canonical(a) == canonical(b)
}

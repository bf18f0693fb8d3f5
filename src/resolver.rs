// Resolution cache and arbiter: pick one binary per client type, once
//
// The first lookup scans every client type at once and waits for the version
// probes to settle. The published answer is reused for the rest of the
// resolver's lifetime.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::client::ClientType;
use crate::config::ResolverConfig;
use crate::error::{NodePathError, Result};
use crate::probe::{ProbeReport, ProbeRunner};
use crate::scanner::{Candidate, CandidateMap, CandidateScanner};
use crate::version::compare_versions;

/// Upper bound on how long a scan waits for version probes
pub const SETTLING_DELAY: Duration = Duration::from_millis(1500);

/// Final choice per client type
pub type ResolvedPaths = BTreeMap<ClientType, PathBuf>;

/// Probe outcomes per client type, in scan order
pub type VersionRecord = BTreeMap<ClientType, Vec<ProbeReport>>;

type Published = Option<Arc<ResolvedPaths>>;

/// Resolver lifecycle; there is no way back from `Resolved`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Unscanned,
    Scanning,
    Resolved,
}

/// Locates client binaries, preferring the newest of bundled and system copies
///
/// The scan runs as a detached task, so a caller that gives up waiting does
/// not abort it; the next caller picks up the same scan.
#[derive(Debug)]
pub struct NodeResolver {
    config: Arc<ResolverConfig>,
    started: AtomicBool,
    scans: AtomicUsize,
    published: Arc<watch::Sender<Published>>,
}

impl NodeResolver {
    pub fn new(config: ResolverConfig) -> Self {
        let (published, _) = watch::channel(None);
        Self {
            config: Arc::new(config),
            started: AtomicBool::new(false),
            scans: AtomicUsize::new(0),
            published: Arc::new(published),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Path of the preferred binary for `client`, `None` if it has no candidates.
    ///
    /// The first call scans all client types; concurrent first calls share
    /// that scan. Later calls answer from the cache.
    pub async fn resolve(&self, client: ClientType) -> Option<PathBuf> {
        self.resolved_map().await.get(&client).cloned()
    }

    /// Like [`resolve`](Self::resolve), reporting a missing client as an error
    pub async fn get_node_path(&self, client: ClientType) -> Result<PathBuf> {
        self.resolve(client)
            .await
            .ok_or(NodePathError::NoCandidates { client })
    }

    /// The whole published mapping
    pub async fn resolved_paths(&self) -> ResolvedPaths {
        self.resolved_map().await.as_ref().clone()
    }

    pub fn state(&self) -> ScanState {
        if self.published.borrow().is_some() {
            ScanState::Resolved
        } else if self.started.load(Ordering::Acquire) {
            ScanState::Scanning
        } else {
            ScanState::Unscanned
        }
    }

    /// Number of scans started; stays at one once the first lookup begins
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }

    async fn resolved_map(&self) -> Arc<ResolvedPaths> {
        self.start_scan();

        let mut published = self.published.subscribe();
        let resolved = match published.wait_for(Option::is_some).await {
            Ok(resolved) => (*resolved).clone().unwrap_or_default(),
            Err(_) => {
                warn!("Resolver scan ended without publishing");
                Arc::default()
            }
        };
        resolved
    }

    fn start_scan(&self) {
        if self.started.swap(true, Ordering::AcqRel) {
            return;
        }
        self.scans.fetch_add(1, Ordering::Relaxed);

        let config = Arc::clone(&self.config);
        let published = Arc::clone(&self.published);
        tokio::spawn(async move {
            let resolved = scan(&config).await;
            published.send_replace(Some(Arc::new(resolved)));
        });
    }
}

impl Default for NodeResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

async fn scan(config: &ResolverConfig) -> ResolvedPaths {
    let deadline = Instant::now() + SETTLING_DELAY;

    let candidates = CandidateScanner::from_config(config).enumerate().await;
    let record = collect_versions(candidates, deadline).await;
    let resolved = arbitrate(&record);

    info!(
        resolved = %serde_json::to_string(&resolved).unwrap_or_default(),
        "Preferred backends"
    );
    resolved
}

/// Probe every candidate and gather outcomes until all probes report or
/// `deadline` passes. Probes still running at the deadline stay unresolved.
pub async fn collect_versions(candidates: CandidateMap, deadline: Instant) -> VersionRecord {
    let mut record: VersionRecord = candidates
        .iter()
        .map(|(client, list)| {
            let reports = list
                .iter()
                .map(|candidate| ProbeReport {
                    candidate: candidate.clone(),
                    version: None,
                })
                .collect();
            (*client, reports)
        })
        .collect();

    let all: Vec<Candidate> = candidates.into_values().flatten().collect();
    let expected = all.len();
    if expected == 0 {
        return record;
    }

    let (tx, mut rx) = mpsc::channel(expected);
    ProbeRunner::new(SETTLING_DELAY).spawn_all(all, tx);

    let mut received = 0;
    while received < expected {
        match timeout_at(deadline, rx.recv()).await {
            Ok(Some(report)) => {
                received += 1;
                store_report(&mut record, report);
            }
            Ok(None) => break,
            Err(_) => {
                debug!(pending = expected - received, "Settling window elapsed");
                break;
            }
        }
    }

    record
}

fn store_report(record: &mut VersionRecord, report: ProbeReport) {
    let Some(entries) = record.get_mut(&report.candidate.client) else {
        return;
    };
    if let Some(entry) = entries
        .iter_mut()
        .find(|entry| entry.candidate.path == report.candidate.path)
    {
        entry.version = report.version;
    }
}

/// Pick one path per client type from the probe outcomes
pub fn arbitrate(record: &VersionRecord) -> ResolvedPaths {
    record
        .iter()
        .filter_map(|(client, entries)| {
            pick_winner(entries).map(|winner| (*client, winner.path.clone()))
        })
        .collect()
}

/// A lone candidate always wins. With two or more, the first two are compared
/// and the second wins only if it is strictly newer.
pub fn pick_winner(entries: &[ProbeReport]) -> Option<&Candidate> {
    match entries {
        [] => None,
        [only] => Some(&only.candidate),
        [first, second, ..] => {
            let second_is_newer = match (&first.version, &second.version) {
                (Some(a), Some(b)) => {
                    compare_versions(a, b) == Some(std::cmp::Ordering::Less)
                }
                _ => false,
            };
            if second_is_newer {
                Some(&second.candidate)
            } else {
                Some(&first.candidate)
            }
        }
    }
}

// Bundled binary layout: where shipped client binaries live on disk
//
// The packaged-mode adjustments are pure path transformations so they can be
// exercised for every platform without touching the filesystem.

use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::client::ClientType;
use crate::error::{NodePathError, Result};
use crate::platform::{Os, Platform};

/// Folder holding the bundled binaries below the application root
pub const DEFAULT_NODES_DIR: &str = "nodes";
/// Folder name a packaged build ships the binaries in
pub const PACKAGED_NODES_DIR: &str = "node";
/// Archive container segment that never exists on disk
pub const ARCHIVE_MARKER: &str = "app.asar";
/// macOS bundle folder the binaries are moved into
pub const MACOS_FRAMEWORKS_DIR: &str = "Frameworks";

/// Whether the application runs from a packaged build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackagingMode {
    Packaged { app_root: PathBuf },
    Development { nodes_dir: PathBuf },
}

type Adjustment = fn(PathBuf) -> PathBuf;

/// Packaged-mode adjustments applied, in order, to the default bundled root
fn packaged_adjustments(os: Os) -> &'static [Adjustment] {
    match os {
        Os::MacOs => &[rename_nodes_dir, strip_archive_marker, relocate_to_frameworks],
        Os::Windows => &[rename_nodes_dir, strip_archive_marker, to_windows_separators],
        Os::Linux | Os::Other => &[rename_nodes_dir, strip_archive_marker],
    }
}

/// Compute the bundled binaries root for a packaging mode and OS
pub fn resolve_base_dir(mode: &PackagingMode, os: Os) -> PathBuf {
    match mode {
        PackagingMode::Packaged { app_root } => {
            let default = app_root.join(DEFAULT_NODES_DIR);
            adjust_base_dir(os, default)
        }
        PackagingMode::Development { nodes_dir } => absolutize(nodes_dir),
    }
}

/// Apply the packaged-mode table to a default bundled root
pub fn adjust_base_dir(os: Os, default: PathBuf) -> PathBuf {
    packaged_adjustments(os)
        .iter()
        .fold(default, |path, adjust| adjust(path))
}

/// Path of the bundled executable for `client` below `base`
pub fn bundled_path(base: &Path, client: ClientType, mode: &PackagingMode, platform: &Platform) -> PathBuf {
    let executable = client.executable_name(platform.os);
    match mode {
        PackagingMode::Packaged { .. } => base.join(client.name()).join(executable),
        PackagingMode::Development { .. } => base
            .join(client.name())
            .join(platform.bundle_dir_name())
            .join(executable),
    }
}

/// List the client types that have a folder below `base`.
///
/// Folders that don't name a known client are skipped. The result is sorted so
/// scans are deterministic regardless of directory iteration order.
pub fn list_client_dirs(base: &Path) -> Result<Vec<ClientType>> {
    let entries = std::fs::read_dir(base).map_err(|source| NodePathError::LayoutUnavailable {
        path: base.to_path_buf(),
        source,
    })?;

    let mut clients = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| NodePathError::LayoutUnavailable {
            path: base.to_path_buf(),
            source,
        })?;

        if !entry.path().is_dir() {
            continue;
        }

        let name = entry.file_name();
        match name.to_str().and_then(|name| name.parse::<ClientType>().ok()) {
            Some(client) => clients.push(client),
            None => debug!(entry = ?name, "Skipping unknown client folder"),
        }
    }

    clients.sort();
    clients.dedup();
    Ok(clients)
}

fn rename_nodes_dir(path: PathBuf) -> PathBuf {
    match path.file_name() {
        Some(name) if name == DEFAULT_NODES_DIR => path.with_file_name(PACKAGED_NODES_DIR),
        _ => path,
    }
}

fn strip_archive_marker(path: PathBuf) -> PathBuf {
    path.components()
        .filter(|component| component.as_os_str() != ARCHIVE_MARKER)
        .collect()
}

fn relocate_to_frameworks(path: PathBuf) -> PathBuf {
    let Some(name) = path.file_name().map(|name| name.to_os_string()) else {
        return path;
    };
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
    normalize_lexically(&parent.join("..").join(MACOS_FRAMEWORKS_DIR).join(name))
}

fn to_windows_separators(path: PathBuf) -> PathBuf {
    let mut native = String::new();
    let mut needs_separator = false;

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => native.push_str(&prefix.as_os_str().to_string_lossy()),
            Component::RootDir => native.push('\\'),
            Component::CurDir => continue,
            Component::ParentDir | Component::Normal(_) => {
                if needs_separator {
                    native.push('\\');
                }
                let segment = component.as_os_str().to_string_lossy();
                native.push_str(&segment.replace('/', "\\"));
                needs_separator = true;
            }
        }
    }

    PathBuf::from(native)
}

/// Resolve `.` and `..` without consulting the filesystem
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(normalized.components().next_back(), Some(Component::Normal(_)))
                    && normalized.pop();
                if !popped && !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => normalize_lexically(&cwd.join(path)),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_packaged_linux_strips_archive_marker() {
        let adjusted = adjust_base_dir(Os::Linux, PathBuf::from("/opt/Wallet/resources/app.asar/nodes"));
        assert_eq!(adjusted, PathBuf::from("/opt/Wallet/resources/node"));
    }

    #[test]
    fn test_packaged_macos_moves_to_frameworks() {
        let adjusted = adjust_base_dir(
            Os::MacOs,
            PathBuf::from("/Applications/Wallet.app/Contents/Resources/app.asar/nodes"),
        );
        assert_eq!(
            adjusted,
            PathBuf::from("/Applications/Wallet.app/Contents/Frameworks/node")
        );
    }

    #[test]
    fn test_packaged_windows_uses_native_separators() {
        let adjusted = adjust_base_dir(Os::Windows, PathBuf::from("/Wallet/resources/app.asar/nodes"));
        assert_eq!(adjusted, PathBuf::from("\\Wallet\\resources\\node"));
    }

    #[test]
    fn test_rename_only_touches_trailing_nodes() {
        let adjusted = adjust_base_dir(Os::Linux, PathBuf::from("/srv/nodes/bundle"));
        assert_eq!(adjusted, PathBuf::from("/srv/nodes/bundle"));
    }

    #[test]
    fn test_development_mode_is_unadjusted() {
        let mode = PackagingMode::Development {
            nodes_dir: PathBuf::from("/work/wallet/nodes"),
        };
        assert_eq!(resolve_base_dir(&mode, Os::MacOs), PathBuf::from("/work/wallet/nodes"));
    }

    #[test]
    fn test_development_mode_relative_dir_is_absolute() {
        let mode = PackagingMode::Development {
            nodes_dir: PathBuf::from("nodes"),
        };
        let base = resolve_base_dir(&mode, Os::Linux);
        assert!(base.is_absolute());
        assert!(base.ends_with("nodes"));
    }

    #[test]
    fn test_bundled_path_per_mode() {
        let platform = Platform::new(Os::MacOs, "x86_64");
        let base = Path::new("/base");

        let dev = PackagingMode::Development {
            nodes_dir: base.to_path_buf(),
        };
        assert_eq!(
            bundled_path(base, ClientType::Geth, &dev, &platform),
            PathBuf::from("/base/geth/darwin-x64/geth")
        );

        let packaged = PackagingMode::Packaged {
            app_root: PathBuf::from("/app"),
        };
        assert_eq!(
            bundled_path(base, ClientType::Parity, &packaged, &platform),
            PathBuf::from("/base/parity/parity")
        );

        let windows = Platform::new(Os::Windows, "x86_64");
        assert!(bundled_path(base, ClientType::Eth, &packaged, &windows).ends_with("eth/eth.exe"));
    }

    #[test]
    fn test_list_client_dirs_skips_files_and_unknown() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("parity")).unwrap();
        std::fs::create_dir(temp.path().join("geth")).unwrap();
        std::fs::create_dir(temp.path().join("swarm")).unwrap();
        std::fs::write(temp.path().join("eth"), "not a folder").unwrap();

        let clients = list_client_dirs(temp.path()).unwrap();
        assert_eq!(clients, vec![ClientType::Geth, ClientType::Parity]);
    }

    #[test]
    fn test_list_client_dirs_missing_base() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nodes");
        match list_client_dirs(&missing) {
            Err(NodePathError::LayoutUnavailable { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected LayoutUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(normalize_lexically(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize_lexically(Path::new("../x")), PathBuf::from("../x"));
    }
}

//! Device node enumeration
//!
//! The same enclosure is usually reachable through several nodes (`/dev/sgN`,
//! `/dev/bsg/...`, `/dev/ses*`). Nodes are collapsed by device number so each
//! physical device is queried once.

use sesfan_core::{DeviceCandidate, DeviceId};
use std::collections::HashSet;
use std::fs::Metadata;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::Path;
use tracing::{debug, info, warn};

/// Device node patterns searched by default, in order
pub const DEFAULT_DEVICE_GLOBS: &[&str] = &["/dev/sg*", "/dev/ses*", "/dev/bsg/*", "/dev/es/ses*"];

/// Identity key of a character device, `None` for any other file type
pub fn device_id(metadata: &Metadata) -> Option<DeviceId> {
    if !metadata.file_type().is_char_device() {
        return None;
    }

    let rdev = metadata.rdev() as libc::dev_t;
    Some(DeviceId::new(libc::major(rdev), libc::minor(rdev)))
}

/// Expand `patterns` into distinct character devices, in discovery order
///
/// Nothing here is fatal: bad patterns, vanished nodes, non-device files and
/// duplicate nodes are logged and skipped.
pub fn enumerate_devices<S: AsRef<str>>(patterns: &[S]) -> Vec<DeviceCandidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        let paths = match glob::glob(pattern) {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Invalid device pattern {}: {}", pattern, e);
                continue;
            }
        };

        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    debug!("Skipping unreadable path: {}", e);
                    continue;
                }
            };

            // stat follows symlinks, so aliases resolve to the real node
            let metadata = match std::fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    debug!("Cannot stat {}: {}", path.display(), e);
                    continue;
                }
            };

            let Some(id) = device_id(&metadata) else {
                info!("Enclosure not found on {}", path.display());
                continue;
            };

            if !seen.insert(id) {
                info!("Enclosure already seen on {} ({})", path.display(), id);
                continue;
            }

            debug!("Candidate device {} ({})", path.display(), id);
            candidates.push(DeviceCandidate::new(path, id));
        }
    }

    candidates
}

/// Narrow `candidates` to the one node addressed by `device`
///
/// `device` may name any alias of the enclosure; it is matched by path first
/// and then by device number.
pub fn select_device(candidates: Vec<DeviceCandidate>, device: &Path) -> Vec<DeviceCandidate> {
    let wanted = std::fs::metadata(device)
        .ok()
        .and_then(|metadata| device_id(&metadata));
    if wanted.is_none() {
        warn!("Device {} is not a character device", device.display());
    }

    candidates
        .into_iter()
        .filter(|c| c.path == device || Some(c.id) == wanted)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn pattern(dir: &TempDir, glob: &str) -> String {
        dir.path().join(glob).display().to_string()
    }

    #[test]
    fn test_device_id_char_device() {
        // /dev/null is 1,3 on Linux
        let metadata = std::fs::metadata("/dev/null").unwrap();
        assert_eq!(device_id(&metadata), Some(DeviceId::new(1, 3)));
    }

    #[test]
    fn test_device_id_regular_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, b"not a device").unwrap();

        assert_eq!(device_id(&std::fs::metadata(&file).unwrap()), None);
        assert_eq!(device_id(&std::fs::metadata(dir.path()).unwrap()), None);
    }

    #[test]
    fn test_duplicate_nodes_collapse() {
        let dir = TempDir::new().unwrap();
        symlink("/dev/null", dir.path().join("sg0")).unwrap();
        symlink("/dev/null", dir.path().join("sg1")).unwrap();

        let candidates = enumerate_devices(&[pattern(&dir, "sg*")]);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].path, dir.path().join("sg0"));
        assert_eq!(candidates[0].id, DeviceId::new(1, 3));
    }

    #[test]
    fn test_duplicates_across_patterns() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("bsg")).unwrap();
        symlink("/dev/null", dir.path().join("sg0")).unwrap();
        symlink("/dev/null", dir.path().join("bsg").join("0:0:0:0")).unwrap();
        symlink("/dev/zero", dir.path().join("ses0")).unwrap();

        let candidates = enumerate_devices(&[
            pattern(&dir, "sg*"),
            pattern(&dir, "ses*"),
            pattern(&dir, "bsg/*"),
        ]);

        let paths: Vec<PathBuf> = candidates.into_iter().map(|c| c.path).collect();
        assert_eq!(paths, vec![dir.path().join("sg0"), dir.path().join("ses0")]);
    }

    #[test]
    fn test_non_devices_excluded() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("sg0"), b"regular").unwrap();
        std::fs::create_dir(dir.path().join("sg1")).unwrap();
        symlink("/dev/zero", dir.path().join("sg2")).unwrap();

        let candidates = enumerate_devices(&[pattern(&dir, "sg*")]);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].path, dir.path().join("sg2"));
    }

    #[test]
    fn test_vanished_node_skipped() {
        let dir = TempDir::new().unwrap();
        symlink(dir.path().join("gone"), dir.path().join("sg0")).unwrap();
        symlink("/dev/null", dir.path().join("sg1")).unwrap();

        let candidates = enumerate_devices(&[pattern(&dir, "sg*")]);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].path, dir.path().join("sg1"));
    }

    #[test]
    fn test_no_matches_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(enumerate_devices(&[pattern(&dir, "sg*")]).is_empty());
        assert!(enumerate_devices::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_invalid_pattern_skipped() {
        let dir = TempDir::new().unwrap();
        symlink("/dev/null", dir.path().join("sg0")).unwrap();

        let candidates = enumerate_devices(&["[".to_string(), pattern(&dir, "sg*")]);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_select_device_by_alias() {
        let dir = TempDir::new().unwrap();
        symlink("/dev/null", dir.path().join("sg0")).unwrap();
        symlink("/dev/null", dir.path().join("sg1")).unwrap();
        symlink("/dev/zero", dir.path().join("sg2")).unwrap();

        let candidates = enumerate_devices(&[pattern(&dir, "sg*")]);
        assert_eq!(candidates.len(), 2);

        // sg1 was collapsed into sg0 but still selects it
        let selected = select_device(candidates.clone(), &dir.path().join("sg1"));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].path, dir.path().join("sg0"));

        let selected = select_device(candidates.clone(), &dir.path().join("sg2"));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, DeviceId::new(1, 5));

        let missing = dir.path().join("missing");
        assert!(select_device(candidates, &missing).is_empty());
    }

    #[test]
    fn test_default_globs() {
        assert_eq!(
            DEFAULT_DEVICE_GLOBS,
            &["/dev/sg*", "/dev/ses*", "/dev/bsg/*", "/dev/es/ses*"]
        );
    }
}

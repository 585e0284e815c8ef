//! File Freshness Probe
//!
//! A small trait abstracting "does this path exist, and when was it last
//! modified", kept synchronous since the resolver runs one build step at a
//! time and never needs to overlap I/O. `RealProbe` hits the real
//! filesystem; tests use an in-memory fake instead of touching a real disk.

use std::path::Path;
use std::time::SystemTime;

/// Probes file existence and modification time.
pub trait FileProbe {
    fn exists(&self, path: &str) -> bool;

    /// `None` means "missing or unreadable". The resolver treats that the
    /// same as "does not exist" for freshness purposes.
    fn mtime(&self, path: &str) -> Option<SystemTime>;
}

/// Probes the real filesystem via `std::fs::metadata`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealProbe;

impl FileProbe for RealProbe {
    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }

    fn mtime(&self, path: &str) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|m| m.modified()).ok()
    }
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::collections::HashMap;

    /// An in-memory stand-in for tests that need deterministic mtimes,
    /// which a real clock can't reliably give a fast test suite.
    #[derive(Debug, Default)]
    pub struct FakeProbe {
        files: HashMap<String, SystemTime>,
    }

    impl FakeProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn touch(&mut self, path: &str, at: SystemTime) -> &mut Self {
            self.files.insert(path.to_string(), at);
            self
        }

        pub fn remove(&mut self, path: &str) -> &mut Self {
            self.files.remove(path);
            self
        }
    }

    impl FileProbe for FakeProbe {
        fn exists(&self, path: &str) -> bool {
            self.files.contains_key(path)
        }

        fn mtime(&self, path: &str) -> Option<SystemTime> {
            self.files.get(path).copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeProbe;
    use super::*;
    use std::time::Duration;

    #[test]
    fn fake_probe_tracks_existence_and_mtime() {
        let mut probe = FakeProbe::new();
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        probe.touch("in", t0);
        assert!(probe.exists("in"));
        assert!(!probe.exists("out"));
        assert_eq!(probe.mtime("in"), Some(t0));
        assert_eq!(probe.mtime("out"), None);
    }
}

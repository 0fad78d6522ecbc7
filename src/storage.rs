//! Storage path resolution for downloaded stencils.
//!
//! A [`StorageResolver`] is an ordered list of [`Probe`]s. Each probe asks
//! one source for a directory and either answers with a non-empty string or
//! with nothing; the first answer wins. The list is assembled per platform
//! at composition time ([`StorageResolver::for_platform`]), so the pipeline
//! never knows which platform it runs on.
//!
//! Default chain:
//!
//! ```text
//! 1. storage.directory            (if configured)
//! 2. platform cache directory
//! 3. platform documents directory
//! 4. storage.android_fallback     (Android only)
//! ```
//!
//! Resolution runs again for every download; platform directories can come
//! and go between attempts.

use crate::config::StorageConfig;
use std::fmt;
use std::path::{MAIN_SEPARATOR, is_separator};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("no writable directory found (tried: {})", tried.join(", "))]
    Unavailable { tried: Vec<&'static str> },
}

/// The platform the client is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Platform {
    /// Platform of the compile target.
    pub fn current() -> Self {
        if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Other
        }
    }
}

type ProbeFn = Box<dyn Fn() -> Option<String> + Send + Sync>;

/// One directory source in the fallback chain.
pub struct Probe {
    label: &'static str,
    run: ProbeFn,
}

impl Probe {
    pub fn new(
        label: &'static str,
        run: impl Fn() -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            label,
            run: Box::new(run),
        }
    }

    /// A probe that always answers with `dir`.
    pub fn fixed(label: &'static str, dir: impl Into<String>) -> Self {
        let dir = dir.into();
        Self::new(label, move || Some(dir.clone()))
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Run the probe. Empty or blank strings count as no answer.
    fn probe(&self) -> Option<String> {
        (self.run)().filter(|dir| !dir.trim().is_empty())
    }
}

impl fmt::Debug for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Probe").field("label", &self.label).finish()
    }
}

/// A directory for one download, always ending in a path separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStoragePath(String);

impl ResolvedStoragePath {
    pub fn new(dir: impl Into<String>) -> Self {
        let mut dir = dir.into();
        if !dir.ends_with(is_separator) {
            dir.push(MAIN_SEPARATOR);
        }
        Self(dir)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of `file_name` inside this directory.
    pub fn join(&self, file_name: &str) -> String {
        format!("{}{}", self.0, file_name)
    }
}

impl fmt::Display for ResolvedStoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Default)]
pub struct StorageResolver {
    probes: Vec<Probe>,
}

impl StorageResolver {
    pub fn new(probes: Vec<Probe>) -> Self {
        Self { probes }
    }

    /// The default chain for `platform`; see the module docs.
    pub fn for_platform(platform: Platform, config: &StorageConfig) -> Self {
        let mut probes = Vec::new();
        if let Some(dir) = &config.directory {
            probes.push(Probe::fixed("configured directory", dir.clone()));
        }
        probes.push(Probe::new("cache directory", || {
            dirs::cache_dir().map(|p| p.to_string_lossy().into_owned())
        }));
        probes.push(Probe::new("documents directory", || {
            dirs::document_dir().map(|p| p.to_string_lossy().into_owned())
        }));
        if platform == Platform::Android {
            probes.push(Probe::fixed(
                "android sandbox cache",
                config.android_fallback.clone(),
            ));
        }
        Self::new(probes)
    }

    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }

    /// Walk the chain and return the first usable directory.
    pub fn resolve(&self) -> Result<ResolvedStoragePath, StorageError> {
        for probe in &self.probes {
            match probe.probe() {
                Some(dir) => {
                    debug!(probe = probe.label, %dir, "storage directory resolved");
                    return Ok(ResolvedStoragePath::new(dir));
                }
                None => debug!(probe = probe.label, "no directory"),
            }
        }
        let tried: Vec<_> = self.probes.iter().map(|p| p.label).collect();
        warn!(?tried, "storage resolution exhausted");
        Err(StorageError::Unavailable { tried })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn first_answer_wins() {
        let resolver = StorageResolver::new(vec![
            Probe::new("absent", || None),
            Probe::fixed("first", "/cache/"),
            Probe::fixed("second", "/docs/"),
        ]);
        assert_eq!(resolver.resolve().unwrap().as_str(), "/cache/");
    }

    #[test]
    fn empty_string_falls_through() {
        let resolver = StorageResolver::new(vec![
            Probe::fixed("empty", ""),
            Probe::fixed("blank", "  "),
            Probe::fixed("docs", "/docs/"),
        ]);
        assert_eq!(resolver.resolve().unwrap().as_str(), "/docs/");
    }

    #[test]
    fn later_probes_not_run_after_a_hit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let resolver = StorageResolver::new(vec![
            Probe::fixed("cache", "/cache/"),
            Probe::new("counted", move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Some("/never/".into())
            }),
        ]);
        resolver.resolve().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn exhausted_chain_is_unavailable() {
        let resolver = StorageResolver::new(vec![
            Probe::new("cache", || None),
            Probe::fixed("docs", ""),
        ]);
        assert_eq!(
            resolver.resolve(),
            Err(StorageError::Unavailable {
                tried: vec!["cache", "docs"]
            })
        );
    }

    #[test]
    fn empty_chain_is_unavailable() {
        assert!(StorageResolver::default().resolve().is_err());
    }

    #[test]
    fn trailing_separator_is_added_once() {
        let with = ResolvedStoragePath::new("/cache/");
        assert_eq!(with.as_str(), "/cache/");
        let without = ResolvedStoragePath::new("/cache");
        assert!(without.as_str().ends_with(MAIN_SEPARATOR));
        assert_eq!(
            without.join("stencil_1.pdf"),
            format!("/cache{MAIN_SEPARATOR}stencil_1.pdf")
        );
    }

    #[test]
    fn android_chain_ends_with_sandbox_fallback() {
        let config = StorageConfig::default();
        let resolver = StorageResolver::for_platform(Platform::Android, &config);
        let labels: Vec<_> = resolver.probes().iter().map(Probe::label).collect();
        assert_eq!(
            labels,
            [
                "cache directory",
                "documents directory",
                "android sandbox cache"
            ]
        );
    }

    #[test]
    fn android_sandbox_cache_used_when_platform_dirs_missing() {
        let config = StorageConfig::default();
        let resolver = StorageResolver::new(vec![
            Probe::new("cache directory", || None),
            Probe::new("documents directory", || None),
            Probe::fixed("android sandbox cache", config.android_fallback.clone()),
        ]);
        let dir = resolver.resolve().unwrap();
        assert_eq!(dir.as_str(), "/data/user/0/host.exp.exponent/cache/");
        assert_eq!(
            dir.join("stencil_1.pdf"),
            "/data/user/0/host.exp.exponent/cache/stencil_1.pdf"
        );
    }

    #[test]
    fn non_android_chain_has_no_hardcoded_fallback() {
        let config = StorageConfig::default();
        for platform in [Platform::Ios, Platform::Linux, Platform::Other] {
            let resolver = StorageResolver::for_platform(platform, &config);
            assert!(
                resolver
                    .probes()
                    .iter()
                    .all(|p| p.label() != "android sandbox cache")
            );
        }
    }

    #[test]
    fn configured_directory_is_probed_first() {
        let config = StorageConfig {
            directory: Some("/srv/stencils".into()),
            ..StorageConfig::default()
        };
        let resolver = StorageResolver::for_platform(Platform::Linux, &config);
        assert_eq!(resolver.probes()[0].label(), "configured directory");
        assert_eq!(
            resolver.resolve().unwrap(),
            ResolvedStoragePath::new("/srv/stencils")
        );
    }
}

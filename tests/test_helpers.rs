// Test helpers for isolated testing
// Provides temp directories for formula definitions and pre-seeded downloads

#![allow(dead_code)]

use brewspec::{Download, Downloader, Result, SpecError};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated test environment using temporary directories
/// Automatically cleaned up when dropped (RAII pattern)
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub formulae: PathBuf,
    pub cache: PathBuf,
    pub stage: PathBuf,
}

impl TestEnvironment {
    /// Create a new isolated test environment
    ///
    /// - temp/
    ///   - formulae/   (JSON formula definitions)
    ///   - cache/      (downloads, keyed by download name)
    ///   - stage/      (unpack target)
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let formulae = temp_dir.path().join("formulae");
        let cache = temp_dir.path().join("cache");
        let stage = temp_dir.path().join("stage");

        std::fs::create_dir_all(&formulae).unwrap();
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::create_dir_all(&stage).unwrap();

        Self {
            temp_dir,
            formulae,
            cache,
            stage,
        }
    }

    /// Write a formula definition and return its path
    pub fn write_formula(&self, name: &str, json: &str) -> PathBuf {
        let path = self.formulae.join(format!("{}.json", name));
        std::fs::write(&path, json).unwrap();
        path
    }

    /// Seed the cache with a download
    pub fn seed_download(&self, download_name: &str, contents: &[u8]) -> PathBuf {
        let path = self.cache.join(download_name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn downloader(&self) -> CacheDownloader {
        CacheDownloader {
            cache: self.cache.clone(),
            fetched: RefCell::new(Vec::new()),
        }
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// Downloader that serves pre-seeded files from the cache directory and
/// "stages" by copying into the target directory
pub struct CacheDownloader {
    cache: PathBuf,
    pub fetched: RefCell<Vec<String>>,
}

impl Downloader for CacheDownloader {
    fn fetch(&self, download: &Download<'_>) -> Result<PathBuf> {
        self.fetched.borrow_mut().push(download.name.clone());
        let path = self.cache.join(&download.name);
        if path.exists() {
            Ok(path)
        } else {
            Err(SpecError::Download(format!(
                "{} not in cache ({})",
                download.name,
                download.resource.url().unwrap_or("no url")
            )))
        }
    }

    fn stage(&self, fetched: &Path, target: &Path) -> Result<()> {
        let name = fetched
            .file_name()
            .ok_or_else(|| SpecError::Download(format!("bad path {}", fetched.display())))?;
        std::fs::copy(fetched, target.join(name))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_creates_directories() {
        let env = TestEnvironment::new();

        assert!(env.formulae.exists());
        assert!(env.cache.exists());
        assert!(env.stage.exists());
    }

    #[test]
    fn test_environment_cleanup() {
        let cache_path = {
            let env = TestEnvironment::new();
            env.cache.clone()
        };

        assert!(!cache_path.exists());
    }
}

//! Cache for analysis results
//!
//! Entries are keyed by the image bytes and the rendered prompt, so the same
//! photo analysed with a different context is a different entry.

use rcfa_types::{AnalysisResult, CacheError, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Cache manager for analysis results
pub struct Cache {
    cache_dir: PathBuf,
}

impl Cache {
    /// Create a new cache manager
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&cache_dir)
            .map_err(|e| CacheError::IoError(format!("{}: {}", cache_dir.display(), e)))?;
        Ok(Self { cache_dir })
    }

    /// SHA-256 over the prompt and image bytes
    pub fn cache_key(image: &[u8], prompt: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(prompt.as_bytes());
        hasher.update([0u8]);
        hasher.update(image);
        format!("{:x}", hasher.finalize())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Get cached result for a key
    pub fn get(&self, key: &str) -> Result<Option<AnalysisResult>> {
        let cache_path = self.entry_path(key);

        if !cache_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&cache_path)?;
        let result: AnalysisResult = serde_json::from_str(&content)
            .map_err(|e| CacheError::Corrupted(format!("{}: {}", cache_path.display(), e)))?;
        Ok(Some(result))
    }

    /// Store result in cache
    pub fn set(&self, key: &str, result: &AnalysisResult) -> Result<()> {
        let content = serde_json::to_string_pretty(result)?;
        fs::write(self.entry_path(key), content)?;
        Ok(())
    }

    /// Clear all cached results
    pub fn clear(&self) -> Result<usize> {
        let mut count = 0;

        for path in self.entries()? {
            fs::remove_file(&path)?;
            count += 1;
        }

        Ok(count)
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<CacheStats> {
        let mut count = 0;
        let mut total_size = 0u64;

        for path in self.entries()? {
            count += 1;
            if let Ok(metadata) = fs::metadata(&path) {
                total_size += metadata.len();
            }
        }

        Ok(CacheStats {
            entry_count: count,
            total_size_bytes: total_size,
            cache_dir: self.cache_dir.clone(),
        })
    }

    fn entries(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if is_json(&path) {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "json")
}

/// Cache statistics
#[derive(Debug)]
pub struct CacheStats {
    pub entry_count: usize,
    pub total_size_bytes: u64,
    pub cache_dir: PathBuf,
}

impl CacheStats {
    pub fn display(&self) -> String {
        let size_kb = self.total_size_bytes as f64 / 1024.0;
        format!(
            "Cache Statistics\n\
             ================\n\
             Entries:    {}\n\
             Total size: {:.2} KB\n\
             Location:   {}",
            self.entry_count,
            size_kb,
            self.cache_dir.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcfa_types::Error;
    use tempfile::tempdir;

    fn sample() -> AnalysisResult {
        AnalysisResult {
            observed_damage: "Pitting".to_string(),
            failure_mode: "Fatigue".to_string(),
            root_cause_analysis: vec!["Overload".to_string()],
            confidence_score: 0.7,
            technical_notes: None,
            recommendations: vec!["Replace bearing".to_string()],
            bearing_detected: true,
        }
    }

    #[test]
    fn test_key_depends_on_prompt_and_image() {
        let a = Cache::cache_key(b"img", "prompt a");
        let b = Cache::cache_key(b"img", "prompt b");
        let c = Cache::cache_key(b"img2", "prompt a");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, Cache::cache_key(b"img", "prompt a"));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_set_get_clear() {
        let dir = tempdir().unwrap();
        let cache = Cache::new(dir.path().join("cache")).unwrap();
        let key = Cache::cache_key(b"img", "prompt");

        assert!(cache.get(&key).unwrap().is_none());
        cache.set(&key, &sample()).unwrap();
        assert_eq!(cache.get(&key).unwrap(), Some(sample()));

        let stats = cache.stats().unwrap();
        assert_eq!(stats.entry_count, 1);
        assert!(stats.display().contains("Entries:    1"));

        assert_eq!(cache.clear().unwrap(), 1);
        assert!(cache.get(&key).unwrap().is_none());
    }

    #[test]
    fn test_corrupted_entry() {
        let dir = tempdir().unwrap();
        let cache = Cache::new(dir.path().to_path_buf()).unwrap();
        fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let err = cache.get("bad").unwrap_err();
        assert!(matches!(err, Error::Cache(CacheError::Corrupted(_))));
    }
}

//! Hot-reloadable WGSL source for the unlit pipeline

use crate::pipeline::BUILTIN_UNLIT_SHADER;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Tracks a shader file and reloads it when its modification time changes.
///
/// A cache without a path serves the built-in unlit shader. Read failures
/// keep the previous source so a half-written file never blanks the view.
pub struct ShaderCache {
    path: Option<PathBuf>,
    modified: Option<SystemTime>,
    source: String,
}

impl ShaderCache {
    pub fn builtin() -> Self {
        Self {
            path: None,
            modified: None,
            source: BUILTIN_UNLIT_SHADER.to_string(),
        }
    }

    /// Watch a shader file. If it can't be read now the built-in shader is
    /// used until the file appears.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut cache = Self::builtin();
        match read_with_mtime(&path) {
            Ok((source, modified)) => {
                log::info!("Loaded unlit shader from {}", path.display());
                cache.source = source;
                cache.modified = Some(modified);
            }
            Err(e) => {
                log::warn!(
                    "Could not read shader {}: {}; using built-in unlit shader",
                    path.display(),
                    e
                );
            }
        }
        cache.path = Some(path);
        cache
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Re-read the file if its modification time differs from the last
    /// successful read. Returns true if the source changed.
    pub fn refresh(&mut self) -> bool {
        let Some(path) = &self.path else {
            return false;
        };

        let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => return false,
        };
        if self.modified == Some(modified) {
            return false;
        }

        match std::fs::read_to_string(path) {
            Ok(source) => {
                self.modified = Some(modified);
                if source == self.source {
                    return false;
                }
                log::info!("Reloaded shader {}", path.display());
                self.source = source;
                true
            }
            Err(e) => {
                log::warn!("Failed to reload shader {}: {}", path.display(), e);
                false
            }
        }
    }
}

fn read_with_mtime(path: &Path) -> std::io::Result<(String, SystemTime)> {
    let modified = std::fs::metadata(path)?.modified()?;
    let source = std::fs::read_to_string(path)?;
    Ok((source, modified))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ember_shader_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(time).unwrap();
    }

    #[test]
    fn builtin_never_refreshes() {
        let mut cache = ShaderCache::builtin();
        assert_eq!(cache.source(), BUILTIN_UNLIT_SHADER);
        assert!(cache.path().is_none());
        assert!(!cache.refresh());
    }

    #[test]
    fn missing_file_falls_back_to_builtin() {
        let dir = temp_dir();
        let mut cache = ShaderCache::from_path(dir.join("missing.wgsl"));
        assert_eq!(cache.source(), BUILTIN_UNLIT_SHADER);
        assert!(!cache.refresh());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn reloads_when_mtime_changes() {
        let dir = temp_dir();
        let path = dir.join("unlit.wgsl");
        std::fs::write(&path, "// first").unwrap();
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        set_mtime(&path, base);

        let mut cache = ShaderCache::from_path(&path);
        assert_eq!(cache.source(), "// first");
        assert!(!cache.refresh());

        std::fs::write(&path, "// second").unwrap();
        set_mtime(&path, base + Duration::from_secs(10));
        assert!(cache.refresh());
        assert_eq!(cache.source(), "// second");

        // Same mtime again: nothing to do
        assert!(!cache.refresh());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn touched_file_with_same_source_is_not_a_change() {
        let dir = temp_dir();
        let path = dir.join("unlit.wgsl");
        std::fs::write(&path, "// same").unwrap();
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(2_000_000);
        set_mtime(&path, base);

        let mut cache = ShaderCache::from_path(&path);
        set_mtime(&path, base + Duration::from_secs(5));
        assert!(!cache.refresh());
        assert_eq!(cache.source(), "// same");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn deleted_file_keeps_previous_source() {
        let dir = temp_dir();
        let path = dir.join("unlit.wgsl");
        std::fs::write(&path, "// kept").unwrap();

        let mut cache = ShaderCache::from_path(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(!cache.refresh());
        assert_eq!(cache.source(), "// kept");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_created_later_is_picked_up() {
        let dir = temp_dir();
        let path = dir.join("late.wgsl");
        let mut cache = ShaderCache::from_path(&path);
        assert_eq!(cache.source(), BUILTIN_UNLIT_SHADER);

        std::fs::write(&path, "// late").unwrap();
        assert!(cache.refresh());
        assert_eq!(cache.source(), "// late");
        let _ = std::fs::remove_dir_all(&dir);
    }
}

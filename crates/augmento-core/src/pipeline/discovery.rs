//! Input discovery: walks the input directory and collects explicit paths.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{Config, ProcessingConfig};

/// Finds augmentable image files.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

/// A discovered input file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Discover all supported image files at a path.
    ///
    /// A file is returned if its extension is supported; a directory is
    /// walked recursively. Results are sorted by path.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        if path.is_file() {
            return self.entry(path).into_iter().collect();
        }
        if !path.exists() {
            tracing::warn!("Input path does not exist: {:?}", path);
            return vec![];
        }

        let mut files: Vec<DiscoveredFile> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| self.entry(e.path()))
            .collect();

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Collect every input named by a config: the walked `input_dir` plus
    /// `image_paths`, deduplicated and sorted.
    pub fn discover_inputs(&self, config: &Config) -> Vec<PathBuf> {
        let mut paths = BTreeSet::new();
        if let Some(dir) = config.input_path() {
            paths.extend(self.discover(&dir).into_iter().map(|f| f.path));
        }
        for path in config.image_path_list() {
            if path.is_file() {
                paths.insert(path);
            } else {
                tracing::warn!("Skipping missing input file: {:?}", path);
            }
        }
        paths.into_iter().collect()
    }

    fn entry(&self, path: &Path) -> Option<DiscoveredFile> {
        if !self.is_supported(path) {
            return None;
        }
        let size = std::fs::metadata(path).ok()?.len();
        Some(DiscoveredFile {
            path: path.to_path_buf(),
            size,
        })
    }

    /// Check if a file has a supported extension (case-insensitive).
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Total size of discovered files in bytes.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_supported() {
        let discovery = FileDiscovery::new(ProcessingConfig::default());

        assert!(discovery.is_supported(Path::new("test.jpg")));
        assert!(discovery.is_supported(Path::new("test.JPG")));
        assert!(discovery.is_supported(Path::new("test.tiff")));
        assert!(discovery.is_supported(Path::new("test.png")));
        assert!(!discovery.is_supported(Path::new("test.txt")));
        assert!(!discovery.is_supported(Path::new("noext")));
    }

    #[test]
    fn test_discover_walks_recursively_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.png"), b"x").unwrap();
        fs::write(dir.path().join("a.jpg"), b"xy").unwrap();
        fs::write(dir.path().join("notes.txt"), b"skip").unwrap();
        fs::write(dir.path().join("nested").join("c.PNG"), b"xyz").unwrap();

        let discovery = FileDiscovery::new(ProcessingConfig::default());
        let files = discovery.discover(dir.path());
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.jpg"),
                PathBuf::from("b.png"),
                PathBuf::from("nested").join("c.PNG"),
            ]
        );
        assert_eq!(FileDiscovery::total_size(&files), 6);
    }

    #[test]
    fn test_discover_missing_dir_is_empty() {
        let discovery = FileDiscovery::new(ProcessingConfig::default());
        assert!(discovery.discover(Path::new("/no/such/input/dir")).is_empty());
    }

    #[test]
    fn test_discover_inputs_merges_and_dedupes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        fs::create_dir(&input).unwrap();
        fs::write(input.join("one.png"), b"1").unwrap();
        let extra = dir.path().join("extra.jpg");
        fs::write(&extra, b"2").unwrap();

        let config = Config {
            input_dir: Some(input.clone()),
            image_paths: vec![extra.clone(), input.join("one.png"), dir.path().join("gone.png")],
            ..Config::default()
        };
        let discovery = FileDiscovery::new(config.processing.clone());
        let paths = discovery.discover_inputs(&config);
        assert_eq!(paths.len(), 2);
        assert!(paths.contains(&extra));
        assert!(paths.contains(&input.join("one.png")));
    }
}

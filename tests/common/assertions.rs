//! Assertions on the output tree

use std::path::Path;

use walkdir::WalkDir;

/// Every regular file below `root`, as sorted `/`-separated relative paths
pub fn files_under(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .ok()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
        })
        .collect();
    files.sort();
    files
}

/// Assert that no partially written download was left behind
pub fn assert_no_partial_files(root: &Path) {
    let partial: Vec<String> = files_under(root)
        .into_iter()
        .filter(|f| f.ends_with(".part"))
        .collect();
    assert!(partial.is_empty(), "partial files left behind: {:?}", partial);
}

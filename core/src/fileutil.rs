//! File Utility Functions

use std::path::PathBuf;
use std::result::Result;

/// Returns the absolute path after resolving the given path.
///
/// * `path` - The path.
pub fn absolute_path(path: &str) -> Result<String, String> {
    match PathBuf::from(path)
        .canonicalize()
        .map(PathBuf::into_os_string)
        .map(|s| s.into_string().ok())
    {
        Ok(Some(abs_path)) => Ok(abs_path),
        Ok(None) => Err(format!("invalid path {}", path)),
        Err(err) => Err(format!("invalid path {}. {}.", path, err)),
    }
}

/// Reads a whole text file.
///
/// * `path` - The path.
pub fn file_to_string(path: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|err| format!("Error reading file '{path}': {err}"))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_back_temp_file() {
        let mut p = std::env::temp_dir();
        p.push(format!("lenscore-fileutil-{}.txt", std::process::id()));
        let path = p.to_string_lossy().into_owned();
        std::fs::write(&path, "1 2 3").unwrap();

        assert_eq!(file_to_string(&path).unwrap(), "1 2 3");
        assert!(absolute_path(&path).is_ok());

        std::fs::remove_file(&path).ok();
        assert!(file_to_string(&path).is_err());
        assert!(absolute_path(&path).is_err());
    }
}

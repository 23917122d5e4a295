//! Schema source aggregation.
//!
//! Collects the contents of the schema files sqlc was configured with into a
//! single text blob, so templates can embed the DDL verbatim.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SchemaError;

/// Concatenate all schema sources, each followed by a newline.
///
/// Files are read as-is. Directories contribute their direct non-directory
/// entries in file name order; nested directories are skipped.
pub fn aggregate<P: AsRef<Path>>(paths: &[P]) -> Result<String, SchemaError> {
    let mut schema = String::new();
    for path in paths {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|source| SchemaError::Stat {
            path: path.to_path_buf(),
            source,
        })?;

        if !metadata.is_dir() {
            append_file(&mut schema, path)?;
            continue;
        }

        for file in list_files(path)? {
            append_file(&mut schema, &file)?;
        }
    }
    Ok(schema)
}

/// Direct non-directory entries of `dir`, sorted by file name.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>, SchemaError> {
    let read_dir_err = |source| SchemaError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_err)? {
        let path = entry.map_err(read_dir_err)?.path();
        let metadata = fs::metadata(&path).map_err(|source| SchemaError::Stat {
            path: path.clone(),
            source,
        })?;
        if !metadata.is_dir() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Bytes that are not UTF-8 are replaced, never rejected.
fn append_file(schema: &mut String, path: &Path) -> Result<(), SchemaError> {
    let content = fs::read(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    schema.push_str(&String::from_utf8_lossy(&content));
    schema.push('\n');
    Ok(())
}

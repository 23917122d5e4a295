//! Turns the `template` option into the list of templates to render.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::GenerateError;
use crate::options::Options;

/// Suffixes removed from a template's file name to form its output name.
pub const TEMPLATE_SUFFIXES: &[&str] = &[".tmpl", ".gotmpl", ".tpl"];

/// One template file and the name of the file it renders to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateUnit {
    pub source: PathBuf,
    pub output_name: String,
}

/// Resolve the template target.
///
/// A file yields one unit, named by the `filename` option when set. A
/// directory yields one unit per direct non-directory entry, sorted by name;
/// `filename` does not apply there.
pub fn resolve_units(options: &Options) -> Result<Vec<TemplateUnit>, GenerateError> {
    let target = PathBuf::from(&options.template);
    let metadata = fs::metadata(&target).map_err(|source| GenerateError::TemplatePath {
        path: target.clone(),
        source,
    })?;

    if !metadata.is_dir() {
        let output_name = if options.filename.is_empty() {
            output_name(&target)
        } else {
            options.filename.clone()
        };
        return Ok(vec![TemplateUnit {
            source: target,
            output_name,
        }]);
    }

    let entries = fs::read_dir(&target).map_err(|source| GenerateError::TemplatePath {
        path: target.clone(),
        source,
    })?;
    let mut units = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| GenerateError::TemplatePath {
            path: target.clone(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        units.push(TemplateUnit {
            output_name: output_name(&path),
            source: path,
        });
    }
    units.sort_by(|a, b| a.source.cmp(&b.source));
    Ok(units)
}

/// Base name of `path` without its template suffix.
pub fn output_name(path: &Path) -> String {
    let base = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    TEMPLATE_SUFFIXES
        .iter()
        .find_map(|suffix| base.strip_suffix(suffix).filter(|stem| !stem.is_empty()))
        .map(str::to_string)
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn options(template: &Path, filename: &str) -> Options {
        Options {
            template: template.to_string_lossy().into_owned(),
            filename: filename.to_string(),
            ..Options::default()
        }
    }

    #[test]
    fn test_output_name_strips_template_suffix() {
        assert_eq!(output_name(Path::new("t/models.go.tmpl")), "models.go");
        assert_eq!(output_name(Path::new("queries.sql.gotmpl")), "queries.sql");
        assert_eq!(output_name(Path::new("a.tpl")), "a");
        assert_eq!(output_name(Path::new("README.md")), "README.md");
        assert_eq!(output_name(Path::new(".tmpl")), ".tmpl");
    }

    #[test]
    fn test_single_file_uses_filename_option() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.go.tmpl");
        fs::write(&path, "x").unwrap();

        let units = resolve_units(&options(&path, "out.go")).unwrap();
        assert_eq!(
            units,
            vec![TemplateUnit {
                source: path.clone(),
                output_name: "out.go".to_string(),
            }]
        );

        let units = resolve_units(&options(&path, "")).unwrap();
        assert_eq!(units[0].output_name, "db.go");
    }

    #[test]
    fn test_directory_lists_files_sorted_and_skips_subdirectories() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.tmpl"), "b").unwrap();
        fs::write(dir.path().join("a.tmpl"), "a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("c.tmpl"), "c").unwrap();

        let units = resolve_units(&options(dir.path(), "ignored.txt")).unwrap();
        let names: Vec<&str> = units.iter().map(|u| u.output_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(units[0].source, dir.path().join("a.tmpl"));
    }

    #[test]
    fn test_empty_directory_yields_no_units() {
        let dir = tempdir().unwrap();
        assert!(resolve_units(&options(dir.path(), "")).unwrap().is_empty());
    }

    #[test]
    fn test_missing_target_is_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.tmpl");
        let err = resolve_units(&options(&missing, "")).unwrap_err();
        assert!(matches!(err, GenerateError::TemplatePath { path, .. } if path == missing));
    }
}

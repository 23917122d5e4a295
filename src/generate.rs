//! The plugin's `Generate` handler.

use tracing::{debug, info, warn};

use crate::error::GenerateError;
use crate::format::run_formatter;
use crate::funcs::function_env;
use crate::options::Options;
use crate::plugin::{File, GenerateRequest, GenerateResponse};
use crate::render::render_unit;
use crate::resolve::resolve_units;

/// Render every configured template against `request`.
///
/// Files are returned in resolution order. Any failure aborts the whole
/// invocation; no partial response is produced.
pub fn generate(request: GenerateRequest) -> Result<GenerateResponse, GenerateError> {
    let options = Options::from_request(&request)?;
    if options.template.is_empty() {
        warn!("no `template` option configured, nothing to generate");
        return Ok(GenerateResponse::default());
    }

    let units = resolve_units(&options)?;
    debug!(template = %options.template, units = units.len(), "resolved templates");

    let schema_paths = request
        .settings
        .as_ref()
        .map(|settings| settings.schema.clone())
        .unwrap_or_default();
    let funcs = function_env(schema_paths);
    let context = serde_json::to_value(&request).map_err(GenerateError::Context)?;

    let formatter = options.formatter();
    let mut files = Vec::with_capacity(units.len());
    for unit in units {
        let mut contents = render_unit(&unit, &funcs, &context)?;
        if let Some(command) = formatter {
            contents = run_formatter(command, &contents)?;
        }
        debug!(name = %unit.output_name, bytes = contents.len(), "generated file");
        files.push(File {
            name: unit.output_name,
            contents,
        });
    }

    info!(files = files.len(), sqlc_version = %request.sqlc_version, "generation complete");
    Ok(GenerateResponse { files })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{Query, Settings};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn request(options: serde_json::Value) -> GenerateRequest {
        GenerateRequest {
            settings: Some(Settings {
                version: "2".to_string(),
                engine: "postgresql".to_string(),
                ..Settings::default()
            }),
            queries: vec![Query {
                name: "GetAuthor".to_string(),
                cmd: ":one".to_string(),
                text: "SELECT * FROM authors\nWHERE id = $1 -- by id\nLIMIT 1".to_string(),
                ..Query::default()
            }],
            sqlc_version: "v1.27.0".to_string(),
            plugin_options: serde_json::to_vec(&options).unwrap(),
            ..GenerateRequest::default()
        }
    }

    fn write(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_generate_single_file() {
        let dir = tempdir().unwrap();
        let template = write(
            dir.path(),
            "queries.tmpl",
            "{{range .Queries}}{{.Name}} {{.Cmd}}: {{oneLineSQL .Text}}\n{{end}}",
        );
        let req = request(serde_json::json!({"template": template, "filename": "queries.txt"}));

        let resp = generate(req).unwrap();
        assert_eq!(resp.files.len(), 1);
        assert_eq!(resp.files[0].name, "queries.txt");
        assert_eq!(
            String::from_utf8(resp.files[0].contents.clone()).unwrap(),
            "GetAuthor :one: SELECT * FROM authors WHERE id = $1 LIMIT 1\n"
        );
    }

    #[test]
    fn test_generate_empty_template_option() {
        let resp = generate(request(serde_json::json!({}))).unwrap();
        assert!(resp.files.is_empty());

        let resp = generate(GenerateRequest::default()).unwrap();
        assert!(resp.files.is_empty());
    }

    #[test]
    fn test_generate_malformed_options() {
        let mut req = request(serde_json::json!({}));
        req.plugin_options = b"{not json".to_vec();
        assert!(matches!(generate(req), Err(GenerateError::Options(_))));
    }

    #[test]
    fn test_generate_with_formatter() {
        let dir = tempdir().unwrap();
        let template = write(dir.path(), "engine.tmpl", "{{.Settings.Engine}}");
        let req = request(serde_json::json!({
            "template": template,
            "formatter_cmd": "tr a-z A-Z",
        }));

        let resp = generate(req).unwrap();
        assert_eq!(resp.files[0].name, "engine");
        assert_eq!(resp.files[0].contents, b"POSTGRESQL");
    }
}

use std::fs;

use serde_json::Value;
use tracing::debug;

use crate::error::GenerateError;
use crate::resolve::TemplateUnit;
use crate::template::{FuncMap, Template};

/// Read, parse and execute one template against the request context.
pub fn render_unit(unit: &TemplateUnit, funcs: &FuncMap, context: &Value) -> Result<Vec<u8>, GenerateError> {
    let bytes = fs::read(&unit.source).map_err(|source| GenerateError::TemplateRead {
        path: unit.source.clone(),
        source,
    })?;
    let source = String::from_utf8_lossy(&bytes);

    let name = unit.source.display().to_string();
    let template = Template::parse(name, &source, funcs)?;
    let rendered = template.execute(context)?;
    debug!(
        template = %unit.source.display(),
        bytes = rendered.len(),
        "rendered template"
    );
    Ok(rendered.into_bytes())
}

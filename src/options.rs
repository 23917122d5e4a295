//! Plugin options passed through `codegen.options` in `sqlc.yaml`.

use serde::Deserialize;

use crate::error::GenerateError;
use crate::plugin::GenerateRequest;

/// Options recognised by the plugin. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Template file, or a directory whose files are each rendered.
    pub template: String,
    /// Output file name, single-file mode only.
    pub filename: String,
    /// Shell command the rendered output is piped through.
    #[serde(rename = "formatter_cmd")]
    pub formatter_command: String,
    /// Output directory; sqlc uses it, the plugin only carries it.
    pub out: String,
}

impl Options {
    /// Parse options from raw plugin option bytes.
    ///
    /// Empty bytes give the default options. Malformed JSON is an error.
    pub fn parse(bytes: &[u8]) -> Result<Self, GenerateError> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes).map_err(GenerateError::Options)
    }

    pub fn from_request(request: &GenerateRequest) -> Result<Self, GenerateError> {
        Self::parse(&request.plugin_options)
    }

    /// The formatter command, if one is configured. Any non-empty value is
    /// handed to the shell as written.
    pub fn formatter(&self) -> Option<&str> {
        (!self.formatter_command.is_empty()).then_some(self.formatter_command.as_str())
    }
}

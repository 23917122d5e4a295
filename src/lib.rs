//! sqlc.dev template generator.
//!
//! Provides:
//! - `plugin`: generated proto definitions
//! - `runtime`: stdin/stdout plumbing for sqlc.dev process plugins
//! - `generate`: the `Generate` handler rendering templates against a request
//! - `template`: the text template engine

pub mod error;
pub mod format;
pub mod funcs;
pub mod generate;
pub mod logging;
pub mod options;
pub mod plugin;
pub mod render;
pub mod resolve;
pub mod runtime;
pub mod schema;
pub mod template;

pub mod prelude {
    pub use crate::error::GenerateError;
    pub use crate::generate::generate;
    pub use crate::options::Options;
    pub use crate::plugin::*;
    pub use crate::runtime::*;
    pub use prost::Message;
}

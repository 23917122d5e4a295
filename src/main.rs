//! `sqlc-gen-template`: a sqlc process plugin that renders text templates.
//!
//! sqlc runs the binary with the RPC method as its only argument and the
//! encoded `GenerateRequest` on stdin.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use sqlc_gen_template::generate::generate;
use sqlc_gen_template::{logging, runtime};

const GENERATE_METHOD: &str = "/plugin.CodegenService/Generate";

#[derive(Parser, Debug)]
#[command(name = "sqlc-gen-template")]
#[command(about = "Render text templates from sqlc's code generation request", version)]
struct Args {
    /// RPC method sqlc is invoking
    #[arg(value_name = "METHOD")]
    method: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init();

    if let Some(method) = args.method.as_deref() {
        if method != GENERATE_METHOD {
            error!(method, "unknown method");
            return ExitCode::FAILURE;
        }
    }

    match runtime::run(|request| Ok(generate(request)?)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

use crate::plugin::{GenerateRequest, GenerateResponse};
use prost::Message;
use std::error::Error;
use std::io::{Read, Write};
use tracing::debug;

/// Read a request from stdin, hand it to `process`, write the response to
/// stdout.
pub fn run<TFunc>(process: TFunc) -> Result<(), Box<dyn Error>>
where
    TFunc: FnOnce(GenerateRequest) -> Result<GenerateResponse, Box<dyn Error>>,
{
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_with_io(stdin.lock(), stdout.lock(), process)
}

/// Like [`run`], over arbitrary streams. Nothing is written unless `process`
/// succeeds.
pub fn run_with_io<TReader, TWriter, TFunc>(
    mut reader: TReader,
    mut writer: TWriter,
    process: TFunc,
) -> Result<(), Box<dyn Error>>
where
    TReader: Read,
    TWriter: Write,
    TFunc: FnOnce(GenerateRequest) -> Result<GenerateResponse, Box<dyn Error>>,
{
    let mut input = Vec::new();
    reader.read_to_end(&mut input)?;
    debug!(bytes = input.len(), "read generate request");

    let request = GenerateRequest::decode(&input[..])?;
    let response = process(request)?;

    let output = response.encode_to_vec();
    writer.write_all(&output)?;
    writer.flush()?;
    debug!(bytes = output.len(), files = response.files.len(), "wrote generate response");
    Ok(())
}

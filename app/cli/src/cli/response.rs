use engine::error::{Disposition, IngestError};
use eyre::{Result, eyre};
use serde::Serialize;

/// What a caller sees when an ingestion does not go through.
#[derive(Serialize)]
pub struct Failure {
    pub status: String,
    pub disposition: Disposition,
    pub error: String,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints the outcome. Transient failures are reported as pending and do not
/// fail the command.
pub fn print_outcome<T: Serialize>(outcome: Result<T, IngestError>) -> Result<()> {
    match outcome {
        Ok(value) => print_json(&value),
        Err(e) => {
            let disposition = e.disposition();
            print_json(&Failure {
                status: disposition.to_string(),
                disposition,
                error: e.to_string(),
            })?;
            match disposition {
                Disposition::Transient => Ok(()),
                _ => Err(eyre!(e)),
            }
        }
    }
}

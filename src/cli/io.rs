//! File input and stdout output for CLI commands
//!
//! - Inputs: UTF-8 files (raw info text or JSON)
//! - Output: one JSON document or plain text per call, to stdout

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::{CliError, CliResult};

/// Reads a whole text file
pub fn read_text(path: &Path) -> CliResult<String> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and deserializes a JSON file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|source| CliError::InvalidInput {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a value as pretty JSON to stdout
pub fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Writes a value as a single JSON line to stdout
pub fn write_json_line<T: Serialize>(value: &T) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Writes text to stdout as-is
pub fn write_text(text: &str) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"[{"key": "k1"}]"#).unwrap();

        let value: Value = read_json(file.path()).unwrap();
        assert_eq!(value[0]["key"], "k1");
    }

    #[test]
    fn test_read_json_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();

        let err = read_json::<Value>(file.path()).unwrap_err();
        assert_eq!(err.code(), "AERO_CLI_INVALID_INPUT");
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_missing_file() {
        let err = read_text(Path::new("/nonexistent/info.txt")).unwrap_err();
        assert_eq!(err.code(), "AERO_CLI_IO_ERROR");
    }
}

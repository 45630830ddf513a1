//! Reading secrets to share and writing fetched secrets
//!
//! Fetched secrets written to disk are created with mode 0o600
//! (read/write for owner only) on Unix systems.

use crate::error::{ErrorCategory, ErrorKind, Result, YopassError};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

/// Read the message to store from `input_path`, or from stdin when `None`.
///
/// The message is sent as text, so it must be UTF-8.
pub fn read_message(input_path: Option<&Path>) -> Result<String> {
    let bytes = match input_path {
        Some(path) => fs::read(path).map_err(|e| read_error(path, e))?,
        None => {
            let mut data = Vec::new();
            io::stdin().read_to_end(&mut data).map_err(|e| {
                YopassError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to read message from stdin",
                    e,
                )
            })?;
            data
        }
    };

    String::from_utf8(bytes).map_err(|e| {
        YopassError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Encoding,
            "message is not valid UTF-8",
            e,
        )
    })
}

/// Write a fetched secret to `output_path`, or to stdout when `None`.
pub fn write_secret(output_path: Option<&Path>, contents: &[u8]) -> Result<()> {
    match output_path {
        Some(path) => write_file_secure(path, contents)
            .map_err(|e| e.with_context(format!("failed to write to {}", path.display()))),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(contents)
                .and_then(|()| stdout.flush())
                .map_err(|e| {
                    YopassError::with_kind_and_source(
                        ErrorCategory::Internal,
                        ErrorKind::Io,
                        "failed to write secret to stdout",
                        e,
                    )
                })
        }
    }
}

/// Write file with secure permissions (0o600 on Unix)
fn write_file_secure(path: &Path, contents: &[u8]) -> Result<()> {
    #[cfg(unix)]
    {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(|e| {
                YopassError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::Io,
                    format!("failed to open {}", path.display()),
                    e,
                )
            })?;

        file.write_all(contents).map_err(|e| {
            YopassError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to write {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        fs::write(path, contents).map_err(|e| {
            YopassError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("failed to write {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }
}

fn read_error(path: &Path, err: io::Error) -> YopassError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    YopassError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}

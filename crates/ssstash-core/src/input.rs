//! Secret value sources for `put`
//!
//! On the command line a value of exactly `-` means standard input, and a
//! value starting with `@` names a file to read. Anything else is taken
//! literally.

use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncReadExt};
use zeroize::Zeroizing;

/// Value that selects standard input
pub const STDIN_SENTINEL: &str = "-";

/// Leading character that marks a file path
pub const FILE_MARKER: char = '@';

/// Where the plaintext of a `put` comes from
#[derive(Clone, PartialEq, Eq)]
pub enum SecretInput {
    /// The bytes themselves
    Literal(Zeroizing<Vec<u8>>),
    /// A file read fully into memory
    File(PathBuf),
    /// Standard input read to end of stream
    Stdin,
}

impl SecretInput {
    /// Interpret a command-line value
    pub fn parse(value: &str) -> Self {
        if value == STDIN_SENTINEL {
            SecretInput::Stdin
        } else if let Some(path) = value.strip_prefix(FILE_MARKER) {
            SecretInput::File(PathBuf::from(path))
        } else {
            SecretInput::literal(value)
        }
    }

    /// Wrap literal bytes
    pub fn literal(bytes: impl Into<Vec<u8>>) -> Self {
        SecretInput::Literal(Zeroizing::new(bytes.into()))
    }

    /// Read the value, taking standard input from the process
    pub async fn read(self) -> Result<Zeroizing<Vec<u8>>> {
        self.read_with(tokio::io::stdin()).await
    }

    /// Read the value, taking standard input from `stdin`
    pub async fn read_with<R>(self, mut stdin: R) -> Result<Zeroizing<Vec<u8>>>
    where
        R: AsyncRead + Unpin,
    {
        match self {
            SecretInput::Literal(bytes) => Ok(bytes),
            SecretInput::File(path) => tokio::fs::read(&path)
                .await
                .map(Zeroizing::new)
                .map_err(|e| Error::input(path.display().to_string(), e)),
            SecretInput::Stdin => {
                let mut buffer = Zeroizing::new(Vec::new());
                stdin
                    .read_to_end(&mut buffer)
                    .await
                    .map_err(|e| Error::input("standard input", e))?;
                Ok(buffer)
            }
        }
    }
}

impl fmt::Debug for SecretInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretInput::Literal(bytes) => write!(f, "Literal([REDACTED {} bytes])", bytes.len()),
            SecretInput::File(path) => f.debug_tuple("File").field(path).finish(),
            SecretInput::Stdin => f.write_str("Stdin"),
        }
    }
}

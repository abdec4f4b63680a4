//! Credential resolution.
//!
//! The Google access token is taken as given (the OAuth dance itself is
//! outside this tool): a local token file is checked first, then the
//! environment. A missing token is a fatal setup error, unlike the
//! enhancer's API key whose absence merely disables enhancement.

use std::path::Path;
use std::{env, fs};

use crate::{Result, VernissageError};

/// Default token file, checked before the environment variable.
pub const TOKEN_FILE: &str = "google_token.txt";

const ENV_TOKEN: &str = "GOOGLE_ACCESS_TOKEN";

/// Resolves the Google API access token: local file first, environment
/// variable second.
pub fn resolve_google_token(token_file: &Path) -> Result<String> {
    if let Ok(contents) = fs::read_to_string(token_file) {
        let token = contents.trim();
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }

    if let Ok(token) = env::var(ENV_TOKEN) {
        let token = token.trim().to_string();
        if !token.is_empty() {
            return Ok(token);
        }
    }

    Err(VernissageError::MissingCredentials(format!(
        "no Google access token: provide {} or set {}",
        token_file.display(),
        ENV_TOKEN
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("token.txt");
        fs::write(&file, "  ya29.token  \n").unwrap();

        assert_eq!(resolve_google_token(&file).unwrap(), "ya29.token");
    }

    #[test]
    fn test_empty_file_does_not_count() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("token.txt");
        fs::write(&file, "   \n").unwrap();

        // With the file blank the env var decides; either way a blank file
        // alone never yields a token.
        if env::var("GOOGLE_ACCESS_TOKEN").is_err() {
            assert!(matches!(
                resolve_google_token(&file),
                Err(VernissageError::MissingCredentials(_))
            ));
        }
    }
}

//! Validation of user-supplied command-line values.
//!
//! Repository ids end up in log lines and error messages, and property names
//! and environment keys end up on the build tool's command line, so they are
//! checked before a request is built.

use anyhow::{bail, Result};

/// Maximum allowed length for repository ids.
pub const MAX_REPOSITORY_ID_LENGTH: usize = 256;

/// Validates a repository id such as `org.example:library`.
///
/// A repository id is valid if:
/// - It is not empty
/// - It is no longer than MAX_REPOSITORY_ID_LENGTH characters
/// - It contains only alphanumeric characters and `-`, `_`, `.`, `:`, `/`
///
/// # Examples
///
/// ```
/// use srcbuild::validation::validate_repository_id;
///
/// assert!(validate_repository_id("org.example:core").is_ok());
/// assert!(validate_repository_id("github.com/acme/lib").is_ok());
/// assert!(validate_repository_id("").is_err());
/// assert!(validate_repository_id("a b").is_err());
/// ```
pub fn validate_repository_id(id: &str) -> Result<()> {
    if id.is_empty() {
        bail!("Repository id cannot be empty");
    }

    if id.len() > MAX_REPOSITORY_ID_LENGTH {
        bail!(
            "Repository id too long: {} characters (max {})",
            id.len(),
            MAX_REPOSITORY_ID_LENGTH
        );
    }

    let valid_chars = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '/'));
    if !valid_chars {
        bail!("Repository id '{id}' contains invalid characters. Use only alphanumeric characters and - _ . : /");
    }

    Ok(())
}

/// Validates a build property or environment variable name.
///
/// Names must be non-empty and must not contain `=`, `,` or whitespace, since
/// they are joined into `key=value` tokens and comma-separated lists.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        bail!("Name cannot be empty");
    }

    if let Some(c) = key
        .chars()
        .find(|c| *c == '=' || *c == ',' || c.is_whitespace())
    {
        bail!("Name '{key}' contains invalid character {c:?}");
    }

    Ok(())
}

/// Clap value parser for repository ids.
///
/// ```ignore
/// #[arg(long, value_parser = clap_repository_id_validator)]
/// repo_id: String,
/// ```
pub fn clap_repository_id_validator(s: &str) -> Result<String, String> {
    validate_repository_id(s).map_err(|e| e.to_string())?;
    Ok(s.to_string())
}

/// Clap value parser for property names given on their own.
pub fn clap_key_validator(s: &str) -> Result<String, String> {
    validate_key(s).map_err(|e| e.to_string())?;
    Ok(s.to_string())
}

/// Clap value parser for `KEY=VALUE` pairs. The value may be empty and may
/// itself contain `=`.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected KEY=VALUE, got '{s}'"))?;
    validate_key(key).map_err(|e| e.to_string())?;
    Ok((key.to_string(), value.to_string()))
}

use anyhow::{anyhow, Result};
use std::path::Path;

/// Validation utilities for user-supplied selector values and paths
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a ticker symbol
    pub fn validate_symbol(symbol: &str) -> Result<()> {
        if symbol.trim().is_empty() {
            return Err(anyhow!("Symbol cannot be empty"));
        }

        if symbol.len() > 32 {
            return Err(anyhow!("Symbol too long (max 32 characters)"));
        }

        if symbol.chars().any(char::is_control) {
            return Err(anyhow!("Symbol contains invalid characters"));
        }

        Ok(())
    }

    /// Validate the cap applied to a sentiment bucket
    pub fn validate_bucket_limit(limit: usize) -> Result<()> {
        if limit == 0 {
            return Err(anyhow!("Bucket limit must be greater than 0"));
        }

        if limit > 100_000 {
            return Err(anyhow!("Bucket limit too large (max 100,000)"));
        }

        Ok(())
    }

    /// Validate file path
    pub fn validate_file_path(path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy();
        if path_str.trim().is_empty() {
            return Err(anyhow!("File path cannot be empty"));
        }

        if path_str.len() > 4096 {
            return Err(anyhow!("File path too long (max 4096 characters)"));
        }

        if path_str.contains('\0') {
            return Err(anyhow!("File path contains invalid characters"));
        }

        Ok(())
    }

    /// Validate the exported message table path
    pub fn validate_data_path(path: &Path) -> Result<()> {
        Self::validate_file_path(path)?;

        if !path.exists() {
            return Err(anyhow!("Data file does not exist: {path:?}"));
        }

        if !path.is_file() {
            return Err(anyhow!("Data path is not a file: {path:?}"));
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => {},
            _ => tracing::warn!("Data file {path:?} does not have a .csv extension"),
        }

        Ok(())
    }

    /// Sanitize text input
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect::<String>()
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_rules() {
        assert!(InputValidator::validate_symbol("AAPL").is_ok());
        assert!(InputValidator::validate_symbol("BTC.X").is_ok());
        assert!(InputValidator::validate_symbol("  ").is_err());
        assert!(InputValidator::validate_symbol("AA\nPL").is_err());
    }

    #[test]
    fn test_bucket_limit_rules() {
        assert!(InputValidator::validate_bucket_limit(20).is_ok());
        assert!(InputValidator::validate_bucket_limit(0).is_err());
    }
}

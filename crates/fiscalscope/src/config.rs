//! Configuration for loading, analysis and reporting.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::IQR_MULTIPLIER;
use crate::error::{Result, ScopeError};
use crate::input::ParserConfig;

/// Row limits applied when findings are rendered as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportLimits {
    /// Detail rows shown for a single rule.
    pub detail_rows: usize,
    /// Issuers/recipients listed in the offender ranking.
    pub top_offenders: usize,
    /// Issuers/recipients listed in the audit report.
    pub audit_offenders: usize,
}

impl Default for ReportLimits {
    fn default() -> Self {
        Self {
            detail_rows: 30,
            top_offenders: 10,
            audit_offenders: 5,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    pub parser: ParserConfig,
    /// Convert numeric-looking text columns before exploratory analysis.
    pub coerce_numeric: bool,
    /// IQR fence multiplier for outlier detection.
    pub iqr_multiplier: f64,
    /// Run the clustering backend, when one is compiled in.
    pub clustering: bool,
    pub limits: ReportLimits,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            coerce_numeric: true,
            iqr_multiplier: IQR_MULTIPLIER,
            clustering: true,
            limits: ReportLimits::default(),
        }
    }
}

impl ScopeConfig {
    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ScopeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loading configuration");
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.iqr_multiplier.is_finite() && self.iqr_multiplier > 0.0) {
            return Err(ScopeError::Config(format!(
                "iqr_multiplier must be a positive number, got {}",
                self.iqr_multiplier
            )));
        }
        if self.limits.detail_rows == 0 {
            return Err(ScopeError::Config("limits.detail_rows must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_limits(mut self, limits: ReportLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = multiplier;
        self
    }

    pub fn with_coerce_numeric(mut self, enabled: bool) -> Self {
        self.coerce_numeric = enabled;
        self
    }

    pub fn without_clustering(mut self) -> Self {
        self.clustering = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ScopeConfig::from_json(r#"{"limits": {"detail_rows": 10}, "clustering": false}"#).unwrap();
        assert_eq!(config.limits.detail_rows, 10);
        assert_eq!(config.limits.top_offenders, 10);
        assert!(!config.clustering);
        assert_eq!(config.iqr_multiplier, 1.5);
        assert!(config.parser.normalize);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ScopeConfig::from_json(r#"{"iqr_multiplier": -1.0}"#).unwrap_err();
        assert!(matches!(err, ScopeError::Config(_)));
        assert!(matches!(ScopeConfig::from_json("{"), Err(ScopeError::Json(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"coerce_numeric": false}}"#).unwrap();
        let config = ScopeConfig::load(file.path()).unwrap();
        assert!(!config.coerce_numeric);

        let missing = ScopeConfig::load("/nonexistent/fiscalscope.json");
        assert!(matches!(missing, Err(ScopeError::Io { .. })));
    }
}

//! # Configuration
//!
//! Tunables for coordinate resolution and annotation, read from YAML:
//!
//! ```yaml
//! chord-color: "#2563EB"
//! blend-factor: 0.4
//! font-size: 22
//! dedup-ratio: 0.01
//! row-band: 30
//! outlier-sigma: 3.0
//! outlier-min-count: 5
//! default-key: C
//! ```
//!
//! Every field is optional; an empty document gives [`TransposeConfig::default`].

use crate::coords::ResolverOptions;
use crate::error::TransposeError;
use crate::key::key_index;
use serde::Deserialize;

/// Raw configuration for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    chord_color: Option<String>,
    blend_factor: Option<f64>,
    font_size: Option<f64>,
    dedup_ratio: Option<f64>,
    row_band: Option<f64>,
    outlier_sigma: Option<f64>,
    outlier_min_count: Option<usize>,
    default_key: Option<String>,
}

/// Validated configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TransposeConfig {
    /// Base color for transposed labels, `#rrggbb`
    pub chord_color: String,
    /// How far the alternate color is blended toward white (0-1)
    pub blend_factor: f64,
    /// Fixed font size in pixels; derived from the image width when `None`
    pub font_size: Option<f64>,
    pub dedup_ratio: f64,
    pub row_band: f64,
    pub outlier_sigma: f64,
    pub outlier_min_count: usize,
    /// Original key when neither the caller nor the recognizer provides one
    pub default_key: String,
}

impl Default for TransposeConfig {
    fn default() -> Self {
        let resolver = ResolverOptions::default();
        Self {
            chord_color: "#2563EB".to_string(),
            blend_factor: 0.4,
            font_size: None,
            dedup_ratio: resolver.dedup_ratio,
            row_band: resolver.row_band,
            outlier_sigma: resolver.outlier_sigma,
            outlier_min_count: resolver.outlier_min_count,
            default_key: "C".to_string(),
        }
    }
}

impl TransposeConfig {
    /// Parse and validate a YAML document.
    ///
    /// ```
    /// use jianpu_transpose::TransposeConfig;
    ///
    /// let config = TransposeConfig::from_yaml("chord-color: \"#DC2626\"\nrow-band: 40")?;
    /// assert_eq!(config.chord_color, "#DC2626");
    /// assert_eq!(config.row_band, 40.0);
    /// assert_eq!(config.blend_factor, 0.4);
    ///
    /// assert!(TransposeConfig::from_yaml("blend-factor: 2").is_err());
    /// # Ok::<(), jianpu_transpose::TransposeError>(())
    /// ```
    pub fn from_yaml(content: &str) -> Result<Self, TransposeError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| TransposeError::Config(e.to_string()))?;
        let defaults = Self::default();

        let config = Self {
            chord_color: raw.chord_color.unwrap_or(defaults.chord_color),
            blend_factor: raw.blend_factor.unwrap_or(defaults.blend_factor),
            font_size: raw.font_size,
            dedup_ratio: raw.dedup_ratio.unwrap_or(defaults.dedup_ratio),
            row_band: raw.row_band.unwrap_or(defaults.row_band),
            outlier_sigma: raw.outlier_sigma.unwrap_or(defaults.outlier_sigma),
            outlier_min_count: raw.outlier_min_count.unwrap_or(defaults.outlier_min_count),
            default_key: raw.default_key.unwrap_or(defaults.default_key),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), TransposeError> {
        if !(0.0..=1.0).contains(&self.blend_factor) {
            return Err(TransposeError::Config(format!(
                "blend-factor must be between 0 and 1, got {}",
                self.blend_factor
            )));
        }
        if let Some(size) = self.font_size {
            if !(size.is_finite() && size > 0.0) {
                return Err(TransposeError::Config(format!(
                    "font-size must be positive, got {}",
                    size
                )));
            }
        }
        for (name, value) in [
            ("dedup-ratio", self.dedup_ratio),
            ("row-band", self.row_band),
            ("outlier-sigma", self.outlier_sigma),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(TransposeError::Config(format!(
                    "{} must not be negative, got {}",
                    name, value
                )));
            }
        }
        if key_index(&self.default_key).is_none() {
            return Err(TransposeError::Config(format!(
                "default-key is not a key: {}",
                self.default_key
            )));
        }
        Ok(())
    }

    /// Thresholds for [`crate::coords::resolve_positions`]
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            dedup_ratio: self.dedup_ratio,
            row_band: self.row_band,
            outlier_sigma: self.outlier_sigma,
            outlier_min_count: self.outlier_min_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(TransposeConfig::from_yaml("").unwrap(), TransposeConfig::default());
        assert_eq!(TransposeConfig::from_yaml("  \n").unwrap(), TransposeConfig::default());
        assert_eq!(TransposeConfig::from_yaml("{}").unwrap(), TransposeConfig::default());
    }

    #[test]
    fn test_full_document() {
        let config = TransposeConfig::from_yaml(
            "chord-color: \"#000000\"\n\
             blend-factor: 0.5\n\
             font-size: 22\n\
             dedup-ratio: 0.02\n\
             row-band: 12.5\n\
             outlier-sigma: 2\n\
             outlier-min-count: 8\n\
             default-key: Bb\n",
        )
        .unwrap();
        assert_eq!(config.chord_color, "#000000");
        assert_eq!(config.blend_factor, 0.5);
        assert_eq!(config.font_size, Some(22.0));
        assert_eq!(config.default_key, "Bb");
        assert_eq!(
            config.resolver_options(),
            ResolverOptions {
                dedup_ratio: 0.02,
                row_band: 12.5,
                outlier_sigma: 2.0,
                outlier_min_count: 8,
            }
        );
    }

    #[test]
    fn test_validation_errors() {
        for yaml in [
            "blend-factor: -0.1",
            "font-size: 0",
            "row-band: -1",
            "dedup-ratio: -0.5",
            "default-key: H",
        ] {
            assert!(
                matches!(TransposeConfig::from_yaml(yaml), Err(TransposeError::Config(_))),
                "{} should be rejected",
                yaml
            );
        }
    }

    #[test]
    fn test_unknown_and_malformed_fields() {
        assert!(TransposeConfig::from_yaml("chord-colour: red").is_err());
        assert!(TransposeConfig::from_yaml("row-band: wide").is_err());
    }

    #[test]
    fn test_default_resolver_options() {
        assert_eq!(
            TransposeConfig::default().resolver_options(),
            ResolverOptions::default()
        );
    }
}

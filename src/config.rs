// src/config.rs - Tracing parameters with TOML load/save support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{Result, TraceError};

/// Configuration for one tracing run.
///
/// Plain data with serde defaults, so a partial TOML file (or an empty one)
/// fills in the documented defaults.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TraceConfig {
    /// Tile width in pixels for the boundary scan
    #[serde(default = "default_x_inc")]
    pub x_inc: u32,

    /// Tile height in pixels for the boundary scan
    #[serde(default = "default_y_inc")]
    pub y_inc: u32,

    /// Multiplier from pixel coordinates to output coordinates
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Collapse near-collinear boundary runs within this tolerance before
    /// curve fitting. Disabled when absent.
    #[serde(default)]
    pub straighten: Option<f64>,

    /// Fit cubic Bezier curves to the boundary. When false the traced
    /// boundary is emitted as straight line segments only.
    #[serde(default = "default_smooth")]
    pub smooth: bool,

    /// Curve fitting and simplex search parameters
    #[serde(default)]
    pub fit: FitConfig,
}

fn default_x_inc() -> u32 {
    10
}

fn default_y_inc() -> u32 {
    10
}

fn default_scale() -> f64 {
    1.0
}

fn default_smooth() -> bool {
    true
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            x_inc: default_x_inc(),
            y_inc: default_y_inc(),
            scale: default_scale(),
            straighten: None,
            smooth: default_smooth(),
            fit: FitConfig::default(),
        }
    }
}

/// Parameters of the Nelder-Mead control-point search and its objective.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FitConfig {
    /// Simplex expansion coefficient
    #[serde(default = "default_chi")]
    pub chi: f64,

    /// Perturbation used to build the initial simplex around the seed
    #[serde(default = "default_delta")]
    pub delta: f64,

    /// Simplex contraction coefficient
    #[serde(default = "default_gamma")]
    pub gamma: f64,

    /// Simplex reflection coefficient
    #[serde(default = "default_rho")]
    pub rho: f64,

    /// Simplex shrink coefficient
    #[serde(default = "default_sigma")]
    pub sigma: f64,

    /// Iteration cap per simplex search
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Relative spread of objective values below which the search converges
    #[serde(default = "default_tol_fun")]
    pub tol_fun: f64,

    /// Per-parameter spread below which the search converges
    #[serde(default = "default_tol_x")]
    pub tol_x: f64,

    /// Chord tolerance when flattening a candidate curve for error measurement
    #[serde(default = "default_flatness")]
    pub flatness: f64,
}

fn default_chi() -> f64 {
    2.0
}

fn default_delta() -> f64 {
    0.01
}

fn default_gamma() -> f64 {
    0.5
}

fn default_rho() -> f64 {
    1.0
}

fn default_sigma() -> f64 {
    0.5
}

fn default_max_iterations() -> u32 {
    200
}

fn default_tol_fun() -> f64 {
    1e-6
}

fn default_tol_x() -> f64 {
    1e-6
}

fn default_flatness() -> f64 {
    1.0
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            chi: default_chi(),
            delta: default_delta(),
            gamma: default_gamma(),
            rho: default_rho(),
            sigma: default_sigma(),
            max_iterations: default_max_iterations(),
            tol_fun: default_tol_fun(),
            tol_x: default_tol_x(),
            flatness: default_flatness(),
        }
    }
}

impl TraceConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TraceError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: TraceConfig = toml::from_str(&content).map_err(|e| {
            TraceError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TraceError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content).map_err(TraceError::Io)?;

        Ok(())
    }

    /// Validate configuration before any work starts
    pub fn validate(&self) -> Result<()> {
        // Tile increments drive the scan loops and the grouping threshold
        if self.x_inc == 0 {
            return Err(TraceError::InvalidArgument(
                "x_inc must be > 0".to_string(),
            ));
        }

        if self.y_inc == 0 {
            return Err(TraceError::InvalidArgument(
                "y_inc must be > 0".to_string(),
            ));
        }

        if !(self.scale > 0.0) || !self.scale.is_finite() {
            return Err(TraceError::InvalidArgument(
                "scale must be positive and finite".to_string(),
            ));
        }

        if let Some(tolerance) = self.straighten {
            if !(tolerance >= 0.0) || !tolerance.is_finite() {
                return Err(TraceError::InvalidArgument(
                    "straighten tolerance must be >= 0 and finite".to_string(),
                ));
            }
        }

        self.fit.validate()
    }
}

impl FitConfig {
    /// Validate fitting parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(TraceError::InvalidArgument(
                "max_iterations must be > 0".to_string(),
            ));
        }

        if !(self.flatness > 0.0) || !self.flatness.is_finite() {
            return Err(TraceError::InvalidArgument(
                "flatness must be positive and finite".to_string(),
            ));
        }

        if !(self.tol_fun > 0.0) || !self.tol_fun.is_finite() {
            return Err(TraceError::InvalidArgument(
                "tol_fun must be positive and finite".to_string(),
            ));
        }

        if !(self.tol_x > 0.0) || !self.tol_x.is_finite() {
            return Err(TraceError::InvalidArgument(
                "tol_x must be positive and finite".to_string(),
            ));
        }

        if !self.delta.is_finite() || self.delta == 0.0 {
            return Err(TraceError::InvalidArgument(
                "delta must be non-zero and finite".to_string(),
            ));
        }

        // Simplex move coefficients
        for (name, value) in [
            ("chi", self.chi),
            ("gamma", self.gamma),
            ("rho", self.rho),
            ("sigma", self.sigma),
        ] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(TraceError::InvalidArgument(format!(
                    "{} must be positive and finite",
                    name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn defaults_match_documented_values() {
        let config = TraceConfig::default();
        assert_eq!(config.x_inc, 10);
        assert_eq!(config.y_inc, 10);
        assert_approx_eq!(config.scale, 1.0);
        assert_eq!(config.straighten, None);
        assert!(config.smooth);

        let fit = config.fit;
        assert_approx_eq!(fit.chi, 2.0);
        assert_approx_eq!(fit.delta, 0.01);
        assert_approx_eq!(fit.gamma, 0.5);
        assert_approx_eq!(fit.rho, 1.0);
        assert_approx_eq!(fit.sigma, 0.5);
        assert_eq!(fit.max_iterations, 200);
        assert_approx_eq!(fit.tol_fun, 1e-6);
        assert_approx_eq!(fit.tol_x, 1e-6);
        assert_approx_eq!(fit.flatness, 1.0);
    }

    #[test]
    fn default_config_validates() {
        assert!(TraceConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_increments_are_rejected() {
        let mut config = TraceConfig::default();
        config.x_inc = 0;
        assert!(matches!(
            config.validate(),
            Err(TraceError::InvalidArgument(_))
        ));

        let mut config = TraceConfig::default();
        config.y_inc = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_straighten_tolerance_is_rejected() {
        let mut config = TraceConfig::default();
        config.straighten = Some(-0.5);
        assert!(config.validate().is_err());

        config.straighten = Some(f64::NAN);
        assert!(config.validate().is_err());

        config.straighten = Some(0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_fit_parameters_are_rejected() {
        let mut config = TraceConfig::default();
        config.fit.max_iterations = 0;
        assert!(config.validate().is_err());

        let mut config = TraceConfig::default();
        config.fit.flatness = 0.0;
        assert!(config.validate().is_err());

        let mut config = TraceConfig::default();
        config.fit.delta = 0.0;
        assert!(config.validate().is_err());

        let mut config = TraceConfig::default();
        config.fit.sigma = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_round_trip_preserves_values() {
        let mut config = TraceConfig::default();
        config.x_inc = 4;
        config.straighten = Some(0.75);
        config.smooth = false;
        config.fit.max_iterations = 50;

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: TraceConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let parsed: TraceConfig = toml::from_str("").unwrap();
        assert_eq!(parsed, TraceConfig::default());
    }
}

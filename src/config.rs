use serde::Deserialize;
use std::path::Path;

use crate::association::helmet::{
    DEFAULT_ASSOCIATION_RADIUS, DEFAULT_GUARD_RADIUS, DEFAULT_PLACEHOLDER_CONFIDENCE,
};
use crate::association::{ConfidenceMode, Roles};
use crate::error::{Error, Result};
use crate::evaluation::{MatchStrategy, DEFAULT_IOU_THRESHOLD};

pub const CONFIG_ENV: &str = "VIOLATION_CONFIG";
pub const ASSOCIATION_RADIUS_ENV: &str = "VIOLATION_ASSOCIATION_RADIUS";
pub const GUARD_RADIUS_ENV: &str = "VIOLATION_GUARD_RADIUS";
pub const IOU_THRESHOLD_ENV: &str = "VIOLATION_IOU_THRESHOLD";

const DEFAULT_VEHICLE_CLASSES: [&str; 4] = ["car", "motorcycle", "bus", "truck"];

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    association: Option<AssociationConfigFile>,
    roles: Option<Roles>,
    evaluation: Option<EvaluationConfigFile>,
    report: Option<ReportConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct AssociationConfigFile {
    association_radius: Option<f32>,
    guard_radius: Option<f32>,
    confidence_mode: Option<ConfidenceMode>,
    placeholder_confidence: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct EvaluationConfigFile {
    iou_threshold: Option<f32>,
    strategy: Option<MatchStrategy>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ReportConfigFile {
    vehicle_classes: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssociationSettings {
    pub association_radius: f32,
    pub guard_radius: f32,
    pub confidence_mode: ConfidenceMode,
    pub placeholder_confidence: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSettings {
    pub iou_threshold: f32,
    pub strategy: MatchStrategy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    pub vehicle_classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub association: AssociationSettings,
    pub roles: Roles,
    pub evaluation: EvaluationSettings,
    pub report: ReportSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(ConfigFile::default())
    }
}

impl Config {
    /// Loads the file named by `VIOLATION_CONFIG` (if set), then applies
    /// environment overrides and validates the result.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(CONFIG_ENV).ok() {
            Some(path) if !path.trim().is_empty() => Self::from_file(read_config_file(Path::new(&path))?),
            _ => Self::default(),
        };
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Loads `path`, then applies environment overrides and validates.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut cfg = Self::from_file(read_config_file(path)?);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg = Self::from_file(toml::from_str(raw)?);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ConfigFile) -> Self {
        let association = file.association.unwrap_or_default();
        let evaluation = file.evaluation.unwrap_or_default();

        Self {
            association: AssociationSettings {
                association_radius: association
                    .association_radius
                    .unwrap_or(DEFAULT_ASSOCIATION_RADIUS),
                guard_radius: association.guard_radius.unwrap_or(DEFAULT_GUARD_RADIUS),
                confidence_mode: association.confidence_mode.unwrap_or_default(),
                placeholder_confidence: association
                    .placeholder_confidence
                    .unwrap_or(DEFAULT_PLACEHOLDER_CONFIDENCE),
            },
            roles: file.roles.unwrap_or_default(),
            evaluation: EvaluationSettings {
                iou_threshold: evaluation.iou_threshold.unwrap_or(DEFAULT_IOU_THRESHOLD),
                strategy: evaluation.strategy.unwrap_or_default(),
            },
            report: ReportSettings {
                vehicle_classes: file
                    .report
                    .and_then(|report| report.vehicle_classes)
                    .unwrap_or_else(|| DEFAULT_VEHICLE_CLASSES.iter().map(|c| c.to_string()).collect()),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(radius) = env_f32(ASSOCIATION_RADIUS_ENV)? {
            self.association.association_radius = radius;
        }
        if let Some(radius) = env_f32(GUARD_RADIUS_ENV)? {
            self.association.guard_radius = radius;
        }
        if let Some(threshold) = env_f32(IOU_THRESHOLD_ENV)? {
            self.evaluation.iou_threshold = threshold;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (name, radius) in [
            ("association_radius", self.association.association_radius),
            ("guard_radius", self.association.guard_radius),
        ]
        .iter()
        {
            if !radius.is_finite() || *radius <= 0.0 {
                return Err(Error::Config(format!("{} must be a positive number, got {}", name, radius)));
            }
        }

        let threshold = self.evaluation.iou_threshold;
        if !threshold.is_finite() || threshold <= 0.0 || threshold > 1.0 {
            return Err(Error::Config(format!("iou_threshold must be in (0, 1], got {}", threshold)));
        }

        let placeholder = self.association.placeholder_confidence;
        if !(0.0..=1.0).contains(&placeholder) {
            return Err(Error::Config(format!(
                "placeholder_confidence must be in [0, 1], got {}",
                placeholder
            )));
        }

        for (name, label) in [
            ("rider_candidate", &self.roles.rider_candidate),
            ("subject", &self.roles.subject),
            ("guard", &self.roles.guard),
        ]
        .iter()
        {
            if label.trim().is_empty() {
                return Err(Error::Config(format!("role '{}' must name a class", name)));
            }
        }

        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read config file {}: {}", path.display(), e)))?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| Error::Config(format!("invalid config file {}: {}", path.display(), e)))?;
    Ok(cfg)
}

fn env_f32(key: &str) -> Result<Option<f32>> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} must be a number", key))),
        _ => Ok(None),
    }
}

/// Run configuration loaded from `wq_plots.toml`.
///
/// Every field has a default, so an absent file reproduces the standard
/// three-plot run against `Colorado WQ.xlsx`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::columns::{CONDUCTIVITY, ELEVATION, PH, TEMPERATURE};
use crate::logging::LogLevel;
use crate::model::{COL_WATERSHED, WqError};
use crate::plot::{DEFAULT_DPI, PlotOptions};

pub const DEFAULT_CONFIG_PATH: &str = "./wq_plots.toml";

/// Confidence setting as written in TOML: `ci = 95` or `ci = false`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CiSetting {
    Enabled(bool),
    Level(f64),
}

impl CiSetting {
    /// Confidence level in percent, or `None` when the band is disabled.
    pub fn level(self) -> Option<f64> {
        match self {
            CiSetting::Enabled(true) => Some(95.0),
            CiSetting::Enabled(false) => None,
            CiSetting::Level(level) if level > 0.0 && level < 100.0 => Some(level),
            CiSetting::Level(_) => None,
        }
    }
}

impl Default for CiSetting {
    fn default() -> Self {
        CiSetting::Level(95.0)
    }
}

fn default_group_by() -> String {
    COL_WATERSHED.to_string()
}

fn default_true() -> bool {
    true
}

/// One figure to produce.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlotConfig {
    pub x: String,
    pub y: String,
    #[serde(default)]
    pub focus: Option<String>,
    #[serde(default = "default_group_by")]
    pub group_by: String,
    #[serde(default = "default_true")]
    pub per_group: bool,
    #[serde(default)]
    pub ci: CiSetting,
    #[serde(default)]
    pub ph_axis: bool,
    /// File name of the PNG, relative to `output_dir`.
    #[serde(default)]
    pub output: Option<String>,
}

impl PlotConfig {
    fn new(x: &str, y: &str, output: &str) -> Self {
        Self {
            x: x.to_string(),
            y: y.to_string(),
            focus: None,
            group_by: default_group_by(),
            per_group: true,
            ci: CiSetting::default(),
            ph_axis: false,
            output: Some(output.to_string()),
        }
    }

    /// Resolves this entry into plotter options, placing the output file
    /// under `output_dir`.
    pub fn to_options(&self, output_dir: &Path, dpi: u32) -> PlotOptions {
        PlotOptions {
            focus: self.focus.clone(),
            group_by: self.group_by.clone(),
            per_group: self.per_group,
            ci: self.ci.level(),
            ph_axis: self.ph_axis,
            output: self.output.as_ref().map(|name| output_dir.join(name)),
            dpi,
        }
    }
}

fn default_plots() -> Vec<PlotConfig> {
    let mut ph = PlotConfig::new(PH, ELEVATION, "pH_vs_Elevation.png");
    ph.ph_axis = true;

    let mut conductivity = PlotConfig::new(CONDUCTIVITY, ELEVATION, "Conductivity_vs_Elevation.png");
    conductivity.ci = CiSetting::Enabled(false);

    let temperature = PlotConfig::new(TEMPERATURE, ELEVATION, "Temp_vs_Elevation.png");

    vec![ph, conductivity, temperature]
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub input: PathBuf,
    pub sheet: String,
    pub cache_csv: PathBuf,
    pub output_dir: PathBuf,
    pub dpi: u32,
    pub log_level: String,
    pub log_file: Option<String>,
    pub console_timestamps: bool,
    pub plots: Vec<PlotConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("Colorado WQ.xlsx"),
            sheet: "Field Data".to_string(),
            cache_csv: PathBuf::from("FieldData.csv"),
            output_dir: PathBuf::from("."),
            dpi: DEFAULT_DPI,
            log_level: "info".to_string(),
            log_file: None,
            console_timestamps: false,
            plots: default_plots(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, WqError> {
        let config: AnalysisConfig =
            toml::from_str(contents).map_err(|e| WqError::Config(e.to_string()))?;
        config.level()?;
        if config.dpi == 0 {
            return Err(WqError::Config("dpi must be positive".to_string()));
        }
        Ok(config)
    }

    /// Load a config file; a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, WqError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn level(&self) -> Result<LogLevel, WqError> {
        self.log_level.parse()
    }
}

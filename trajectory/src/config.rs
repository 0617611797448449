use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::assemble::AxisConvention;
use crate::error::{TrajectoryError, TrajectoryResult};
use crate::normalize::NormalizerConfig;

/// fraction of an adc dwell time by which the readout samples are shifted
pub const ADC_SHIFT_DEFAULT:f64 = 0.5;
/// gradient samples describe the center of their raster interval, one raster later than their index
pub const GRADIENT_SHIFT_DEFAULT:f64 = 1.0;

pub trait ConfigFile: Sized {
    fn to_file(&self,file_path:&Path) -> TrajectoryResult<()>;
    fn from_file(file_path:&Path) -> TrajectoryResult<Self>;
    fn file_ext() -> String;
}

/// settings shared by every trajectory conversion, stored as toml
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    pub adc_shift:f64,
    pub gradient_shift:f64,
    /// unset: simulation axes for continuous trajectories, scanner axes when sampling at adcs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axes:Option<AxisConvention>,
    pub normalizer:NormalizerConfig,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            adc_shift:ADC_SHIFT_DEFAULT,
            gradient_shift:GRADIENT_SHIFT_DEFAULT,
            axes:None,
            normalizer:NormalizerConfig::default(),
        }
    }
}

fn with_ext(file_path:&Path,ext:&str) -> PathBuf {
    match file_path.extension() {
        Some(_) => file_path.to_owned(),
        None => file_path.with_extension(ext),
    }
}

impl ConfigFile for TrajectoryConfig {

    fn to_file(&self,file_path:&Path) -> TrajectoryResult<()> {
        let path = with_ext(file_path,&Self::file_ext());
        let t = toml::to_string_pretty(self)?;
        utils::write_atomic(&path,t.as_bytes()).map_err(|e| TrajectoryError::ConfigIo{path:path.clone(),source:e})?;
        info!("wrote config to {:?}",path);
        Ok(())
    }

    fn from_file(file_path:&Path) -> TrajectoryResult<Self> {
        let path = with_ext(file_path,&Self::file_ext());
        let t = std::fs::read_to_string(&path).map_err(|e| TrajectoryError::ConfigIo{path:path.clone(),source:e})?;
        let cfg:Self = toml::from_str(&t).map_err(|e| TrajectoryError::ConfigParse{path:path.clone(),source:e})?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn file_ext() -> String {
        String::from("toml")
    }

}

impl TrajectoryConfig {
    pub fn continuous_axes(&self) -> AxisConvention {
        self.axes.unwrap_or(AxisConvention::Simulation)
    }

    pub fn adc_axes(&self) -> AxisConvention {
        self.axes.unwrap_or(AxisConvention::Scanner)
    }

    pub fn validate(&self) -> TrajectoryResult<()> {
        if !self.adc_shift.is_finite() || !self.gradient_shift.is_finite() {
            return Err(TrajectoryError::Value(format!("shifts must be finite, got adc {} gradient {}",self.adc_shift,self.gradient_shift)));
        }
        self.normalizer.validate()
    }
}

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::{TrajectoryError, TrajectoryResult};

/// gradient unit of the simulation output (mT/m) in T/m
pub const GX_UNIT:f64 = 1E-3;
/// gradient raster time (1 µs) in s
pub const DT_UNIT:f64 = 1E-6;
/// proton gyromagnetic ratio in Hz/T
pub const GAMMA_PROTON:f64 = 42.58E6;

/// Nuclide whose gyromagnetic ratio converts gradient moments to k-space
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nuclide {
    #[default]
    Proton,
    Carbon13,
    Fluorine19,
    Sodium23,
    Phosphorus31,
}

impl Nuclide {
    /// gyromagnetic ratio over 2 pi, in Hz/T
    pub fn gamma(&self) -> f64 {
        match self {
            Nuclide::Proton => GAMMA_PROTON,
            Nuclide::Carbon13 => 10.7084E6,
            Nuclide::Fluorine19 => 40.078E6,
            Nuclide::Sodium23 => 11.262E6,
            Nuclide::Phosphorus31 => 17.235E6,
        }
    }
}

impl FromStr for Nuclide {
    type Err = String;

    fn from_str(s:&str) -> Result<Self,Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "proton" | "h1" | "1h" => Ok(Nuclide::Proton),
            "carbon13" | "c13" | "13c" => Ok(Nuclide::Carbon13),
            "fluorine19" | "f19" | "19f" => Ok(Nuclide::Fluorine19),
            "sodium23" | "na23" | "23na" => Ok(Nuclide::Sodium23),
            "phosphorus31" | "p31" | "31p" => Ok(Nuclide::Phosphorus31),
            other => Err(format!("unknown nuclide {}",other)),
        }
    }
}

impl fmt::Display for Nuclide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Nuclide::Proton => "proton",
            Nuclide::Carbon13 => "carbon13",
            Nuclide::Fluorine19 => "fluorine19",
            Nuclide::Sodium23 => "sodium23",
            Nuclide::Phosphorus31 => "phosphorus31",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// T/m per gradient unit
    pub gradient_unit:f64,
    /// s per time unit
    pub raster_time:f64,
    pub nuclide:Nuclide,
    /// explicit gyromagnetic ratio in Hz/T, takes precedence over nuclide
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gamma:Option<f64>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            gradient_unit:GX_UNIT,
            raster_time:DT_UNIT,
            nuclide:Nuclide::Proton,
            gamma:None,
        }
    }
}

fn positive(name:&str,x:f64) -> TrajectoryResult<f64> {
    match x.is_finite() && x > 0.0 {
        true => Ok(x),
        false => Err(TrajectoryError::Value(format!("{} must be a positive number, got {}",name,x))),
    }
}

impl NormalizerConfig {
    pub fn gamma(&self) -> f64 {
        self.gamma.unwrap_or_else(|| self.nuclide.gamma())
    }

    pub fn validate(&self) -> TrajectoryResult<()> {
        positive("gradient unit",self.gradient_unit)?;
        positive("raster time",self.raster_time)?;
        positive("gamma",self.gamma())?;
        Ok(())
    }
}

/// Factor converting gradient moments (gradient units x raster times) into k-space units of 1/FOV.
///
/// k [1/m] = gamma * sum(G) * dt, and one k-space unit of a trajectory normalized to the field of
/// view is 1/FOV, so the factor is gradient_unit * raster_time * gamma * fov.
pub fn normalizer(fov:f64,config:&NormalizerConfig) -> TrajectoryResult<f64> {
    let fov = positive("field of view",fov)?;
    config.validate()?;
    Ok(config.gradient_unit*config.raster_time*config.gamma()*fov)
}

//! k-space trajectories from simulated gradient waveforms.
//!
//! k-space position is the time integral of the gradient. Two flavours are provided:
//! [`assemble::assemble`] integrates the full waveforms sample by sample, and
//! [`adc::adc_trajectory`] samples the integral at the ADC sample times found in the INF event blocks.

pub mod adc;
pub mod assemble;
pub mod config;
pub mod error;
pub mod normalize;

pub use crate::adc::{adc_trajectory, AdcOptions, AdcTrajectory};
pub use crate::assemble::{assemble, AssemblyOptions, AxisConvention, Trajectory};
pub use crate::config::{ConfigFile, TrajectoryConfig};
pub use crate::error::{TrajectoryError, TrajectoryResult};
pub use crate::normalize::{normalizer, NormalizerConfig, Nuclide};

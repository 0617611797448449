//! Readers for Siemens sequence simulation output: `.dsv` waveform files and the `_INF.dsv` event timing file.

pub mod dsv;
pub mod inf;
pub mod error;

pub use crate::dsv::{read_dsv, DsvFile, SampleSequence, TimeUnit};
pub use crate::error::{DsvError, DsvResult};
pub use crate::inf::{Adc, EventBlock, RfPulse};

pub mod cfl;
pub mod txt;
pub mod error;

pub use crate::error::{MrDataError, MrDataResult};

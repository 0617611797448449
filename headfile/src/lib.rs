pub mod headfile;
pub mod value;
pub mod json;
pub mod error;

pub use crate::error::HeadfileError;
pub use crate::headfile::Headfile;
pub use crate::value::Value;

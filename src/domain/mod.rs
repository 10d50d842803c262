pub mod catalog;
pub mod error;
pub mod gauge;
pub mod types;

pub use error::{FormatError, ProxyError};
pub use types::*;

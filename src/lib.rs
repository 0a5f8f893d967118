pub mod dsss;
pub mod error;
pub mod sweep;
pub mod ui;
pub mod utils;

pub use error::{Result, SimError};

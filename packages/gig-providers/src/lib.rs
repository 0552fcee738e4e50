pub mod feed;
pub mod geocode;

mod error;

pub use error::{Error, Result};

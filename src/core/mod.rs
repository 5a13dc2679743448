pub mod assertions;
pub mod client;
pub mod endpoint;
pub mod poll;
pub mod report;
pub mod suite;

pub use crate::domain::ports::{Scenario, Storage};
pub use crate::utils::error::Result;

pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod fixtures;
pub mod scenarios;
pub mod services;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::storage::LocalStorage;
pub use config::SuiteConfig;
pub use crate::core::client::{ApiRequest, ApiResponse, ClientContext};
pub use crate::core::endpoint::{EndpointRegistry, ServiceKind};
pub use crate::core::suite::{ScenarioEnv, ScenarioResult, ScenarioSuite};
pub use utils::error::{E2eError, Result};

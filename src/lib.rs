pub mod config;
pub mod core;
pub mod manager;
pub mod providers;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use config::{ProviderConfig, Settings, VendorSettings};
pub use crate::core::error::{ConfigError, ProviderError, UnknownProvider};
pub use crate::core::traits::{Provider, ProviderFactory};
pub use crate::core::types::*;
pub use manager::ProviderManager;
pub use providers::BuiltinProviderFactory;

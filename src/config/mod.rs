//! Configuration module

mod settings;

pub use settings::{
    GatewayConfig, LoggingConfig, ProviderAuth, ProviderConfig, ProvidersConfig, Settings,
};

pub mod capabilities;
pub mod config;
pub mod error;
pub mod factories;
pub mod host;
pub mod integrations;
pub mod interfaces;
pub mod logging;
pub mod normalize;
pub mod plugins;
pub mod providers;
pub mod solana_rpc;
pub mod tools;
pub mod wallet;

pub type Result<T> = std::result::Result<T, error::CapabilityError>;

/// Build identifier reported by the host health endpoint.
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "+",
    env!("CAPABILITY_AGENT_GIT_SHA")
);

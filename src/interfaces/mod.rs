pub mod capabilities;
pub mod integrations;
pub mod plugins;
pub mod wallet;

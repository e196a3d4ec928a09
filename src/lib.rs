pub mod beacon;
pub mod clock;
pub mod config;
pub mod duties;
pub mod export;
pub mod metrics;
pub mod price;
pub mod proposer;
pub mod registry;
pub mod types;
pub mod watcher;

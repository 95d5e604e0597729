pub mod broker;
pub mod config;
pub mod error;
pub mod loader;
pub mod results;
pub mod runner;
pub mod shutdown;
pub mod sweeper;
pub mod worker;

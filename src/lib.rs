pub mod client;
pub mod commands;
pub mod config;
pub mod discord;
pub mod embed;
pub mod error;
pub mod model;
pub mod notifier;
pub mod shutdown;

#[cfg(test)]
mod testing;

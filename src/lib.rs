// bitflix - Movie catalog gateway and cached data-fetch client
// Author: kelexine (https://github.com/kelexine)

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod metrics;
pub mod models;
pub mod server;
pub mod upstream;
pub mod utils;

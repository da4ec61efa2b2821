#![forbid(unsafe_code)]

pub mod chapter;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod formats;
pub mod logging;
pub mod notify;
pub mod publish;
pub mod reconcile;
pub mod render;
pub mod server;
pub mod store;
pub mod update;

pub mod ai;
pub mod app;
pub mod client;
pub mod domain;
pub mod logger;
pub mod server;
pub mod services;
pub mod utils;

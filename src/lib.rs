pub mod app;
pub mod cli;
pub mod config;
pub mod gate;
pub mod logging;

pub mod config;
pub mod fflogs;
pub mod plugin;

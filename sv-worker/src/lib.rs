pub mod cache;
pub mod cli;
pub mod dropbox;
pub mod heroku;
pub mod load_config;
pub mod store;

pub use cli::{run, Cli, Commands};

pub mod cli;
pub mod console;
pub mod figma;
pub mod load_config;
pub mod openai;

pub use cli::{run, Cli, Commands};

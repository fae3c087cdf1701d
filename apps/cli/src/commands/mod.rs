//! 命令定义和实现

pub mod config;
pub mod run;

pub use config::ConfigCommand;
pub use run::RunArgs;

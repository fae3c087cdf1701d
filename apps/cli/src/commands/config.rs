//! 配置查看命令

use crate::config::{SliderConfig, resolve_path};
use anyhow::Result;
use clap::Subcommand;
use std::path::Path;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 打印生效的配置（TOML）
    Show,

    /// 打印配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(self, explicit: Option<&Path>) -> Result<()> {
        match self {
            ConfigCommand::Show => {
                let config = SliderConfig::load(explicit)?;
                print!("{}", config.to_toml()?);
            },
            ConfigCommand::Path => {
                let path = resolve_path(explicit)?;
                println!("{}", path.display());
            },
        }
        Ok(())
    }
}

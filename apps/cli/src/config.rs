//! CLI 配置
//!
//! 配置文件位于 `<config_dir>/slider/config.toml`，可用 `--config` 覆盖。
//! 所有字段都有默认值，部分填写的文件同样有效。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use slider_control::{CaptureTiming, ExternalCommandCamera, OutputMode};
use slider_driver::{DEFAULT_PORTS, PollConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 默认配置文件路径
pub fn default_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine config directory"))?;
    path.push("slider");
    path.push("config.toml");
    Ok(path)
}

/// 解析实际使用的配置文件路径
pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_path(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliderConfig {
    pub serial: SerialSection,
    pub motion: MotionSection,
    pub capture: CaptureSection,
}

impl SliderConfig {
    /// 加载配置
    ///
    /// 默认位置的文件不存在时使用内置默认值；显式指定的文件必须存在。
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = resolve_path(explicit)?;

        if !path.exists() {
            if explicit.is_some() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 校验取值范围
    pub fn validate(&self) -> Result<()> {
        if self.serial.response_window == 0 {
            anyhow::bail!("serial.response_window must be at least 1 byte");
        }
        if self.serial.baud_rate == 0 {
            anyhow::bail!("serial.baud_rate must be greater than 0");
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSection {
    /// 候选端口（按顺序探测）
    pub ports: Vec<String>,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    /// 单次应答窗口（字节）
    pub response_window: usize,
    /// 打开端口后等待控制器复位
    pub settle_ms: u64,
}

impl Default for SerialSection {
    fn default() -> Self {
        Self {
            ports: DEFAULT_PORTS.iter().map(|p| p.to_string()).collect(),
            baud_rate: 115_200,
            read_timeout_ms: 500,
            write_timeout_ms: 500,
            response_window: 100,
            settle_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSection {
    /// 默认进给速度（mm/min）
    pub feed_rate: u32,
    /// interval / macro 的进给速度（mm/min）
    pub capture_feed_rate: u32,
    pub wait_secs: u64,
    /// 等待 Idle 的总超时，不设置则一直等到被中断
    pub idle_timeout_secs: Option<u64>,
}

impl Default for MotionSection {
    fn default() -> Self {
        Self {
            feed_rate: 1000,
            capture_feed_rate: 500,
            wait_secs: 10,
            idle_timeout_secs: None,
        }
    }
}

impl MotionSection {
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::ZERO,
            timeout: self.idle_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// 外部拍摄程序的出图方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// 移动程序写出的固定文件
    Relocate,
    /// 通过 `{output}` 参数传入路径
    Argument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSection {
    pub output_dir: PathBuf,
    pub file_extension: String,
    pub pre_capture_wait_ms: u64,
    pub post_capture_wait_ms: u64,
    pub program: String,
    pub args: Vec<String>,
    pub output: OutputKind,
    /// `output = "relocate"` 时程序写出的文件
    pub relocate_file: PathBuf,
    /// 程序的工作目录，不设置则使用当前目录
    pub working_dir: Option<PathBuf>,
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("/home/pi/storage"),
            file_extension: ".jpg".to_string(),
            pre_capture_wait_ms: 2000,
            post_capture_wait_ms: 0,
            program: "gphoto2".to_string(),
            args: vec![
                "--capture-image-and-download".to_string(),
                "--force-overwrite".to_string(),
            ],
            output: OutputKind::Relocate,
            relocate_file: PathBuf::from("capt0000.jpg"),
            working_dir: None,
        }
    }
}

impl CaptureSection {
    pub fn timing(&self) -> CaptureTiming {
        CaptureTiming {
            pre: Duration::from_millis(self.pre_capture_wait_ms),
            post: Duration::from_millis(self.post_capture_wait_ms),
        }
    }

    pub fn camera(&self) -> ExternalCommandCamera {
        let output = match self.output {
            OutputKind::Relocate => OutputMode::Relocate {
                file: self.relocate_file.clone(),
            },
            OutputKind::Argument => OutputMode::Argument,
        };
        let camera = ExternalCommandCamera::new(self.program.clone(), self.args.clone(), output);
        match &self.working_dir {
            Some(dir) => camera.working_dir(dir),
            None => camera,
        }
    }
}

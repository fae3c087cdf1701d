//! 拍摄模式命令
//!
//! 执行顺序：校验参数 → 规划步序 → 打开串口 → 执行 → 释放。
//! 规划错误（快门数、堆栈数）在打开串口之前返回，不会触碰硬件。

use crate::config::SliderConfig;
use crate::validation::{validate_axis, validate_feed_rate, validate_name};
use anyhow::{Context, Result};
use clap::Args;
use slider_control::{
    CaptureCoordinator, ExecutionContext, ExecutorConfig, ExternalCommandCamera, FilenameAllocator,
    ModeExecutor, ModeRequest, RunSummary, SequencePlanner, ShootingMode,
};
use slider_driver::{CancelToken, LinkBuilder};
use slider_protocol::Position;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// 拍摄模式参数（所有模式共用）
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// X 轴位移（mm）
    #[arg(short = 'x', default_value_t = 0.0, allow_negative_numbers = true)]
    pub x: f64,

    /// Y 轴位移（mm）
    #[arg(short = 'y', default_value_t = 0.0, allow_negative_numbers = true)]
    pub y: f64,

    /// Z 轴位移（mm）
    #[arg(short = 'z', default_value_t = 0.0, allow_negative_numbers = true)]
    pub z: f64,

    /// 进给速度（mm/min），用于 video / bounce
    #[arg(short = 'f', long = "feedrate")]
    pub feed_rate: Option<u32>,

    /// 快门次数
    #[arg(short = 's', long)]
    pub shutter_count: Option<u32>,

    /// 焦点堆栈张数（macro）
    #[arg(long)]
    pub stack_count: Option<u32>,

    /// 输出目录
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// 输出目录下的子目录名
    #[arg(long)]
    pub name: Option<String>,

    /// 串口（替换配置中的候选列表）
    #[arg(long)]
    pub port: Option<String>,
}

impl RunArgs {
    fn validate(&self) -> Result<()> {
        validate_axis('x', self.x)?;
        validate_axis('y', self.y)?;
        validate_axis('z', self.z)?;
        if let Some(feed_rate) = self.feed_rate {
            validate_feed_rate(feed_rate)?;
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        Ok(())
    }

    /// move 始终使用配置的默认进给速度，`-f` 只作用于 video / bounce
    fn request(&self, mode: ShootingMode, config: &SliderConfig) -> ModeRequest {
        let feed_rate = match (mode, self.feed_rate) {
            (ShootingMode::Move, Some(_)) => {
                warn!("--feedrate is ignored in move mode, using {} mm/min", config.motion.feed_rate);
                config.motion.feed_rate
            },
            (_, feed_rate) => feed_rate.unwrap_or(config.motion.feed_rate),
        };
        let mut request = ModeRequest::new(Position::new(self.x, self.y, self.z))
            .feed_rate(feed_rate)
            .capture_feed_rate(config.motion.capture_feed_rate);
        if let Some(count) = self.shutter_count {
            request = request.shutter_count(count);
        }
        if let Some(count) = self.stack_count {
            request = request.stack_count(count);
        }
        request
    }

    /// `<output_dir>[/<name>]`
    fn capture_dir(&self, config: &SliderConfig) -> PathBuf {
        let base = self
            .output_dir
            .clone()
            .unwrap_or_else(|| config.capture.output_dir.clone());
        match &self.name {
            Some(name) => base.join(name),
            None => base,
        }
    }

    fn link_builder(&self, config: &SliderConfig, cancel: &CancelToken) -> LinkBuilder {
        let serial = &config.serial;
        let builder = LinkBuilder::new()
            .cancel(cancel.clone())
            .ports(serial.ports.iter().cloned())
            .baud_rate(serial.baud_rate)
            .read_timeout(Duration::from_millis(serial.read_timeout_ms))
            .write_timeout(Duration::from_millis(serial.write_timeout_ms))
            .response_window(serial.response_window)
            .settle(Duration::from_millis(serial.settle_ms));
        match &self.port {
            Some(port) => builder.port(port.clone()),
            None => builder,
        }
    }
}

/// 执行一个拍摄模式
pub fn execute(
    mode: ShootingMode,
    args: &RunArgs,
    config: &SliderConfig,
    cancel: CancelToken,
) -> Result<RunSummary> {
    args.validate()?;
    let plan = SequencePlanner::plan(mode, &args.request(mode, config))
        .with_context(|| format!("Invalid {} request", mode))?;

    let executor_config = ExecutorConfig {
        setup_feed_rate: config.motion.feed_rate,
        capture_dir: args.capture_dir(config),
        wait: Duration::from_secs(config.motion.wait_secs),
        poll: config.motion.poll_config(),
    };
    info!(
        "{} | {} steps planned, capture dir {}",
        mode,
        plan.step_count(),
        executor_config.capture_dir.display()
    );

    let link = args
        .link_builder(config, &cancel)
        .build()
        .context("Failed to connect to the slider controller")?;

    let capture = mode.captures().then(|| {
        CaptureCoordinator::new(
            config.capture.camera(),
            FilenameAllocator::new(&config.capture.file_extension),
            config.capture.timing(),
        )
    });

    let mut ctx: ExecutionContext<_, ExternalCommandCamera> =
        ExecutionContext::new(link, capture, cancel);
    let summary = ModeExecutor::new(executor_config).run(&mut ctx, mode, &plan)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slider_control::PlanError;

    fn args() -> RunArgs {
        RunArgs::default()
    }

    #[test]
    fn test_capture_dir() {
        let config = SliderConfig::default();
        let mut args = args();
        assert_eq!(args.capture_dir(&config), PathBuf::from("/home/pi/storage"));

        args.name = Some("sunset".to_string());
        assert_eq!(args.capture_dir(&config), PathBuf::from("/home/pi/storage/sunset"));

        args.output_dir = Some(PathBuf::from("/tmp/shots"));
        assert_eq!(args.capture_dir(&config), PathBuf::from("/tmp/shots/sunset"));
    }

    #[test]
    fn test_request_feed_rates() {
        let config = SliderConfig::default();
        let mut args = args();
        let request = args.request(ShootingMode::Video, &config);
        assert_eq!(request.feed_rate, 1000);
        assert_eq!(request.capture_feed_rate, 500);
        assert_eq!(request.shutter_count, None);

        args.feed_rate = Some(2000);
        args.shutter_count = Some(5);
        let request = args.request(ShootingMode::Bounce, &config);
        assert_eq!(request.feed_rate, 2000);
        assert_eq!(request.capture_feed_rate, 500);
        assert_eq!(request.shutter_count, Some(5));
    }

    #[test]
    fn test_move_keeps_default_feed_rate() {
        let mut config = SliderConfig::default();
        config.motion.feed_rate = 1200;
        let mut args = args();
        args.x = 4.0;
        args.feed_rate = Some(3000);

        let plan = SequencePlanner::plan(ShootingMode::Move, &args.request(ShootingMode::Move, &config)).unwrap();
        assert!(plan.steps().all(|s| s.feed_rate == Some(1200)));

        let plan = SequencePlanner::plan(ShootingMode::Video, &args.request(ShootingMode::Video, &config)).unwrap();
        assert!(plan.steps().all(|s| s.feed_rate == Some(3000)));
    }

    #[test]
    fn test_plan_error_before_connect() {
        let mut config = SliderConfig::default();
        config.serial.ports = vec!["/nonexistent/slider-port".to_string()];

        let err = execute(ShootingMode::Interval, &args(), &config, CancelToken::new()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<PlanError>(),
            Some(&PlanError::InvalidShutterCount(0))
        );
    }

    #[test]
    fn test_rejects_bad_name() {
        let mut args = args();
        args.name = Some("../escape".to_string());
        assert!(args.validate().is_err());
    }
}

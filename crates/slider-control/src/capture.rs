//! 拍摄协调
//!
//! [`CaptureCoordinator`] 把一次拍摄包装为：
//!
//! ```text
//! 前置延时 → 分配文件名 → 设备拍摄 → 校验输出文件存在 → 后置延时
//! ```
//!
//! 具体的出图方式由 [`CaptureDevice`] 实现决定。默认实现 [`ExternalCommandCamera`]
//! 调用外部拍摄程序（如 `gphoto2`），再把其固定名称的输出文件移动到分配的路径。

use crate::filename::{AllocationError, CaptureTarget, FilenameAllocator};
use slider_driver::CancelToken;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

/// 参数中代表输出路径的占位符（`OutputMode::Argument`）
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Filename allocation failed: {0}")]
    Allocation(#[from] AllocationError),

    #[error("Failed to run capture program '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Capture program '{program}' failed (exit status {status:?}): {stderr}")]
    CommandFailed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Captured image file missing: {}", .path.display())]
    MissingOutputFile { path: PathBuf },

    #[error("Cannot move {} to {}: {source}", .from.display(), .to.display())]
    Relocate {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Capture cancelled")]
    Cancelled,
}

/// 拍摄设备
pub trait CaptureDevice {
    /// 设备名（用于日志）
    fn name(&self) -> &str;

    /// 拍摄一张图像，写入 `output`
    fn capture(&mut self, output: &Path) -> Result<(), CaptureError>;

    /// 释放设备（幂等）
    fn close(&mut self) {}
}

impl<D: CaptureDevice + ?Sized> CaptureDevice for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn capture(&mut self, output: &Path) -> Result<(), CaptureError> {
        (**self).capture(output)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// 外部程序的出图方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// 程序把图像写到固定文件名（相对于工作目录），拍摄后移动到分配的路径
    Relocate { file: PathBuf },
    /// 参数中的 [`OUTPUT_PLACEHOLDER`] 被替换为分配的路径
    Argument,
}

/// 外部拍摄程序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommandCamera {
    program: String,
    args: Vec<String>,
    output: OutputMode,
    working_dir: Option<PathBuf>,
}

impl ExternalCommandCamera {
    pub fn new(program: impl Into<String>, args: Vec<String>, output: OutputMode) -> Self {
        Self {
            program: program.into(),
            args,
            output,
            working_dir: None,
        }
    }

    /// `gphoto2 --capture-image-and-download --force-overwrite`，输出 `capt0000.jpg`
    pub fn gphoto2() -> Self {
        Self::new(
            "gphoto2",
            vec![
                "--capture-image-and-download".to_string(),
                "--force-overwrite".to_string(),
            ],
            OutputMode::Relocate {
                file: PathBuf::from("capt0000.jpg"),
            },
        )
    }

    /// 程序的工作目录（默认为当前目录）
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn run(&self, args: &[String]) -> Result<(), CaptureError> {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        debug!("Running {} {:?}", self.program, args);
        let output = command.output().map_err(|source| CaptureError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(CaptureError::CommandFailed {
                program: self.program.clone(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn source_path(&self, file: &Path) -> PathBuf {
        match &self.working_dir {
            Some(dir) => dir.join(file),
            None => file.to_path_buf(),
        }
    }
}

impl CaptureDevice for ExternalCommandCamera {
    fn name(&self) -> &str {
        &self.program
    }

    fn capture(&mut self, output: &Path) -> Result<(), CaptureError> {
        match &self.output {
            OutputMode::Argument => {
                let output = output.to_string_lossy();
                let args: Vec<String> = self
                    .args
                    .iter()
                    .map(|arg| arg.replace(OUTPUT_PLACEHOLDER, &output))
                    .collect();
                self.run(&args)
            },
            OutputMode::Relocate { file } => {
                self.run(&self.args)?;

                let source = self.source_path(file);
                if !source.exists() {
                    return Err(CaptureError::MissingOutputFile { path: source });
                }
                relocate(&source, output)
            },
        }
    }
}

/// 移动文件：优先 rename，跨文件系统时退化为复制后删除
fn relocate(from: &Path, to: &Path) -> Result<(), CaptureError> {
    let wrap = |source| CaptureError::Relocate {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    fs::copy(from, to).map_err(wrap)?;
    if let Err(e) = fs::remove_file(from) {
        warn!("Copied {} but could not remove it: {}", from.display(), e);
    }
    Ok(())
}

/// 拍摄前后延时
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTiming {
    /// 运动停止后到触发之间的等待（消除振动）
    pub pre: Duration,
    pub post: Duration,
}

impl Default for CaptureTiming {
    fn default() -> Self {
        Self {
            pre: Duration::from_millis(2000),
            post: Duration::ZERO,
        }
    }
}

impl CaptureTiming {
    pub const ZERO: CaptureTiming = CaptureTiming {
        pre: Duration::ZERO,
        post: Duration::ZERO,
    };
}

/// 拍摄协调器（持有相机设备）
pub struct CaptureCoordinator<D: CaptureDevice> {
    device: D,
    allocator: FilenameAllocator,
    timing: CaptureTiming,
}

impl<D: CaptureDevice> CaptureCoordinator<D> {
    pub fn new(device: D, allocator: FilenameAllocator, timing: CaptureTiming) -> Self {
        Self {
            device,
            allocator,
            timing,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// 在 `directory` 中拍摄一张图像
    ///
    /// 文件名在触发前一刻分配（非原子，外部写入者的竞争可以接受）。
    ///
    /// # 错误
    /// 任何错误都会中止整个运行，不重试。
    pub fn capture(
        &mut self,
        directory: &Path,
        cancel: &CancelToken,
    ) -> Result<CaptureTarget, CaptureError> {
        cancel.sleep(self.timing.pre).map_err(|_| CaptureError::Cancelled)?;

        let target = self.allocator.allocate(directory)?;
        let path = target.path();

        if let Err(e) = self.device.capture(&path) {
            // Ctrl+C 同时发给了子进程，它的失败归为取消
            if cancel.is_cancelled() {
                warn!("Capture with '{}' interrupted: {}", self.device.name(), e);
                return Err(CaptureError::Cancelled);
            }
            error!("Capture with '{}' failed: {}", self.device.name(), e);
            return Err(e);
        }
        if !path.exists() {
            error!("Captured image file missing: {}", path.display());
            return Err(CaptureError::MissingOutputFile { path });
        }
        debug!("Captured {}", path.display());

        cancel.sleep(self.timing.post).map_err(|_| CaptureError::Cancelled)?;
        Ok(target)
    }

    pub fn close(&mut self) {
        self.device.close();
    }
}

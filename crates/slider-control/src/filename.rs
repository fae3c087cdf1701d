//! 顺序文件名分配

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 候选文件名数量（`0000` 到 `9999`）
pub const MAX_CANDIDATES: u32 = 10_000;

#[derive(Error, Debug)]
pub enum AllocationError {
    #[error("All {} filenames in {} are taken", MAX_CANDIDATES, .directory.display())]
    Exhausted { directory: PathBuf },

    #[error("Cannot inspect {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// 一次拍摄的输出位置
///
/// 每次拍摄新建，分配后不可变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTarget {
    directory: PathBuf,
    filename: String,
}

impl CaptureTarget {
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }
}

/// 文件名分配器
///
/// 按 `0000.ext`、`0001.ext`… 的顺序返回第一个不存在的文件名。
/// 只查询文件系统，不创建文件，文件由调用方在返回的路径上生成。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameAllocator {
    extension: String,
}

impl FilenameAllocator {
    /// `extension` 可带或不带前导点（`".jpg"` 与 `"jpg"` 等价）
    pub fn new(extension: impl AsRef<str>) -> Self {
        let extension = extension.as_ref().trim_start_matches('.');
        Self {
            extension: format!(".{}", extension),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn allocate(&self, directory: &Path) -> Result<CaptureTarget, AllocationError> {
        for i in 0..MAX_CANDIDATES {
            let filename = format!("{:04}{}", i, self.extension);
            let path = directory.join(&filename);
            let taken = path.try_exists().map_err(|source| AllocationError::Io {
                path: path.clone(),
                source,
            })?;

            if !taken {
                return Ok(CaptureTarget {
                    directory: directory.to_path_buf(),
                    filename,
                });
            }
        }

        Err(AllocationError::Exhausted {
            directory: directory.to_path_buf(),
        })
    }
}

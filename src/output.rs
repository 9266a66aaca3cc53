//! # 输出提交
//!
//! 所有输出先写入目标目录下的临时文件，只有整个流程成功后才改名为目标文件。
//! 失败时临时文件随 [`StagedOutput`] 一起被删除，目标路径不会出现半成品。

use crate::error::{Result, StegoError};
use crate::frame::Field;
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// 尚未提交的输出文件。
pub struct StagedOutput {
    target: PathBuf,
    overwrite: bool,
    writer: BufWriter<NamedTempFile>,
    written: u64,
}

impl StagedOutput {
    /// 在 `target` 所在目录创建临时文件。
    ///
    /// `overwrite` 为 `false` 且 `target` 已存在时返回 [`StegoError::OutputExists`]。
    pub fn create(target: &Path, overwrite: bool) -> Result<Self> {
        if !overwrite && target.exists() {
            return Err(StegoError::OutputExists {
                path: target.to_path_buf(),
            });
        }

        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(dir).map_err(|source| StegoError::CannotOpenOutput {
            path: target.to_path_buf(),
            source,
        })?;

        Ok(Self {
            target: target.to_path_buf(),
            overwrite,
            writer: BufWriter::new(temp),
            written: 0,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// 已交给缓冲区的字节数，其中可能有一部分尚未落盘。
    pub fn written(&self) -> u64 {
        self.written
    }

    /// 刷新缓冲并把临时文件改名为目标文件。
    ///
    /// `last` 是最后写入的区段。刷新或同步失败时报告的位置是已交出的总字节数，
    /// 缓冲区中尚未落盘的那部分数据就在它之前。
    pub fn commit(self, last: Field) -> Result<PathBuf> {
        let written = self.written;
        let short_write = |source: io::Error| StegoError::ShortWrite {
            field: last,
            index: written,
            source,
        };

        let temp = self
            .writer
            .into_inner()
            .map_err(|e| short_write(e.into_error()))?;
        temp.as_file().sync_all().map_err(short_write)?;

        let persisted = if self.overwrite {
            temp.persist(&self.target)
        } else {
            temp.persist_noclobber(&self.target)
        };

        persisted.map_err(|e| match e.error.kind() {
            ErrorKind::AlreadyExists => StegoError::OutputExists {
                path: self.target.clone(),
            },
            _ => StegoError::CannotOpenOutput {
                path: self.target.clone(),
                source: e.error,
            },
        })?;

        Ok(self.target)
    }
}

impl Write for StagedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.writer.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

//! # 错误类型
//!
//! 编码与解码流程中所有可能的失败。每一种都会立即终止本次调用。

use crate::frame::Field;
use std::io;
use std::path::PathBuf;

/// 隐写编码/解码过程中可能出现的错误。
#[derive(Debug, thiserror::Error)]
pub enum StegoError {
    /// 无法打开载体图像。
    #[error("cannot open carrier image {path}")]
    CannotOpenCarrier {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 载体不是 BMP 文件。
    #[error("unsupported carrier {path}: only .bmp images can carry data")]
    UnsupportedCarrier { path: PathBuf },

    /// 无法打开要隐藏的文件。
    #[error("cannot open secret file {path}")]
    CannotOpenPayload {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 无法创建或提交输出文件。
    #[error("cannot open output file {path}")]
    CannotOpenOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 输出文件已存在且未允许覆盖。
    #[error("output file already exists: {path}")]
    OutputExists { path: PathBuf },

    /// 载体容量不足以容纳整个容器。
    #[error("insufficient carrier capacity (required {required} bytes, available {available} bytes)")]
    InsufficientCapacity { required: u64, available: u64 },

    /// 起始标记不匹配，图像中没有隐藏数据。
    #[error("magic marker mismatch (found {found:02x?}), no hidden data found")]
    MagicMismatch { found: Vec<u8> },

    /// 扩展名长度超过上限。
    #[error("extension length {len} exceeds the supported maximum of {max}")]
    ExtensionTooLarge { len: u64, max: u32 },

    /// 扩展名包含不能出现在文件名中的字节。
    #[error("extension {0:?} is not a plain ASCII file name component")]
    InvalidExtension(String),

    /// 隐藏文件的长度超过上限或超出载体剩余部分。
    #[error("payload length {len} exceeds the supported maximum of {max}")]
    PayloadTooLarge { len: u64, max: u64 },

    /// 读取到的字节数少于当前字段所需。
    #[error("short read in {field} at unit {index}")]
    ShortRead {
        field: Field,
        index: u64,
        #[source]
        source: io::Error,
    },

    /// 输出端拒绝或截断了写入。
    #[error("short write in {field} at unit {index}")]
    ShortWrite {
        field: Field,
        index: u64,
        #[source]
        source: io::Error,
    },

    /// 容器字段没有按固定顺序读写。
    #[error("container field {found} used out of order (expected {expected})")]
    FieldOrder { expected: Field, found: Field },
}

pub type Result<T> = std::result::Result<T, StegoError>;

//! # 文件名处理
//!
//! 从待隐藏文件的名字中取扩展名，以及解码时把扩展名拼回输出文件名。

use crate::constants::MAX_EXTENSION_LEN;
use crate::error::{Result, StegoError};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// 取文件名最后一个 `.` 之后的部分作为扩展名。
///
/// 没有 `.` 或者只有开头一个 `.` (如 `.bashrc`) 时扩展名为空。
pub fn extension_of(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match name.rfind('.') {
        Some(dot) if dot > 0 => name[dot + 1..].to_string(),
        _ => String::new(),
    }
}

/// 扩展名必须是不超过 [`MAX_EXTENSION_LEN`] 字节的可见 ASCII，且不含路径分隔符或 `.`。
pub fn validate_extension(extension: &str) -> Result<()> {
    if extension.len() as u64 > u64::from(MAX_EXTENSION_LEN) {
        return Err(StegoError::ExtensionTooLarge {
            len: extension.len() as u64,
            max: MAX_EXTENSION_LEN,
        });
    }

    let plain = extension
        .bytes()
        .all(|b| b.is_ascii_graphic() && !matches!(b, b'/' | b'\\' | b'.' | b':'));
    if !plain {
        return Err(StegoError::InvalidExtension(extension.to_string()));
    }
    Ok(())
}

/// 根据解出的扩展名确定最终输出路径。
///
/// * 扩展名为空：原样使用 `stem`。
/// * `stem` 已经以 `.{extension}` 结尾：原样使用。
/// * 否则去掉 `stem` 文件名部分的最后一个扩展名，再追加 `.{extension}`。
///
/// 对已经规范化的名字再执行一次，结果不变。文件名按原始字节处理，不要求是 UTF-8。
pub fn normalize_output_name(stem: &Path, extension: &str) -> PathBuf {
    if extension.is_empty() || stem.extension() == Some(OsStr::new(extension)) {
        return stem.to_path_buf();
    }

    let mut name = stem.file_stem().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(extension);
    stem.with_file_name(name)
}

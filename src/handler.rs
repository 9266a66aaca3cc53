//! # 命令处理逻辑模块
//!
//! 包含处理 `encode` 和 `decode` 子命令的高级业务逻辑。
//! 本模块负责调用核心编码/解码流程，并向用户报告结果。

use crate::cli::{DecodeArgs, EncodeArgs};
use crate::decode::decode;
use crate::encode::encode;
use crate::error::StegoError;
use anyhow::Result;
use colored::Colorize;

/// 为核心错误补充面向用户的提示。
fn hint(err: &StegoError) -> &'static str {
    match err {
        StegoError::InsufficientCapacity { .. } => "Use a larger carrier image or a smaller secret file.",
        StegoError::MagicMismatch { .. } => "The image does not seem to contain a hidden file.",
        StegoError::OutputExists { .. } => "Pass --force to overwrite it.",
        StegoError::UnsupportedCarrier { .. } => "Only uncompressed 24-bit .bmp images are supported.",
        StegoError::ExtensionTooLarge { .. }
        | StegoError::InvalidExtension(_)
        | StegoError::PayloadTooLarge { .. } => "The image may be corrupted or was not produced by this tool.",
        _ => "The file may be corrupt, truncated or write-protected.",
    }
}

/// 处理 'Encode' 命令的执行逻辑。
///
/// 检查载体容量后把待隐藏文件连同其扩展名写入载体的像素数据，
/// 结果先写入临时文件，成功后才出现在目标路径。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径的 `EncodeArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取载体图像或待隐藏文件。
/// * 载体图像没有足够的空间。
/// * 目标文件已存在且未指定 `--force`。
/// * 无法写入目标文件。
pub fn handle_encode(args: EncodeArgs) -> Result<()> {
    let report = encode(&args.image, &args.secret, args.output.as_deref(), args.force).map_err(|err| {
        let advice = hint(&err);
        anyhow::Error::new(err).context(format!(
            "Failed to hide {} in {}. \n{}",
            args.secret.to_string_lossy().red().bold(),
            args.image.to_string_lossy().red().bold(),
            advice
        ))
    })?;

    println!(
        "The file has been successfully hidden and saved: {}",
        report.output.to_string_lossy().green().bold()
    );
    println!(
        "Hidden {} bytes (extension {}), the carrier can hide up to {} bytes.",
        report.payload_len.to_string().green(),
        display_extension(&report.extension).green(),
        report.hideable_bytes.to_string().green()
    );

    Ok(())
}

/// 处理 'Decode' 命令的执行逻辑。
///
/// 校验起始标记后恢复隐藏的文件，输出名按保存的扩展名修正。
///
/// # Arguments
///
/// * `args` - 包含输入路径与可选输出名的 `DecodeArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取载体图像。
/// * 图像中没有隐藏数据，或数据已损坏。
/// * 目标文件已存在且未指定 `--force`。
/// * 无法写入目标文件。
pub fn handle_decode(args: DecodeArgs) -> Result<()> {
    let report = decode(&args.image, args.output.as_deref(), args.force)
        .map_err(|err| {
            let advice = hint(&err);
            anyhow::Error::new(err).context(format!(
                "Failed to recover a hidden file from '{}'. \n{}",
                args.image.to_string_lossy().red().bold(),
                advice
            ))
        })?;

    println!(
        "The file has been successfully recovered and saved: {}",
        report.output.to_string_lossy().green().bold()
    );
    println!(
        "Recovered {} bytes (extension {}).",
        report.payload_len.to_string().green(),
        display_extension(&report.extension).green()
    );

    Ok(())
}

fn display_extension(extension: &str) -> String {
    if extension.is_empty() {
        "none".to_string()
    } else {
        format!(".{extension}")
    }
}

//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use crate::logging::{LOG_FORMAT_ENV, LOG_LEVEL_ENV, LogFormat, LogLevel};
use clap::Parser;
use std::path::PathBuf;

/// 一款基于 LSB (最低有效位) 隐写术的命令行工具，用于把任意文件藏进 24 位 BMP 图像，或从中恢复。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "一款基于 LSB (最低有效位) 隐写术的命令行工具，用于把任意文件藏进 24 位 BMP 图像，或从中恢复。\n每个像素字节只携带 1 bit，隐藏的数据带有起始标记、扩展名和长度，恢复时无需原图。"
)]
pub struct Cli {
    /// 日志输出格式 (stderr)。
    #[arg(long, value_name = "FORMAT", env = LOG_FORMAT_ENV, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// 最低日志级别 (stderr)。
    #[arg(long, value_name = "LEVEL", env = LOG_LEVEL_ENV, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令：encode (隐藏) 和 decode (恢复)。
#[derive(Parser, Debug)]
pub enum Commands {
    /// 把任意文件藏进 24 位 BMP 图像。
    #[command(visible_alias = "hide")]
    Encode(EncodeArgs),

    /// 从经过隐写的 BMP 图像中恢复隐藏的文件。
    #[command(visible_alias = "recover")]
    Decode(DecodeArgs),
}

/// 'encode' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct EncodeArgs {
    /// 用作载体的 BMP 图像路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的文件路径，其扩展名会一并保存。
    #[arg(short, long)]
    pub secret: PathBuf,

    /// 结果图像的输出路径，默认为载体同目录下的 steg.bmp。
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 输出文件已存在时直接覆盖。
    #[arg(short, long)]
    pub force: bool,
}

/// 'decode' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// 藏有数据的 BMP 图像路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 恢复文件的输出名，扩展名会按隐藏时保存的扩展名修正。
    /// 默认为载体同目录下的 decoded。
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 输出文件已存在时直接覆盖。
    #[arg(short, long)]
    pub force: bool,
}

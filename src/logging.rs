//! # 日志
//!
//! 编解码的进度通过 `tracing` 事件输出到 stderr，用户可见的结果由 handler 打印到 stdout，
//! 两者互不干扰，stdout 可以放心地交给脚本解析。
//!
//! 命令行参数之外，格式与级别也可以通过环境变量 [`LOG_FORMAT_ENV`] 与 [`LOG_LEVEL_ENV`] 设置。

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;

/// 设置日志格式的环境变量。
pub const LOG_FORMAT_ENV: &str = "STASH_LOG_FORMAT";
/// 设置日志级别的环境变量。
pub const LOG_LEVEL_ENV: &str = "STASH_LOG_LEVEL";

/// stderr 日志的格式，对应 `--log-format` / `STASH_LOG_FORMAT`。
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// 人类可读的单行文本。
    #[default]
    Text,
    /// 每个事件一行 JSON，不带颜色控制符。
    Json,
}

/// 最低日志级别，对应 `--log-level` / `STASH_LOG_LEVEL`。
///
/// 默认只报告警告；`info` 报告每次编解码的结果，`debug` 逐字段跟踪容器的读写。
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }

    /// `debug` 及以上级别附带事件所在模块 (如 `lsb_stash::frame`)，便于区分编码与解码的各个阶段。
    fn shows_targets(self) -> bool {
        matches!(self, LogLevel::Debug | LogLevel::Trace)
    }
}

/// 初始化全局日志订阅者。重复调用时保留第一次的设置。
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level.as_filter())
        .with_target(level.shows_targets());

    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().with_ansi(false).try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_map_to_filters() {
        assert_eq!(LogLevel::Error.as_filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::default().as_filter(), LevelFilter::WARN);
        assert_eq!(LogLevel::Trace.as_filter(), LevelFilter::TRACE);
    }

    #[test]
    fn targets_only_when_tracing_the_frame() {
        assert!(!LogLevel::Warn.shows_targets());
        assert!(!LogLevel::Info.shows_targets());
        assert!(LogLevel::Debug.shows_targets());
    }

    #[test]
    fn repeated_initialisation_is_harmless() {
        init_logging(LogFormat::Text, LogLevel::Debug);
        init_logging(LogFormat::Json, LogLevel::Info);
    }
}

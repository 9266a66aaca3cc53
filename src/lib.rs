//! # lsb_stash 库
//!
//! 把任意文件藏进 24 位 BMP 图像像素数据的最低有效位，并能逐字节恢复。
//!
//! 隐藏的数据自带描述信息 (起始标记、扩展名、长度)，解码时不需要原图。

// 声明库包含的所有模块。

pub mod capacity;
pub mod cli;
pub mod constants;
pub mod decode;
pub mod encode;
pub mod error;
pub mod frame;
pub mod handler;
pub mod logging;
pub mod naming;
pub mod output;
pub mod steganography;

pub use decode::{DecodeReport, decode};
pub use encode::{EncodeReport, encode};
pub use error::{Result, StegoError};

//! # 格式常量
//!
//! 载体 (24 位 BMP) 与隐藏容器的所有固定参数。

/// BMP 文件的标准头部大小 (字节)。
/// 隐写操作将跳过这个头部，从像素数据开始。
pub const BMP_HEADER_SIZE: usize = 54;

/// 头部中宽度字段的偏移 (32 位小端)。
pub const WIDTH_OFFSET: usize = 18;

/// 头部中高度字段的偏移 (32 位小端，有符号)。
pub const HEIGHT_OFFSET: usize = 22;

/// 24 位色深下每个像素占用的字节数。
pub const BYTES_PER_PIXEL: u64 = 3;

/// 隐藏一个字节需要的载体字节数 (每个载体字节只携带 1 bit)。
pub const CARRIER_BYTES_PER_BYTE: usize = 8;

/// 隐藏一个 `u32` 长度字段需要的载体字节数。
pub const CARRIER_BYTES_PER_U32: usize = 32;

/// 容器的起始标记，解码时用于确认图像中确实藏有数据。
pub const MAGIC: &[u8; 2] = b"#*";

/// 扩展名允许的最大字节数。
pub const MAX_EXTENSION_LEN: u32 = 9;

/// 可隐藏文件的最大字节数 (2^31 - 1)。
pub const MAX_PAYLOAD_LEN: u32 = i32::MAX as u32;

/// 未指定输出路径时，编码结果的文件名 (与载体位于同一目录)。
pub const DEFAULT_STEGO_NAME: &str = "steg.bmp";

/// 未指定输出名时，解码结果的文件名主干 (与载体位于同一目录)。
pub const DEFAULT_DECODED_STEM: &str = "decoded";

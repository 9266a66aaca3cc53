//! # 容量规划
//!
//! 根据载体头部的宽高计算像素区可携带的比特数，并判断容器能否放下。

use crate::constants::{
    BMP_HEADER_SIZE, BYTES_PER_PIXEL, CARRIER_BYTES_PER_BYTE, HEIGHT_OFFSET, MAGIC, WIDTH_OFFSET,
};
use crate::error::{Result, StegoError};

/// 容器需要的总比特数：起始标记、扩展名长度、扩展名、文件长度与文件内容。
pub fn required_bits(magic_len: u64, extension_len: u64, payload_len: u64) -> u64 {
    8 * magic_len + 32 + 8 * extension_len + 32 + 8 * payload_len
}

/// 当 `usable >= ceil(required_bits / 8) + 1` 时返回 `true`，多留一个字节的余量。
pub fn has_capacity(usable: u64, required_bits: u64) -> bool {
    usable >= required_bits.div_ceil(8) + 1
}

/// 载体头部中唯一会被读取的两个字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarrierHeader {
    pub width: u32,
    pub height: u32,
}

impl CarrierHeader {
    /// 从 54 字节的头部读取宽高。
    ///
    /// 高度按有符号数读取并取绝对值，自上而下存储的位图高度为负。
    pub fn parse(header: &[u8; BMP_HEADER_SIZE]) -> Self {
        let field = |offset: usize| {
            [
                header[offset],
                header[offset + 1],
                header[offset + 2],
                header[offset + 3],
            ]
        };

        Self {
            width: i32::from_le_bytes(field(WIDTH_OFFSET)).unsigned_abs(),
            height: i32::from_le_bytes(field(HEIGHT_OFFSET)).unsigned_abs(),
        }
    }

    /// 像素区的字节数，也就是可携带的比特数。
    pub fn usable_bytes(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * BYTES_PER_PIXEL
    }
}

/// 一次编码的容量计划。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPlan {
    /// 像素区字节数 (`width * height * 3`)。
    pub usable_bytes: u64,
    /// 容器总比特数。
    pub required_bits: u64,
}

impl CapacityPlan {
    pub fn new(header: &CarrierHeader, extension_len: u64, payload_len: u64) -> Self {
        Self {
            usable_bytes: header.usable_bytes(),
            required_bits: required_bits(MAGIC.len() as u64, extension_len, payload_len),
        }
    }

    /// 像素区最多能藏下的字节数 (每 8 个载体字节藏 1 个字节)。
    pub fn hideable_bytes(&self) -> u64 {
        self.usable_bytes / CARRIER_BYTES_PER_BYTE as u64
    }

    /// 容量不足时返回 [`StegoError::InsufficientCapacity`]。
    pub fn check(&self) -> Result<()> {
        if has_capacity(self.hideable_bytes(), self.required_bits) {
            Ok(())
        } else {
            Err(StegoError::InsufficientCapacity {
                required: self.required_bits.div_ceil(8) + 1,
                available: self.hideable_bytes(),
            })
        }
    }
}

#[cfg(test)]
pub(crate) fn bmp_header(width: i32, height: i32) -> [u8; BMP_HEADER_SIZE] {
    let mut header = [0u8; BMP_HEADER_SIZE];
    header[0..2].copy_from_slice(b"BM");
    header[WIDTH_OFFSET..WIDTH_OFFSET + 4].copy_from_slice(&width.to_le_bytes());
    header[HEIGHT_OFFSET..HEIGHT_OFFSET + 4].copy_from_slice(&height.to_le_bytes());
    header
}

//! # LSB 位编解码
//!
//! 把一个字节或一个 `u32` 拆成单个比特，按最高位优先的顺序写入
//! 连续载体字节的最低位；反向操作把它们重新拼回来。
//! 载体字节的其余 7 位保持不变。

use crate::constants::{CARRIER_BYTES_PER_BYTE, CARRIER_BYTES_PER_U32};

/// 将 `value` 的 8 个比特依次写入 `carrier` 各字节的最低位。
///
/// `value` 的第 7 位写入 `carrier[0]`，第 0 位写入 `carrier[7]`。
pub fn pack_byte(value: u8, carrier: &mut [u8; CARRIER_BYTES_PER_BYTE]) {
    for (i, byte) in carrier.iter_mut().enumerate() {
        let bit = (value >> (7 - i)) & 0x1;
        *byte = (*byte & 0xFE) | bit;
    }
}

/// 从 8 个载体字节的最低位恢复一个字节，是 [`pack_byte`] 的逆操作。
pub fn unpack_byte(carrier: &[u8; CARRIER_BYTES_PER_BYTE]) -> u8 {
    carrier
        .iter()
        .fold(0u8, |acc, &byte| (acc << 1) | (byte & 0x1))
}

/// 将 `value` 的 32 个比特 (最高位优先) 写入 32 个载体字节的最低位。
pub fn pack_u32(value: u32, carrier: &mut [u8; CARRIER_BYTES_PER_U32]) {
    for (i, byte) in carrier.iter_mut().enumerate() {
        let bit = ((value >> (31 - i)) & 0x1) as u8;
        *byte = (*byte & 0xFE) | bit;
    }
}

/// 从 32 个载体字节的最低位恢复一个 `u32`，是 [`pack_u32`] 的逆操作。
pub fn unpack_u32(carrier: &[u8; CARRIER_BYTES_PER_U32]) -> u32 {
    carrier
        .iter()
        .fold(0u32, |acc, &byte| (acc << 1) | u32::from(byte & 0x1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, RngCore};

    #[test]
    fn byte_round_trip_for_every_value_and_background() {
        // 覆盖全零、全一以及交替的高 7 位背景
        for background in [0x00u8, 0xFF, 0xAA, 0x55, 0x7E] {
            for value in 0..=u8::MAX {
                let mut carrier = [background; 8];
                pack_byte(value, &mut carrier);
                assert_eq!(unpack_byte(&carrier), value);
            }
        }
    }

    #[test]
    fn pack_byte_leaves_upper_bits_untouched() {
        let mut original = [0u8; 8];
        rand::rng().fill_bytes(&mut original);

        let mut carrier = original;
        pack_byte(0b1011_0010, &mut carrier);

        for (before, after) in original.iter().zip(carrier.iter()) {
            assert_eq!(before & 0xFE, after & 0xFE);
        }
    }

    #[test]
    fn pack_byte_is_msb_first() {
        let mut carrier = [0u8; 8];
        pack_byte(0b1000_0001, &mut carrier);
        assert_eq!(carrier, [1, 0, 0, 0, 0, 0, 0, 1]);

        pack_byte(0b0100_0000, &mut carrier);
        assert_eq!(carrier, [0, 1, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn u32_round_trip() {
        let mut rng = rand::rng();
        let mut values = vec![0, 1, 3, 0x8000_0000, u32::MAX, i32::MAX as u32];
        values.extend((0..256).map(|_| rng.random::<u32>()));

        for value in values {
            let mut carrier = [0u8; 32];
            rng.fill_bytes(&mut carrier);
            let original = carrier;

            pack_u32(value, &mut carrier);
            assert_eq!(unpack_u32(&carrier), value);
            assert!(
                original
                    .iter()
                    .zip(carrier.iter())
                    .all(|(a, b)| a & 0xFE == b & 0xFE)
            );
        }
    }

    #[test]
    fn pack_u32_is_msb_first() {
        let mut carrier = [0xFEu8; 32];
        pack_u32(3, &mut carrier);
        assert_eq!(carrier[31], 0xFF);
        assert_eq!(carrier[30], 0xFF);
        assert!(carrier[..30].iter().all(|&b| b == 0xFE));
    }
}

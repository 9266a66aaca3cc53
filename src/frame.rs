//! # 容器帧
//!
//! 隐藏数据在像素区内的布局，每个字段的比特按 [`crate::steganography`]
//! 的方式摊到载体字节上：
//!
//! ```text
//! ┌──────────┬──────────────┬────────────┬──────────────┬──────────────┐
//! │ Magic    │ Ext length   │ Extension  │ Payload len  │ Payload      │
//! │ "#*"     │ u32 (32 B)   │ 8 B / byte │ u32 (32 B)   │ 8 B / byte   │
//! │ (16 B)   │              │            │              │              │
//! └──────────┴──────────────┴────────────┴──────────────┴──────────────┘
//! ```
//!
//! 字段必须严格按上面的顺序读写，变长字段的长度由紧挨着它的长度字段决定。

use crate::constants::{CARRIER_BYTES_PER_BYTE, CARRIER_BYTES_PER_U32};
use crate::error::{Result, StegoError};
use crate::naming::validate_extension;
use crate::steganography::{pack_byte, pack_u32, unpack_byte, unpack_u32};
use std::fmt;
use std::io::{Read, Write};

/// 载体流中的区段，同时充当帧读写器的状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Header,
    Magic,
    ExtensionLength,
    Extension,
    PayloadLength,
    Payload,
    Tail,
}

impl Field {
    /// 当前字段之后的字段。扩展名长度为 0 时跳过扩展名。
    fn after(self, length: u32) -> Field {
        match self {
            Field::Header => Field::Magic,
            Field::Magic => Field::ExtensionLength,
            Field::ExtensionLength if length == 0 => Field::PayloadLength,
            Field::ExtensionLength => Field::Extension,
            Field::Extension => Field::PayloadLength,
            Field::PayloadLength if length == 0 => Field::Tail,
            Field::PayloadLength => Field::Payload,
            Field::Payload | Field::Tail => Field::Tail,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Header => "carrier header",
            Field::Magic => "magic marker",
            Field::ExtensionLength => "extension length",
            Field::Extension => "extension",
            Field::PayloadLength => "payload length",
            Field::Payload => "payload",
            Field::Tail => "trailing carrier data",
        };
        f.write_str(name)
    }
}

/// 从载体流中读取一段固定大小的字节。
fn read_chunk<R: Read, const N: usize>(reader: &mut R, field: Field, index: u64) -> Result<[u8; N]> {
    let mut chunk = [0u8; N];
    reader
        .read_exact(&mut chunk)
        .map_err(|source| StegoError::ShortRead {
            field,
            index,
            source,
        })?;
    Ok(chunk)
}

/// 把容器逐字段写入载体：每读入一段源载体字节，修改最低位后原样写到目标。
pub struct FrameWriter<'a, R, W> {
    carrier: &'a mut R,
    dest: &'a mut W,
    next: Field,
    consumed: u64,
}

impl<'a, R: Read, W: Write> FrameWriter<'a, R, W> {
    /// `carrier` 与 `dest` 都应已越过 54 字节的头部。
    pub fn new(carrier: &'a mut R, dest: &'a mut W) -> Self {
        Self {
            carrier,
            dest,
            next: Field::Magic,
            consumed: 0,
        }
    }

    /// 已消耗 (也已写出) 的载体字节数。
    pub fn carrier_bytes(&self) -> u64 {
        self.consumed
    }

    /// 帧是否已完整写出。
    pub fn is_complete(&self) -> bool {
        self.next == Field::Tail
    }

    fn enter(&mut self, field: Field) -> Result<()> {
        if self.next != field {
            return Err(StegoError::FieldOrder {
                expected: self.next,
                found: field,
            });
        }
        Ok(())
    }

    fn emit(&mut self, chunk: &[u8], field: Field, index: u64) -> Result<()> {
        self.dest
            .write_all(chunk)
            .map_err(|source| StegoError::ShortWrite {
                field,
                index,
                source,
            })?;
        self.consumed += chunk.len() as u64;
        Ok(())
    }

    fn put_byte(&mut self, value: u8, field: Field, index: u64) -> Result<()> {
        let mut chunk = read_chunk::<_, CARRIER_BYTES_PER_BYTE>(&mut *self.carrier, field, index)?;
        pack_byte(value, &mut chunk);
        self.emit(&chunk, field, index)
    }

    fn put_u32(&mut self, value: u32, field: Field) -> Result<()> {
        let mut chunk = read_chunk::<_, CARRIER_BYTES_PER_U32>(&mut *self.carrier, field, 0)?;
        pack_u32(value, &mut chunk);
        self.emit(&chunk, field, 0)
    }

    /// 写入起始标记。
    pub fn write_magic(&mut self, magic: &[u8]) -> Result<()> {
        self.enter(Field::Magic)?;
        for (i, &byte) in magic.iter().enumerate() {
            self.put_byte(byte, Field::Magic, i as u64)?;
        }
        self.next = Field::Magic.after(0);
        Ok(())
    }

    /// 写入扩展名长度和扩展名本身 (不含 `.`)，长度为 0 时只写长度。
    pub fn write_extension(&mut self, extension: &str) -> Result<()> {
        self.enter(Field::ExtensionLength)?;
        validate_extension(extension)?;

        let len = extension.len() as u32;
        self.put_u32(len, Field::ExtensionLength)?;
        self.next = Field::ExtensionLength.after(len);

        if len > 0 {
            for (i, &byte) in extension.as_bytes().iter().enumerate() {
                self.put_byte(byte, Field::Extension, i as u64)?;
            }
            self.next = Field::Extension.after(len);
        }
        Ok(())
    }

    /// 写入文件长度，再从 `payload` 中流式读取恰好 `len` 个字节写入载体。
    pub fn write_payload<P: Read>(&mut self, payload: &mut P, len: u32) -> Result<()> {
        self.enter(Field::PayloadLength)?;
        self.put_u32(len, Field::PayloadLength)?;
        self.next = Field::PayloadLength.after(len);

        let mut buf = [0u8; 4096];
        let mut done = 0u64;
        let total = u64::from(len);
        while done < total {
            let take = (total - done).min(buf.len() as u64) as usize;
            payload
                .read_exact(&mut buf[..take])
                .map_err(|source| StegoError::ShortRead {
                    field: Field::Payload,
                    index: done,
                    source,
                })?;

            for &byte in &buf[..take] {
                self.put_byte(byte, Field::Payload, done)?;
                done += 1;
            }
        }
        self.next = Field::Tail;
        Ok(())
    }
}

/// 解出的容器头部信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    /// 不含 `.` 的扩展名，可能为空。
    pub extension: String,
    pub payload_len: u32,
}

/// 逐字段从载体中解出容器。
pub struct FrameReader<'a, R> {
    carrier: &'a mut R,
    next: Field,
    payload_len: u32,
    consumed: u64,
}

impl<'a, R: Read> FrameReader<'a, R> {
    /// `carrier` 应已越过 54 字节的头部。
    pub fn new(carrier: &'a mut R) -> Self {
        Self {
            carrier,
            next: Field::Magic,
            payload_len: 0,
            consumed: 0,
        }
    }

    /// 已读取的载体字节数。
    pub fn carrier_bytes(&self) -> u64 {
        self.consumed
    }

    fn enter(&mut self, field: Field) -> Result<()> {
        if self.next != field {
            return Err(StegoError::FieldOrder {
                expected: self.next,
                found: field,
            });
        }
        Ok(())
    }

    fn take_byte(&mut self, field: Field, index: u64) -> Result<u8> {
        let chunk = read_chunk::<_, CARRIER_BYTES_PER_BYTE>(&mut *self.carrier, field, index)?;
        self.consumed += CARRIER_BYTES_PER_BYTE as u64;
        Ok(unpack_byte(&chunk))
    }

    fn take_u32(&mut self, field: Field) -> Result<u32> {
        let chunk = read_chunk::<_, CARRIER_BYTES_PER_U32>(&mut *self.carrier, field, 0)?;
        self.consumed += CARRIER_BYTES_PER_U32 as u64;
        Ok(unpack_u32(&chunk))
    }

    /// 读出 `len` 字节的起始标记，由调用方负责比较。
    pub fn read_magic(&mut self, len: usize) -> Result<Vec<u8>> {
        self.enter(Field::Magic)?;
        let magic = (0..len as u64)
            .map(|i| self.take_byte(Field::Magic, i))
            .collect::<Result<Vec<u8>>>()?;
        self.next = Field::Magic.after(0);
        Ok(magic)
    }

    /// 读出扩展名。长度超过 `max` 时在读取任何扩展名字节之前返回错误。
    pub fn read_extension(&mut self, max: u32) -> Result<String> {
        self.enter(Field::ExtensionLength)?;
        let len = self.take_u32(Field::ExtensionLength)?;
        if len > max {
            return Err(StegoError::ExtensionTooLarge {
                len: u64::from(len),
                max,
            });
        }
        self.next = Field::ExtensionLength.after(len);

        let bytes = (0..u64::from(len))
            .map(|i| self.take_byte(Field::Extension, i))
            .collect::<Result<Vec<u8>>>()?;
        if len > 0 {
            self.next = Field::Extension.after(len);
        }

        let extension = String::from_utf8(bytes)
            .map_err(|e| StegoError::InvalidExtension(String::from_utf8_lossy(e.as_bytes()).into_owned()))?;
        validate_extension(&extension)?;
        Ok(extension)
    }

    /// 读出文件长度。超过 `max` 时返回 [`StegoError::PayloadTooLarge`]。
    pub fn read_payload_len(&mut self, max: u64) -> Result<u32> {
        self.enter(Field::PayloadLength)?;
        let len = self.take_u32(Field::PayloadLength)?;
        if u64::from(len) > max {
            return Err(StegoError::PayloadTooLarge {
                len: u64::from(len),
                max,
            });
        }
        self.payload_len = len;
        self.next = Field::PayloadLength.after(len);
        Ok(len)
    }

    /// 逐字节解出文件内容并顺序写入 `dest`。
    pub fn read_payload<W: Write>(&mut self, dest: &mut W) -> Result<u64> {
        if self.next != Field::Tail || self.payload_len != 0 {
            self.enter(Field::Payload)?;
        }

        let mut buf = Vec::with_capacity(4096);
        let total = u64::from(self.payload_len);
        for i in 0..total {
            buf.push(self.take_byte(Field::Payload, i)?);
            if buf.len() == buf.capacity() || i + 1 == total {
                let start = i + 1 - buf.len() as u64;
                dest.write_all(&buf)
                    .map_err(|source| StegoError::ShortWrite {
                        field: Field::Payload,
                        index: start,
                        source,
                    })?;
                buf.clear();
            }
        }
        self.next = Field::Tail;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MAGIC, MAX_EXTENSION_LEN};
    use std::io::Cursor;

    fn framed(extension: &str, payload: &[u8], carrier_len: usize) -> (Vec<u8>, u64) {
        let mut carrier = Cursor::new(vec![0xA5u8; carrier_len]);
        let mut out: Vec<u8> = Vec::new();
        let mut writer = FrameWriter::new(&mut carrier, &mut out);
        writer.write_magic(MAGIC).unwrap();
        writer.write_extension(extension).unwrap();
        writer
            .write_payload(&mut Cursor::new(payload), payload.len() as u32)
            .unwrap();
        assert!(writer.is_complete());
        let consumed = writer.carrier_bytes();
        (out, consumed)
    }

    #[test]
    fn frame_round_trip() {
        let payload = b"attack at dawn";
        let (out, consumed) = framed("txt", payload, 1024);
        assert_eq!(consumed, 16 + 32 + 24 + 32 + 8 * payload.len() as u64);
        assert_eq!(out.len() as u64, consumed);

        let mut src = Cursor::new(out);
        let mut reader = FrameReader::new(&mut src);
        assert_eq!(reader.read_magic(MAGIC.len()).unwrap(), MAGIC);
        assert_eq!(reader.read_extension(MAX_EXTENSION_LEN).unwrap(), "txt");
        assert_eq!(reader.read_payload_len(u64::MAX).unwrap(), payload.len() as u32);

        let mut recovered: Vec<u8> = Vec::new();
        reader.read_payload(&mut recovered).unwrap();
        assert_eq!(recovered, payload);
        assert_eq!(reader.carrier_bytes(), consumed);
    }

    #[test]
    fn empty_extension_and_payload() {
        let (out, consumed) = framed("", b"", 1024);
        assert_eq!(consumed, 16 + 32 + 32);

        let mut src = Cursor::new(out);
        let mut reader = FrameReader::new(&mut src);
        reader.read_magic(MAGIC.len()).unwrap();
        assert_eq!(reader.read_extension(MAX_EXTENSION_LEN).unwrap(), "");
        assert_eq!(reader.read_payload_len(u64::MAX).unwrap(), 0);

        let mut recovered: Vec<u8> = Vec::new();
        assert_eq!(reader.read_payload(&mut recovered).unwrap(), 0);
        assert!(recovered.is_empty());
    }

    #[test]
    fn fields_must_follow_the_fixed_order() {
        let mut carrier = Cursor::new(vec![0u8; 256]);
        let mut out: Vec<u8> = Vec::new();
        let mut writer = FrameWriter::new(&mut carrier, &mut out);

        let err = writer.write_extension("txt").unwrap_err();
        assert!(matches!(
            err,
            StegoError::FieldOrder {
                expected: Field::Magic,
                found: Field::ExtensionLength
            }
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn oversized_extension_is_rejected_before_reading_it() {
        let mut carrier = Cursor::new(vec![0u8; 256]);
        let mut out: Vec<u8> = Vec::new();
        let mut writer = FrameWriter::new(&mut carrier, &mut out);
        writer.write_magic(MAGIC).unwrap();
        writer.put_u32(MAX_EXTENSION_LEN + 1, Field::ExtensionLength).unwrap();

        let mut src = Cursor::new(out);
        let mut reader = FrameReader::new(&mut src);
        reader.read_magic(MAGIC.len()).unwrap();
        let err = reader.read_extension(MAX_EXTENSION_LEN).unwrap_err();
        assert!(matches!(err, StegoError::ExtensionTooLarge { len: 10, .. }));
    }

    #[test]
    fn short_carrier_reports_field_and_index() {
        // 足够写下标记和扩展名长度，但扩展名第二个字节时耗尽
        let mut carrier = Cursor::new(vec![0u8; 16 + 32 + 8 + 4]);
        let mut out: Vec<u8> = Vec::new();
        let mut writer = FrameWriter::new(&mut carrier, &mut out);
        writer.write_magic(MAGIC).unwrap();

        let err = writer.write_extension("txt").unwrap_err();
        assert!(matches!(
            err,
            StegoError::ShortRead {
                field: Field::Extension,
                index: 1,
                ..
            }
        ));
    }

    #[test]
    fn truncated_payload_source_is_a_short_read() {
        let mut carrier = Cursor::new(vec![0u8; 1024]);
        let mut out: Vec<u8> = Vec::new();
        let mut writer = FrameWriter::new(&mut carrier, &mut out);
        writer.write_magic(MAGIC).unwrap();
        writer.write_extension("bin").unwrap();

        let err = writer
            .write_payload(&mut Cursor::new(b"abc"), 10)
            .unwrap_err();
        assert!(matches!(
            err,
            StegoError::ShortRead {
                field: Field::Payload,
                ..
            }
        ));
    }

    #[test]
    fn payload_length_above_limit_is_rejected() {
        let (out, _) = framed("txt", b"0123456789", 1024);
        let mut src = Cursor::new(out);
        let mut reader = FrameReader::new(&mut src);
        reader.read_magic(MAGIC.len()).unwrap();
        reader.read_extension(MAX_EXTENSION_LEN).unwrap();

        let err = reader.read_payload_len(9).unwrap_err();
        assert!(matches!(err, StegoError::PayloadTooLarge { len: 10, max: 9 }));
    }

    #[test]
    fn full_destination_reports_field_and_index() {
        let mut carrier = Cursor::new(vec![0u8; 1024]);
        // 只够写下起始标记、扩展名长度和扩展名的第一个字节
        let mut storage = [0u8; 16 + 32 + 8];
        let mut dest: &mut [u8] = &mut storage;
        let mut writer = FrameWriter::new(&mut carrier, &mut dest);

        writer.write_magic(MAGIC).unwrap();
        let err = writer.write_extension("txt").unwrap_err();
        assert!(matches!(
            err,
            StegoError::ShortWrite {
                field: Field::Extension,
                index: 1,
                ..
            }
        ));
    }
}

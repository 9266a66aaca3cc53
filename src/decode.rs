//! # 解码流程
//!
//! 跳过载体头部，逐字段解出容器，校验起始标记，再把隐藏的文件内容
//! 流式写入输出。

use crate::constants::{
    BMP_HEADER_SIZE, CARRIER_BYTES_PER_BYTE, CARRIER_BYTES_PER_U32, DEFAULT_DECODED_STEM, MAGIC,
    MAX_EXTENSION_LEN, MAX_PAYLOAD_LEN,
};
use crate::encode::ensure_bitmap;
use crate::error::{Result, StegoError};
use crate::frame::{Field, FrameHeader, FrameReader};
use crate::naming::normalize_output_name;
use crate::output::StagedOutput;
use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 跳过头部并解出容器头部字段，返回的读取器停在文件内容之前。
///
/// 解出的每个长度都先经过上限检查：扩展名不超过 [`MAX_EXTENSION_LEN`]，
/// 文件长度不超过 [`MAX_PAYLOAD_LEN`]，也不超过载体剩余字节能容纳的数量。
pub fn open_frame<R: Read + Seek>(carrier: &mut R) -> Result<(FrameHeader, FrameReader<'_, R>)> {
    let header_err = |source| StegoError::ShortRead {
        field: Field::Header,
        index: 0,
        source,
    };

    let total = carrier.seek(SeekFrom::End(0)).map_err(header_err)?;
    if total < BMP_HEADER_SIZE as u64 {
        return Err(header_err(io::Error::new(
            ErrorKind::UnexpectedEof,
            "carrier is shorter than its header",
        )));
    }
    carrier
        .seek(SeekFrom::Start(BMP_HEADER_SIZE as u64))
        .map_err(header_err)?;

    let mut reader = FrameReader::new(carrier);

    let magic = reader.read_magic(MAGIC.len())?;
    if magic != MAGIC {
        return Err(StegoError::MagicMismatch { found: magic });
    }
    debug!("magic marker verified");

    let extension = reader.read_extension(MAX_EXTENSION_LEN)?;
    debug!(extension = %extension, "extension decoded");

    let remaining = (total - BMP_HEADER_SIZE as u64)
        .saturating_sub(reader.carrier_bytes() + CARRIER_BYTES_PER_U32 as u64);
    let max = u64::from(MAX_PAYLOAD_LEN).min(remaining / CARRIER_BYTES_PER_BYTE as u64);
    let payload_len = reader.read_payload_len(max)?;
    debug!(payload_len, "payload length decoded");

    Ok((
        FrameHeader {
            extension,
            payload_len,
        },
        reader,
    ))
}

/// 从 `carrier` 解出隐藏的文件内容写入 `dest`，返回扩展名与长度。
pub fn decode_stream<R, W>(carrier: &mut R, dest: &mut W) -> Result<FrameHeader>
where
    R: Read + Seek,
    W: Write,
{
    let (header, mut reader) = open_frame(carrier)?;
    reader.read_payload(dest)?;
    Ok(header)
}

/// 一次成功解码的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeReport {
    pub output: PathBuf,
    pub extension: String,
    pub payload_len: u64,
}

/// 一次解码调用持有的全部资源。
pub struct DecodeContext {
    carrier: BufReader<File>,
    stem: PathBuf,
    overwrite: bool,
}

impl DecodeContext {
    /// 打开载体。未给出 `output` 时以载体同目录下的 `decoded` 作为文件名主干。
    pub fn open(carrier_path: &Path, output: Option<&Path>, overwrite: bool) -> Result<Self> {
        ensure_bitmap(carrier_path)?;

        let carrier = File::open(carrier_path).map_err(|source| StegoError::CannotOpenCarrier {
            path: carrier_path.to_path_buf(),
            source,
        })?;

        let stem = match output {
            Some(path) => path.to_path_buf(),
            None => carrier_path.with_file_name(DEFAULT_DECODED_STEM),
        };

        Ok(Self {
            carrier: BufReader::new(carrier),
            stem,
            overwrite,
        })
    }

    /// 执行解码。只有全部内容写出后输出文件才会出现在目标路径。
    pub fn run(mut self) -> Result<DecodeReport> {
        let (header, mut reader) = open_frame(&mut self.carrier)?;

        let target = normalize_output_name(&self.stem, &header.extension);
        let mut staged = StagedOutput::create(&target, self.overwrite)?;
        debug!(output = %staged.target().display(), "writing recovered payload");

        let payload_len = reader.read_payload(&mut staged)?;
        let output = staged.commit(Field::Payload)?;

        info!(
            output = %output.display(),
            payload_len,
            extension = %header.extension,
            "secret file recovered"
        );

        Ok(DecodeReport {
            output,
            extension: header.extension,
            payload_len,
        })
    }
}

/// 从 `carrier_path` 中恢复隐藏文件，输出名由 `output` (或默认的 `decoded`) 与解出的扩展名决定。
pub fn decode(carrier_path: &Path, output: Option<&Path>, overwrite: bool) -> Result<DecodeReport> {
    DecodeContext::open(carrier_path, output, overwrite)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::bmp_header;
    use crate::encode::encode_stream;
    use std::io::Cursor;

    /// 磁盘已满的目标。
    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::StorageFull, "no space left on device"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn gradient_carrier(width: i32, height: i32) -> Vec<u8> {
        let mut bytes = bmp_header(width, height).to_vec();
        bytes.extend((0..(width * height * 3) as usize).map(|i| (i % 256) as u8));
        bytes
    }

    fn stego(extension: &str, secret: &[u8]) -> Vec<u8> {
        let mut dest: Vec<u8> = Vec::new();
        encode_stream(
            &mut Cursor::new(gradient_carrier(100, 50)),
            &mut Cursor::new(secret),
            secret.len() as u64,
            extension,
            &mut dest,
        )
        .unwrap();
        dest
    }

    #[test]
    fn recovers_payload_and_extension() {
        let secret = b"hidden in plain sight";
        let mut out: Vec<u8> = Vec::new();

        let header = decode_stream(&mut Cursor::new(stego("txt", secret)), &mut out).unwrap();
        assert_eq!(header.extension, "txt");
        assert_eq!(header.payload_len as usize, secret.len());
        assert_eq!(out, secret);
    }

    #[test]
    fn recovers_binary_payload() {
        let secret: Vec<u8> = (0..=255u8).rev().collect();
        let mut out: Vec<u8> = Vec::new();

        decode_stream(&mut Cursor::new(stego("bin", &secret)), &mut out).unwrap();
        assert_eq!(out, secret);
    }

    #[test]
    fn unencoded_carrier_is_a_magic_mismatch() {
        let mut out: Vec<u8> = Vec::new();
        let err = decode_stream(&mut Cursor::new(gradient_carrier(100, 50)), &mut out).unwrap_err();

        assert!(matches!(err, StegoError::MagicMismatch { .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn carrier_shorter_than_header() {
        let err = decode_stream(&mut Cursor::new(vec![0u8; 10]), &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(
            err,
            StegoError::ShortRead {
                field: Field::Header,
                ..
            }
        ));
    }

    #[test]
    fn payload_length_beyond_carrier_is_rejected() {
        let secret = vec![0x42u8; 100];
        let mut bytes = stego("dat", &secret);
        // 截掉一部分像素数据，使声明的长度超出剩余载体
        bytes.truncate(BMP_HEADER_SIZE + 16 + 32 + 24 + 32 + 8 * 50);

        let err = decode_stream(&mut Cursor::new(bytes), &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(
            err,
            StegoError::PayloadTooLarge { len: 100, max: 50 }
        ));
    }

    #[test]
    fn failing_destination_is_a_short_write() {
        let err = decode_stream(&mut Cursor::new(stego("txt", b"payload")), &mut FullDisk)
            .unwrap_err();
        assert!(matches!(
            err,
            StegoError::ShortWrite {
                field: Field::Payload,
                ..
            }
        ));
    }
}

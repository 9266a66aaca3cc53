//! # 编码流程
//!
//! 读取载体头部、检查容量、原样复制头部、逐字段写入容器，
//! 最后原样复制剩余的载体字节。输出与载体长度完全一致。

use crate::capacity::{CapacityPlan, CarrierHeader};
use crate::constants::{BMP_HEADER_SIZE, DEFAULT_STEGO_NAME, MAGIC, MAX_PAYLOAD_LEN};
use crate::error::{Result, StegoError};
use crate::frame::{Field, FrameWriter};
use crate::naming::{extension_of, validate_extension};
use crate::output::StagedOutput;
use image::ImageFormat;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 载体必须是 `.bmp` 文件。
pub(crate) fn ensure_bitmap(path: &Path) -> Result<()> {
    match ImageFormat::from_path(path) {
        Ok(ImageFormat::Bmp) => Ok(()),
        _ => Err(StegoError::UnsupportedCarrier {
            path: path.to_path_buf(),
        }),
    }
}

/// 流式编码的统计结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSummary {
    pub plan: CapacityPlan,
    /// 容器占用的载体字节数。
    pub framed_bytes: u64,
    /// 容器之后原样复制的载体字节数。
    pub tail_bytes: u64,
}

impl EncodeSummary {
    /// 写入目标的总字节数。
    pub fn total_bytes(&self) -> u64 {
        BMP_HEADER_SIZE as u64 + self.framed_bytes + self.tail_bytes
    }
}

/// 把 `payload` 中的 `payload_len` 个字节连同扩展名藏进 `carrier`，结果写入 `dest`。
///
/// 容量不足时在向 `dest` 写入任何字节之前返回 [`StegoError::InsufficientCapacity`]。
pub fn encode_stream<R, P, W>(
    carrier: &mut R,
    payload: &mut P,
    payload_len: u64,
    extension: &str,
    dest: &mut W,
) -> Result<EncodeSummary>
where
    R: Read,
    P: Read,
    W: Write,
{
    if payload_len > u64::from(MAX_PAYLOAD_LEN) {
        return Err(StegoError::PayloadTooLarge {
            len: payload_len,
            max: u64::from(MAX_PAYLOAD_LEN),
        });
    }
    validate_extension(extension)?;

    let mut header = [0u8; BMP_HEADER_SIZE];
    carrier
        .read_exact(&mut header)
        .map_err(|source| StegoError::ShortRead {
            field: Field::Header,
            index: 0,
            source,
        })?;

    let dims = CarrierHeader::parse(&header);
    let plan = CapacityPlan::new(&dims, extension.len() as u64, payload_len);
    debug!(
        width = dims.width,
        height = dims.height,
        usable_bytes = plan.usable_bytes,
        hideable_bytes = plan.hideable_bytes(),
        required_bits = plan.required_bits,
        "checking carrier capacity"
    );
    plan.check()?;

    dest.write_all(&header)
        .map_err(|source| StegoError::ShortWrite {
            field: Field::Header,
            index: 0,
            source,
        })?;
    debug!("carrier header copied");

    let mut writer = FrameWriter::new(carrier, dest);
    writer.write_magic(MAGIC)?;
    debug!("magic marker encoded");
    writer.write_extension(extension)?;
    debug!(extension, "extension encoded");
    writer.write_payload(payload, payload_len as u32)?;
    debug!(payload_len, "payload encoded");
    let framed_bytes = writer.carrier_bytes();

    let tail_bytes = copy_tail(carrier, dest)?;
    debug!(tail_bytes, "remaining carrier data copied");

    Ok(EncodeSummary {
        plan,
        framed_bytes,
        tail_bytes,
    })
}

/// 原样复制容器之后的所有载体字节。
fn copy_tail<R: Read, W: Write>(carrier: &mut R, dest: &mut W) -> Result<u64> {
    let mut buf = [0u8; 8192];
    let mut copied = 0u64;
    loop {
        let n = match carrier.read(&mut buf) {
            Ok(0) => return Ok(copied),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(StegoError::ShortRead {
                    field: Field::Tail,
                    index: copied,
                    source,
                });
            }
        };
        dest.write_all(&buf[..n])
            .map_err(|source| StegoError::ShortWrite {
                field: Field::Tail,
                index: copied,
                source,
            })?;
        copied += n as u64;
    }
}

/// 一次成功编码的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeReport {
    pub output: PathBuf,
    pub extension: String,
    pub payload_len: u64,
    /// 像素区字节数 (宽 × 高 × 3)，每个字节携带 1 bit。
    pub usable_bytes: u64,
    /// 像素区最多能藏下的字节数，即 `usable_bytes / 8`。
    pub hideable_bytes: u64,
    pub output_len: u64,
}

/// 一次编码调用持有的全部资源。
pub struct EncodeContext {
    carrier: BufReader<File>,
    payload: BufReader<File>,
    payload_len: u64,
    extension: String,
    output: StagedOutput,
}

impl EncodeContext {
    /// 打开载体和待隐藏文件，并在输出目录准备临时文件。
    ///
    /// 未给出 `output` 时使用载体同目录下的 `steg.bmp`。
    pub fn open(
        carrier_path: &Path,
        payload_path: &Path,
        output: Option<&Path>,
        overwrite: bool,
    ) -> Result<Self> {
        ensure_bitmap(carrier_path)?;

        let carrier = File::open(carrier_path).map_err(|source| StegoError::CannotOpenCarrier {
            path: carrier_path.to_path_buf(),
            source,
        })?;

        let payload_err = |source| StegoError::CannotOpenPayload {
            path: payload_path.to_path_buf(),
            source,
        };
        let payload = File::open(payload_path).map_err(payload_err)?;
        let payload_len = payload.metadata().map_err(payload_err)?.len();
        let extension = extension_of(payload_path);

        let target = match output {
            Some(path) => path.to_path_buf(),
            None => carrier_path.with_file_name(DEFAULT_STEGO_NAME),
        };
        let output = StagedOutput::create(&target, overwrite)?;

        Ok(Self {
            carrier: BufReader::new(carrier),
            payload: BufReader::new(payload),
            payload_len,
            extension,
            output,
        })
    }

    /// 执行编码并提交输出文件。
    pub fn run(mut self) -> Result<EncodeReport> {
        let summary = encode_stream(
            &mut self.carrier,
            &mut self.payload,
            self.payload_len,
            &self.extension,
            &mut self.output,
        )?;
        let output = self.output.commit(Field::Tail)?;

        info!(
            output = %output.display(),
            payload_len = self.payload_len,
            extension = %self.extension,
            "secret file hidden"
        );

        Ok(EncodeReport {
            output,
            extension: self.extension,
            payload_len: self.payload_len,
            usable_bytes: summary.plan.usable_bytes,
            hideable_bytes: summary.plan.hideable_bytes(),
            output_len: summary.total_bytes(),
        })
    }
}

/// 把 `payload_path` 藏进 `carrier_path`，写到 `output` (或默认的 `steg.bmp`)。
pub fn encode(
    carrier_path: &Path,
    payload_path: &Path,
    output: Option<&Path>,
    overwrite: bool,
) -> Result<EncodeReport> {
    EncodeContext::open(carrier_path, payload_path, output, overwrite)?.run()
}

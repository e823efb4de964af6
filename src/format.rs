// SPDX-License-Identifier: MIT
//! HPROF container format specification
//!
//! Defines the binary framing for heap-dump containers: the file header and
//! the tagged record stream that follows it. All multi-byte fields are
//! big-endian.

use std::io::{Read, Write};

/// Every supported format name starts with this prefix ("JAVA PROFILE 1.0.1",
/// "JAVA PROFILE 1.0.2", ...)
pub const FORMAT_NAME_PREFIX: &str = "JAVA PROFILE";

/// Upper bound on the NUL-terminated format name, as a sanity check against
/// non-HPROF input
pub const MAX_FORMAT_NAME_LEN: usize = 64;

/// Record header size in bytes: tag (1) + timestamp (4) + length (4)
pub const RECORD_HEADER_SIZE: usize = 9;

/// Record tags
pub mod tag {
    /// UTF-8 string record, the only kind whose payload is rewritten
    pub const STRING_IN_UTF8: u8 = 0x01;

    /// Class load record
    pub const LOAD_CLASS: u8 = 0x02;

    /// Class unload record
    pub const UNLOAD_CLASS: u8 = 0x03;

    /// Stack frame record
    pub const STACK_FRAME: u8 = 0x04;

    /// Stack trace record
    pub const STACK_TRACE: u8 = 0x05;

    /// Allocation sites record
    pub const ALLOC_SITES: u8 = 0x06;

    /// Heap summary record
    pub const HEAP_SUMMARY: u8 = 0x07;

    /// Thread start record
    pub const START_THREAD: u8 = 0x0a;

    /// Thread end record
    pub const END_THREAD: u8 = 0x0b;

    /// Monolithic heap dump record
    pub const HEAP_DUMP: u8 = 0x0c;

    /// CPU samples record
    pub const CPU_SAMPLES: u8 = 0x0d;

    /// Control settings record
    pub const CONTROL_SETTINGS: u8 = 0x0e;

    /// Heap dump segment record
    pub const HEAP_DUMP_SEGMENT: u8 = 0x1c;

    /// Heap dump end record
    pub const HEAP_DUMP_END: u8 = 0x2c;
}

/// HPROF file header
///
/// Variable length: a NUL-terminated format name, the identifier size (4 bytes)
/// and a millisecond timestamp (8 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HprofHeader {
    /// Format name without the trailing NUL, e.g. "JAVA PROFILE 1.0.2"
    pub format_name: String,

    /// Size in bytes of object/string identifiers in the dump (4 or 8)
    pub identifier_size: u32,

    /// Dump timestamp in milliseconds since the epoch
    pub timestamp_ms: u64,
}

impl HprofHeader {
    /// Create a header with the common 1.0.2 format name
    pub fn new(identifier_size: u32, timestamp_ms: u64) -> Self {
        Self {
            format_name: "JAVA PROFILE 1.0.2".to_string(),
            identifier_size,
            timestamp_ms,
        }
    }

    /// Validate the header
    pub fn validate(&self) -> Result<(), String> {
        if !self.format_name.starts_with(FORMAT_NAME_PREFIX) {
            return Err(format!(
                "Invalid format name: expected prefix {:?}, got {:?}",
                FORMAT_NAME_PREFIX, self.format_name
            ));
        }

        if self.identifier_size != 4 && self.identifier_size != 8 {
            return Err(format!(
                "Unsupported identifier size: expected 4 or 8, got {}",
                self.identifier_size
            ));
        }

        Ok(())
    }

    /// Read a header from a reader
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, std::io::Error> {
        let mut name = Vec::new();
        loop {
            let byte = read_u8(reader)?;
            if byte == 0 {
                break;
            }
            if name.len() >= MAX_FORMAT_NAME_LEN {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "Format name exceeds maximum length",
                ));
            }
            name.push(byte);
        }

        let format_name = String::from_utf8(name).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Format name is not valid UTF-8: {}", e),
            )
        })?;

        let identifier_size = read_u32(reader)?;
        let timestamp_ms = read_u64(reader)?;

        Ok(Self {
            format_name,
            identifier_size,
            timestamp_ms,
        })
    }

    /// Write the header to a writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), std::io::Error> {
        writer.write_all(self.format_name.as_bytes())?;
        writer.write_all(&[0])?;
        writer.write_all(&self.identifier_size.to_be_bytes())?;
        writer.write_all(&self.timestamp_ms.to_be_bytes())?;

        Ok(())
    }
}

/// Header of a single record in the stream
///
/// The payload (`length` bytes) follows the header in the input and is not
/// part of this struct; only string records ever have their payload decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    /// Record kind, see [`tag`]
    pub tag: u8,

    /// Microseconds since the header timestamp
    pub time: u32,

    /// Payload length in bytes
    pub length: u32,
}

impl Record {
    /// Read a record header from a reader
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, std::io::Error> {
        let tag = read_u8(reader)?;
        let time = read_u32(reader)?;
        let length = read_u32(reader)?;

        Ok(Self { tag, time, length })
    }

    /// Write the record header to a writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), std::io::Error> {
        writer.write_all(&[self.tag])?;
        writer.write_all(&self.time.to_be_bytes())?;
        writer.write_all(&self.length.to_be_bytes())?;

        Ok(())
    }

    /// Encode the record header to bytes
    pub fn to_bytes(&self) -> [u8; RECORD_HEADER_SIZE] {
        let mut bytes = [0u8; RECORD_HEADER_SIZE];

        bytes[0] = self.tag;
        bytes[1..5].copy_from_slice(&self.time.to_be_bytes());
        bytes[5..9].copy_from_slice(&self.length.to_be_bytes());

        bytes
    }
}

/// Decoded string record
///
/// The identifier is preserved exactly on rewrite; the value is the only field
/// the remapper ever mutates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringRecord {
    /// String identifier, `identifier_size` bytes on the wire
    pub id: u64,

    /// Microseconds since the header timestamp
    pub time: u32,

    /// String content
    pub value: String,
}

pub(crate) fn read_u8<R: Read>(reader: &mut R) -> Result<u8, std::io::Error> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub(crate) fn read_u32<R: Read>(reader: &mut R) -> Result<u32, std::io::Error> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

pub(crate) fn read_u64<R: Read>(reader: &mut R) -> Result<u64, std::io::Error> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

// SPDX-License-Identifier: MIT
//! Record stream reader for HPROF containers

use std::io::{BufRead, Read};

use crate::format::{read_u32, read_u64, HprofHeader, Record, StringRecord};

/// Errors that can occur during reading
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("String record {id:#x} is not valid UTF-8: {reason}")]
    InvalidString { id: u64, reason: String },
}

/// Pull-based reader over an HPROF record stream
///
/// Usage follows the container layout: [`read_header`](Self::read_header)
/// once, then [`next_record`](Self::next_record) while
/// [`has_next`](Self::has_next) reports unread input. String record payloads
/// are decoded with [`read_string_record`](Self::read_string_record); every
/// other payload is handed off raw via [`payload`](Self::payload).
pub struct RecordReader<R: BufRead> {
    input: R,
    identifier_size: u32,
}

impl<R: BufRead> RecordReader<R> {
    /// Create a reader over an input stream positioned at the file header
    pub fn new(input: R) -> Self {
        Self {
            input,
            identifier_size: 0,
        }
    }

    /// Read and validate the file header
    ///
    /// Must be called before any record access; the identifier size it
    /// carries governs string record decoding.
    pub fn read_header(&mut self) -> Result<HprofHeader, ReadError> {
        let header = HprofHeader::read_from(&mut self.input)?;
        header.validate().map_err(ReadError::InvalidFormat)?;
        self.identifier_size = header.identifier_size;

        Ok(header)
    }

    /// Check whether another record is available
    pub fn has_next(&mut self) -> Result<bool, ReadError> {
        Ok(!self.input.fill_buf()?.is_empty())
    }

    /// Decode the next record header
    pub fn next_record(&mut self) -> Result<Record, ReadError> {
        Ok(Record::read_from(&mut self.input)?)
    }

    /// Decode the payload of a string record
    pub fn read_string_record(&mut self, record: &Record) -> Result<StringRecord, ReadError> {
        let id_size = self.identifier_size;
        if record.length < id_size {
            return Err(ReadError::InvalidRecord(format!(
                "String record of {} bytes cannot hold a {}-byte identifier",
                record.length, id_size
            )));
        }

        let id = match id_size {
            4 => read_u32(&mut self.input)? as u64,
            8 => read_u64(&mut self.input)?,
            other => {
                return Err(ReadError::InvalidRecord(format!(
                    "Unsupported identifier size {} (header not read?)",
                    other
                )))
            }
        };

        let mut bytes = vec![0u8; (record.length - id_size) as usize];
        self.input.read_exact(&mut bytes)?;

        let value = String::from_utf8(bytes).map_err(|e| ReadError::InvalidString {
            id,
            reason: e.to_string(),
        })?;

        Ok(StringRecord {
            id,
            time: record.time,
            value,
        })
    }

    /// Raw access to the unread payload of the current record
    ///
    /// Used for pass-through copying; the returned reader yields exactly
    /// `record.length` bytes (fewer only if the input is truncated).
    pub fn payload(&mut self, record: &Record) -> std::io::Take<&mut R> {
        self.input.by_ref().take(record.length as u64)
    }
}

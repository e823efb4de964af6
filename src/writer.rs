// SPDX-License-Identifier: MIT
//! Record stream writer for HPROF containers

use std::io::{Read, Write};

use crate::format::{tag, HprofHeader, Record, StringRecord};

/// Errors that can occur during writing
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record too large: {0}")]
    RecordTooLarge(String),

    #[error("Record payload truncated: expected {expected} bytes, copied {actual}")]
    TruncatedPayload { expected: u64, actual: u64 },

    #[error("Identifier {id:#x} does not fit the {size}-byte wire size")]
    IdentifierOverflow { id: u64, size: u32 },
}

/// Serializer for an HPROF record stream
///
/// Mirrors [`RecordReader`](crate::reader::RecordReader): a header write
/// followed by per-record writes, either re-encoded string records or raw
/// copies.
pub struct RecordWriter<W: Write> {
    output: W,
    identifier_size: u32,
}

impl<W: Write> RecordWriter<W> {
    /// Create a writer over an output stream
    pub fn new(output: W) -> Self {
        Self {
            output,
            identifier_size: 0,
        }
    }

    /// Write the file header
    ///
    /// Must be called before any record write; string record encoding uses
    /// the identifier size recorded here.
    pub fn write_header(&mut self, header: &HprofHeader) -> Result<(), WriteError> {
        header.write_to(&mut self.output)?;
        self.identifier_size = header.identifier_size;

        Ok(())
    }

    /// Write a record header
    pub fn write_record_header(&mut self, record: &Record) -> Result<(), WriteError> {
        Ok(record.write_to(&mut self.output)?)
    }

    /// Encode and write a string record
    ///
    /// The declared length is recomputed from the current value; identifier
    /// and timestamp are written back unchanged.
    pub fn write_string_record(&mut self, string: &StringRecord) -> Result<(), WriteError> {
        let id_size = self.identifier_size;
        let length = u32::try_from(string.value.len())
            .ok()
            .and_then(|n| n.checked_add(id_size))
            .ok_or_else(|| {
                WriteError::RecordTooLarge(format!(
                    "String of {} bytes exceeds the record length field",
                    string.value.len()
                ))
            })?;

        self.write_record_header(&Record {
            tag: tag::STRING_IN_UTF8,
            time: string.time,
            length,
        })?;

        match id_size {
            4 => {
                let id = u32::try_from(string.id).map_err(|_| WriteError::IdentifierOverflow {
                    id: string.id,
                    size: id_size,
                })?;
                self.output.write_all(&id.to_be_bytes())?;
            }
            _ => self.output.write_all(&string.id.to_be_bytes())?,
        }
        self.output.write_all(string.value.as_bytes())?;

        Ok(())
    }

    /// Copy a record unmodified: header plus `record.length` raw payload bytes
    pub fn copy_record<P: Read>(
        &mut self,
        record: &Record,
        mut payload: P,
    ) -> Result<(), WriteError> {
        self.write_record_header(record)?;

        let copied = std::io::copy(&mut payload, &mut self.output)?;
        if copied != record.length as u64 {
            return Err(WriteError::TruncatedPayload {
                expected: record.length as u64,
                actual: copied,
            });
        }

        Ok(())
    }

    /// Flush the underlying stream
    pub fn flush(&mut self) -> Result<(), WriteError> {
        Ok(self.output.flush()?)
    }

    /// Consume the writer and return the underlying stream
    pub fn into_inner(self) -> W {
        self.output
    }
}

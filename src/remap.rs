// SPDX-License-Identifier: MIT
//! Streaming record remapper, the core of the tool
//!
//! Pulls records off a [`RecordReader`] one at a time and pushes them to a
//! [`RecordWriter`] in the same order: string records get their value run
//! through the two mapping tables, every other record is copied
//! byte-for-byte.

use std::io::{BufRead, Write};

use tracing::debug;

use crate::format::tag;
use crate::mapping::MappingTable;
use crate::reader::{ReadError, RecordReader};
use crate::writer::{RecordWriter, WriteError};

/// Errors that can occur during a remapping run
#[derive(Debug, thiserror::Error)]
pub enum RemapError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Counters for one completed run
#[derive(Debug, Clone, Copy, Default)]
pub struct RemapStats {
    /// Total records seen (and emitted)
    pub records: u64,

    /// String records whose value actually changed
    pub strings_remapped: u64,
}

/// Single-pass identifier remapper over an HPROF record stream
///
/// Holds the two mapping tables for the whole run; per-record state never
/// outlives the current loop iteration, so memory use is independent of the
/// stream length.
pub struct Remapper {
    methods: MappingTable,
    fields: MappingTable,
}

impl Remapper {
    /// Create a remapper from the method and field tables
    pub fn new(methods: MappingTable, fields: MappingTable) -> Self {
        Self { methods, fields }
    }

    /// Substitute one string value
    ///
    /// Two chained stages: the method table's result feeds the field table's
    /// lookup, so `a -> b` (methods) plus `b -> c` (fields) rewrites `a` to
    /// `c`. Values absent from both tables come back unchanged.
    pub fn remap_value<'a>(&'a self, value: &'a str) -> &'a str {
        self.fields.remap(self.methods.remap(value))
    }

    /// Drain the input stream into the output stream
    ///
    /// Copies the header, then transforms records in arrival order until the
    /// input is exhausted. The first decode or write failure aborts the run;
    /// bytes already written stay written.
    pub fn run<R: BufRead, W: Write>(
        &self,
        reader: &mut RecordReader<R>,
        writer: &mut RecordWriter<W>,
    ) -> Result<RemapStats, RemapError> {
        let header = reader.read_header()?;
        writer.write_header(&header)?;

        let mut stats = RemapStats::default();
        while reader.has_next()? {
            let record = reader.next_record()?;
            if record.tag == tag::STRING_IN_UTF8 {
                let mut string = reader.read_string_record(&record)?;
                let remapped = self.remap_value(&string.value).to_string();
                if remapped != string.value {
                    debug!("Remapped {:#x}: {} -> {}", string.id, string.value, remapped);
                    string.value = remapped;
                    stats.strings_remapped += 1;
                }
                writer.write_string_record(&string)?;
            } else {
                writer.copy_record(&record, reader.payload(&record))?;
            }
            stats.records += 1;
        }

        Ok(stats)
    }
}

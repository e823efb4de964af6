// SPDX-License-Identifier: MIT
//! # HPROF Remap
//!
//! A streaming rewriter for identifier strings embedded in HPROF heap-dump
//! containers. After a name-obfuscation step has been reversed into CSV
//! mapping tables, this crate substitutes the obfuscated method and field
//! names in a captured dump with their original names, leaving every other
//! byte of the container unchanged.
//!
//! ## Container Overview
//!
//! An HPROF file is a header followed by a flat sequence of tagged records:
//!
//! ```text
//! HPROF container layout (big-endian)
//! ===================================
//!
//! Header (variable size):
//! - Format name: NUL-terminated, e.g. "JAVA PROFILE 1.0.2"
//! - Identifier size: 4 or 8 (4 bytes)
//! - Timestamp: milliseconds since the epoch (8 bytes)
//!
//! Record (repeated until end of input):
//! - Tag: record kind (1 byte)
//! - Time: microseconds since the header timestamp (4 bytes)
//! - Length: payload size (4 bytes)
//! - Payload: `Length` bytes
//!
//! String record payload (tag 0x01):
//! - Identifier: `Identifier size` bytes
//! - Value: UTF-8 text, the rest of the payload
//! ```
//!
//! Only string records (tag `0x01`) are ever decoded; their value is run
//! through the method mapping table and the result through the field mapping
//! table. Every other record is copied to the output verbatim, in arrival
//! order, so the rewritten dump keeps its object graph, class layout, string
//! identifiers and record ordering intact.
//!
//! ## Usage
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::{BufReader, BufWriter};
//! use std::path::Path;
//!
//! use hprof_remap::{load_mappings, RecordReader, RecordWriter, Remapper};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mappings = load_mappings(Path::new("mappings.zip"))?;
//!
//! let mut reader = RecordReader::new(BufReader::new(File::open("app.hprof")?));
//! let mut writer = RecordWriter::new(BufWriter::new(File::create("app-readable.hprof")?));
//!
//! let stats = Remapper::new(mappings.methods, mappings.fields).run(&mut reader, &mut writer)?;
//! writer.flush()?;
//! println!("remapped {} strings", stats.strings_remapped);
//! # Ok(())
//! # }
//! ```

pub mod format;
pub mod mapping;
pub mod reader;
pub mod remap;
pub mod writer;

// Re-export main types
pub use format::{tag, HprofHeader, Record, StringRecord};
pub use mapping::{load_mappings, MappingError, MappingSet, MappingTable};
pub use reader::{ReadError, RecordReader};
pub use remap::{RemapError, RemapStats, Remapper};
pub use writer::{RecordWriter, WriteError};

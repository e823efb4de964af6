// SPDX-License-Identifier: MIT
//! End-to-end remapping tests against real files on disk

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tempfile::TempDir;

use hprof_remap::{
    load_mappings, tag, HprofHeader, MappingError, Record, RecordReader, RecordWriter, Remapper,
    StringRecord,
};

fn write_file(dir: &Path, name: &str, content: &[u8]) {
    let mut file = File::create(dir.join(name)).unwrap();
    file.write_all(content).unwrap();
}

fn write_mapping_archive(path: &Path, entries: &[(&str, &str)]) {
    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// One string record "a", one opaque record with an arbitrary payload
fn write_input_dump(path: &Path) -> Vec<u8> {
    let mut writer = RecordWriter::new(Vec::new());
    writer.write_header(&HprofHeader::new(4, 1_534_789_000)).unwrap();
    writer
        .write_string_record(&StringRecord {
            id: 0x42,
            time: 0,
            value: "a".to_string(),
        })
        .unwrap();
    writer
        .copy_record(
            &Record {
                tag: tag::LOAD_CLASS,
                time: 11,
                length: 8,
            },
            &[9u8, 8, 7, 6, 5, 4, 3, 2][..],
        )
        .unwrap();

    let bytes = writer.into_inner();
    std::fs::write(path, &bytes).unwrap();
    bytes
}

fn remap_file(mapping_location: &Path, input: &Path, output: &Path) {
    let mappings = load_mappings(mapping_location).unwrap();
    let mut reader = RecordReader::new(BufReader::new(File::open(input).unwrap()));
    let mut writer = RecordWriter::new(BufWriter::new(File::create(output).unwrap()));

    Remapper::new(mappings.methods, mappings.fields)
        .run(&mut reader, &mut writer)
        .unwrap();
    writer.flush().unwrap();
}

#[test]
fn end_to_end_directory_mappings() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "methods.csv", b"a,b\n");
    write_file(dir.path(), "fields.csv", b"b,c\n");

    let input_path = dir.path().join("input.hprof");
    let output_path = dir.path().join("output.hprof");
    let input_bytes = write_input_dump(&input_path);

    remap_file(dir.path(), &input_path, &output_path);

    let output_bytes = std::fs::read(&output_path).unwrap();
    let mut reader = RecordReader::new(output_bytes.as_slice());
    let header = reader.read_header().unwrap();
    assert_eq!(header.timestamp_ms, 1_534_789_000);

    // First record: the chained substitution a -> b -> c, same identifier
    let record = reader.next_record().unwrap();
    assert_eq!(record.tag, tag::STRING_IN_UTF8);
    let string = reader.read_string_record(&record).unwrap();
    assert_eq!(string.id, 0x42);
    assert_eq!(string.value, "c");

    // Second record: byte-identical to the input
    let record = reader.next_record().unwrap();
    assert_eq!(record.tag, tag::LOAD_CLASS);
    assert_eq!(record.time, 11);
    let mut payload = Vec::new();
    std::io::copy(&mut reader.payload(&record), &mut payload).unwrap();
    assert_eq!(payload, &[9u8, 8, 7, 6, 5, 4, 3, 2]);
    assert!(!reader.has_next().unwrap());

    // The opaque tail of both files must match exactly
    assert_eq!(
        &output_bytes[output_bytes.len() - 17..],
        &input_bytes[input_bytes.len() - 17..]
    );
}

#[test]
fn archive_and_directory_mappings_are_equivalent() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "methods.csv", b"a,b\nm1,toString,extra\n");
    write_file(dir.path(), "fields.csv", b"b,c\n");

    let archive_path = dir.path().join("mappings.zip");
    write_mapping_archive(
        &archive_path,
        &[("methods.csv", "a,b\nm1,toString,extra\n"), ("fields.csv", "b,c\n")],
    );

    let from_dir = load_mappings(dir.path()).unwrap();
    let from_archive = load_mappings(&archive_path).unwrap();
    assert_eq!(from_dir, from_archive);
    assert_eq!(from_archive.methods.len(), 2);
    assert_eq!(from_archive.methods.get("m1"), Some("toString"));
}

#[test]
fn end_to_end_archive_mappings() {
    let dir = TempDir::new().unwrap();
    let archive_path = dir.path().join("mappings.zip");
    write_mapping_archive(&archive_path, &[("methods.csv", "a,b\n"), ("fields.csv", "b,c\n")]);

    let input_path = dir.path().join("input.hprof");
    let output_path = dir.path().join("output.hprof");
    write_input_dump(&input_path);

    remap_file(&archive_path, &input_path, &output_path);

    let output_bytes = std::fs::read(&output_path).unwrap();
    let mut reader = RecordReader::new(output_bytes.as_slice());
    reader.read_header().unwrap();
    let record = reader.next_record().unwrap();
    let string = reader.read_string_record(&record).unwrap();
    assert_eq!(string.value, "c");
}

#[test]
fn archive_missing_entry_is_fatal() {
    let dir = TempDir::new().unwrap();
    let archive_path = dir.path().join("mappings.zip");
    write_mapping_archive(&archive_path, &[("methods.csv", "a,b\n")]);

    let err = load_mappings(&archive_path).unwrap_err();
    match err {
        MappingError::MissingEntry(name) => assert_eq!(name, "fields.csv"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_zip_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let bogus = dir.path().join("mappings.zip");
    write_file(dir.path(), "mappings.zip", b"this is not an archive");

    assert!(matches!(
        load_mappings(&bogus),
        Err(MappingError::Archive(_))
    ));
}

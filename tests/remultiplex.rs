use std::collections::HashMap;
use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use seq_io::fastq::Record;

use scjobs::command::Remultiplex;
use scjobs::command::RemultiplexParams;
use scjobs::fileformat::barcode_mapping::read_barcode_mapping;
use scjobs::fileformat::open_fastq;

fn fastq_text(prefix: &str, n: usize) -> String {
    (0..n)
        .map(|i| format!("@{}_{} extra\nACGTAC\n+\nFFFF:F\n", prefix, i))
        .collect()
}

fn write_plain(p: &Path, text: &str) {
    fs::write(p, text).unwrap();
}

fn write_gz(p: &Path, text: &str) {
    let mut enc = GzEncoder::new(File::create(p).unwrap(), Compression::default());
    enc.write_all(text.as_bytes()).unwrap();
    enc.finish().unwrap();
}

/// (head, seq, qual) of every record
fn read_all(p: &Path) -> Vec<(String, String, String)> {
    let mut reader = open_fastq(p).unwrap();
    let mut out = Vec::new();
    while let Some(r) = reader.next() {
        let r = r.unwrap();
        out.push((
            String::from_utf8_lossy(r.head()).into_owned(),
            String::from_utf8_lossy(r.seq()).into_owned(),
            String::from_utf8_lossy(r.qual()).into_owned(),
        ));
    }
    out
}

#[test]
fn barcodes_every_read_of_every_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cells");
    fs::create_dir(&input).unwrap();
    write_plain(&input.join("cellA.fastq"), &fastq_text("a", 5));
    write_gz(&input.join("cellB.fq.gz"), &fastq_text("b", 3));
    write_plain(&input.join("empty.fq"), "");
    write_plain(&input.join("notes.txt"), "not a fastq");

    let mut params = RemultiplexParams::new(input, dir.path().join("out/merged"));
    params.threads_work = 2;
    params.chunk_size = 2;
    let summary = Remultiplex::run(&params).unwrap();

    assert_eq!(summary.total_sequences, 8);
    assert_eq!(summary.files_processed, 2);
    assert_eq!(summary.files_empty, 1);
    assert_eq!(summary.files_failed, 0);

    let output = dir.path().join("out/merged.fastq.gz");
    let mapping_path = dir.path().join("out/merged_barcode_mapping.txt");
    assert_eq!(summary.output.as_deref(), Some(output.as_path()));
    assert_eq!(summary.mapping.as_deref(), Some(mapping_path.as_path()));

    let mapping = read_barcode_mapping(&mapping_path).unwrap();
    let by_file: HashMap<String, String> = mapping
        .into_iter()
        .map(|a| (a.file_name, a.barcode))
        .collect();
    assert_eq!(by_file["cellA.fastq"], "AAAAAAAA");
    assert_eq!(by_file["cellB.fq.gz"], "AAAAAAAT");
    assert_eq!(by_file["empty.fq"], "AAAAAAAC");
    assert!(!by_file.contains_key("notes.txt"));

    let records = read_all(&output);
    assert_eq!(records.len(), 8);
    for (head, seq, qual) in &records {
        let expected = if head.starts_with("a_") { "AAAAAAAA" } else { "AAAAAAAT" };
        assert!(head.ends_with(" extra"));
        assert_eq!(seq, &format!("{}ACGTAC", expected));
        assert_eq!(qual, "IIIIIIIIFFFF:F");
    }
    assert_eq!(records.iter().filter(|r| r.0.starts_with("a_")).count(), 5);
}

#[test]
fn max_reads_per_file_caps_each_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cells");
    fs::create_dir(&input).unwrap();
    write_plain(&input.join("c1.fastq"), &fastq_text("c1", 10));
    write_plain(&input.join("c2.fastq"), &fastq_text("c2", 2));

    let mut params = RemultiplexParams::new(input, dir.path().join("capped.fastq.gz"));
    params.threads_work = 1;
    params.barcode_length = 4;
    params.max_reads_per_file = Some(3);
    let summary = Remultiplex::run(&params).unwrap();

    assert_eq!(summary.total_sequences, 5);
    let records = read_all(&dir.path().join("capped.fastq.gz"));
    assert_eq!(records.len(), 5);
    assert!(records.iter().all(|(_, seq, qual)| seq.len() == qual.len()));
}

#[test]
fn empty_directory_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let params = RemultiplexParams::new(dir.path().to_path_buf(), dir.path().join("none.fastq.gz"));
    let summary = Remultiplex::run(&params).unwrap();
    assert_eq!(summary.total_sequences, 0);
    assert!(summary.output.is_none());
    assert!(!dir.path().join("none.fastq.gz").exists());
}

#[test]
fn too_many_files_for_the_barcode_length() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..5 {
        write_plain(&dir.path().join(format!("cell{}.fq", i)), &fastq_text("x", 1));
    }
    let mut params = RemultiplexParams::new(dir.path().to_path_buf(), dir.path().join("out.fastq.gz"));
    params.barcode_length = 1;
    assert!(Remultiplex::run(&params).is_err());
}

#[test]
fn invalid_settings_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut params = RemultiplexParams::new(dir.path().to_path_buf(), dir.path().join("out"));
    params.chunk_size = 0;
    assert!(Remultiplex::run(&params).is_err());

    let mut params = RemultiplexParams::new(dir.path().to_path_buf(), dir.path().join("out"));
    params.threads_work = 0;
    let e = Remultiplex::run(&params).unwrap_err();
    assert!(e.to_string().contains("at least one core"), "{}", e);

    let params = RemultiplexParams::new(dir.path().join("missing"), dir.path().join("out"));
    assert!(Remultiplex::run(&params).is_err());
}

#[test]
fn malformed_file_is_counted_as_failed() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cells");
    fs::create_dir(&input).unwrap();
    write_plain(&input.join("bad.fastq"), "this is not a fastq record\n");
    write_plain(&input.join("good.fastq"), &fastq_text("g", 4));

    let mut params = RemultiplexParams::new(input, dir.path().join("out.fastq.gz"));
    params.threads_work = 2;
    let summary = Remultiplex::run(&params).unwrap();

    assert_eq!(summary.files_failed, 1);
    assert_eq!(summary.files_processed, 1);
    assert_eq!(summary.total_sequences, 4);
    let records = read_all(&dir.path().join("out.fastq.gz"));
    assert!(records.iter().all(|(_, seq, _)| seq.starts_with("AAAAAAAT")));
}

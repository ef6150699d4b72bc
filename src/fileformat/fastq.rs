use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use seq_io::fastq::Reader as FastqReader;

/// Open a FASTQ file; gzip/bzip2/xz compression is detected from the content
pub fn open_fastq(file_handle: &Path) -> anyhow::Result<FastqReader<Box<dyn std::io::Read>>> {
    let opened_handle = File::open(file_handle)
        .with_context(|| format!("Could not open fastq file {}", file_handle.display()))?;

    let (reader, compression) = niffler::get_reader(Box::new(opened_handle))
        .with_context(|| format!("Could not open fastq file {}", file_handle.display()))?;

    debug!(
        "Opened file {} with compression {:?}",
        file_handle.display(),
        compression
    );
    Ok(FastqReader::new(reader))
}

////////// Write one FASTQ read
pub fn write_fastq_read<W: Write>(
    writer: &mut W,
    head: &[u8],
    seq: &[u8],
    qual: &[u8],
) -> std::io::Result<()> {
    writer.write_all(b"@")?;
    writer.write_all(head)?;
    writer.write_all(b"\n")?;
    writer.write_all(seq)?;
    writer.write_all(b"\n+\n")?;
    writer.write_all(qual)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Gzip compressed FASTQ output
pub struct GzFastqWriter {
    writer: GzEncoder<BufWriter<File>>,
    records: u64,
}

impl GzFastqWriter {
    pub fn create(path: &Path) -> anyhow::Result<GzFastqWriter> {
        let out_buffer = File::create(path)
            .with_context(|| format!("Failed to create fastq.gz output file {}", path.display()))?;
        let writer = GzEncoder::new(BufWriter::new(out_buffer), Compression::default());
        Ok(GzFastqWriter { writer, records: 0 })
    }

    pub fn write_record(&mut self, head: &[u8], seq: &[u8], qual: &[u8]) -> std::io::Result<()> {
        self.records += 1;
        write_fastq_read(&mut self.writer, head, seq, qual)
    }

    /// Already formatted FASTQ text
    pub fn write_raw(&mut self, data: &[u8], records: u64) -> std::io::Result<()> {
        self.records += records;
        self.writer.write_all(data)
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    /// Write the gzip trailer and flush. Dropping without this leaves a truncated file
    pub fn finish(self) -> anyhow::Result<u64> {
        let mut inner = self.writer.finish().context("Failed to finish gzip stream")?;
        inner.flush().context("Failed to flush fastq.gz output")?;
        Ok(self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seq_io::fastq::Record;

    #[test]
    fn gz_roundtrip_through_niffler() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.fastq.gz");

        let mut w = GzFastqWriter::create(&path).unwrap();
        w.write_record(b"r1 extra", b"ACGT", b"IIII").unwrap();
        w.write_raw(b"@r2\nGG\n+\n##\n", 1).unwrap();
        assert_eq!(w.finish().unwrap(), 2);

        let mut reader = open_fastq(&path).unwrap();
        let rec = reader.next().unwrap().unwrap();
        assert_eq!(rec.head(), b"r1 extra");
        assert_eq!(rec.seq(), b"ACGT");
        let rec = reader.next().unwrap().unwrap();
        assert_eq!(rec.qual(), b"##");
        assert!(reader.next().is_none());
    }

    #[test]
    fn missing_file_has_context() {
        let e = open_fastq(Path::new("/nonexistent/reads.fq")).err().unwrap();
        assert!(e.to_string().contains("/nonexistent/reads.fq"));
    }
}

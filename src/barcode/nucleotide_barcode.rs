use crate::fileformat::fastq::write_fastq_read;
use crate::runtime::Error;

/// Order of the product; the last position varies fastest
pub const NUCLEOTIDES: [u8; 4] = [b'A', b'T', b'C', b'G'];

/// Phred 40, used for the synthetic barcode bases
pub const BARCODE_QUALITY: u8 = b'I';

/// Number of distinct barcodes of a given length, None if it does not fit in usize
pub fn barcode_capacity(length: usize) -> Option<usize> {
    4usize.checked_pow(u32::try_from(length).ok()?)
}

/// The i-th barcode in the product order: AA..A, AA..T, AA..C, AA..G, AA..TA, ...
pub fn barcode_at(mut index: usize, length: usize) -> String {
    let mut bc = vec![NUCLEOTIDES[0]; length];
    for pos in (0..length).rev() {
        bc[pos] = NUCLEOTIDES[index % 4];
        index /= 4;
    }
    String::from_utf8_lossy(&bc).into_owned()
}

/// The first `n` barcodes of the given length, all distinct
pub fn generate_barcodes(n: usize, length: usize) -> anyhow::Result<Vec<String>> {
    if length == 0 {
        return Err(Error::config_not_valid("barcode length must be at least 1").into());
    }
    if let Some(capacity) = barcode_capacity(length) {
        if n > capacity {
            return Err(Error::config_not_valid(format!(
                "{} files need more barcodes than the {} available at length {}",
                n, capacity, length
            ))
            .into());
        }
    }
    Ok((0..n).map(|i| barcode_at(i, length)).collect())
}

/// Prepends a fixed barcode to reads, padding the quality string to match
#[derive(Debug, Clone)]
pub struct BarcodePrefixer {
    barcode: Vec<u8>,
    seq: Vec<u8>,
    qual: Vec<u8>,
}

impl BarcodePrefixer {
    pub fn new(barcode: &str) -> BarcodePrefixer {
        BarcodePrefixer {
            barcode: barcode.as_bytes().to_vec(),
            seq: Vec::new(),
            qual: Vec::new(),
        }
    }

    /// Append one barcoded FASTQ record to `out`
    pub fn write_record(
        &mut self,
        out: &mut Vec<u8>,
        head: &[u8],
        seq: &[u8],
        qual: &[u8],
    ) -> std::io::Result<()> {
        self.seq.clear();
        self.seq.extend_from_slice(&self.barcode);
        self.seq.extend_from_slice(seq);

        self.qual.clear();
        self.qual.resize(self.barcode.len(), BARCODE_QUALITY);
        self.qual.extend_from_slice(qual);

        write_fastq_read(out, head, &self.seq, &self.qual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn product_order() {
        let bcs = generate_barcodes(6, 2).unwrap();
        assert_eq!(bcs, vec!["AA", "AT", "AC", "AG", "TA", "TT"]);
    }

    #[test]
    fn default_length_starts_with_all_a() {
        let bcs = generate_barcodes(3, 8).unwrap();
        assert_eq!(bcs, vec!["AAAAAAAA", "AAAAAAAT", "AAAAAAAC"]);
    }

    #[test]
    fn full_space_is_unique() {
        let bcs = generate_barcodes(256, 4).unwrap();
        let unique: HashSet<&String> = bcs.iter().collect();
        assert_eq!(unique.len(), 256);
        assert_eq!(bcs.last().unwrap(), "GGGG");
    }

    #[test]
    fn capacity_is_enforced() {
        assert!(generate_barcodes(17, 2).is_err());
        assert!(generate_barcodes(1, 0).is_err());
        assert!(generate_barcodes(0, 3).unwrap().is_empty());
        assert_eq!(barcode_capacity(40), None);
    }

    #[test]
    fn prefixer_pads_quality() {
        let mut p = BarcodePrefixer::new("ACGT");
        let mut out = Vec::new();
        p.write_record(&mut out, b"read1 1:N:0", b"TTT", b"#FF").unwrap();
        assert_eq!(out, b"@read1 1:N:0\nACGTTTT\n+\nIIII#FF\n".to_vec());
    }
}

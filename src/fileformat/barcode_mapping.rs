use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use anyhow::Context;

/// One input file and the barcode prepended to its reads
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BarcodeAssignment {
    #[serde(rename = "Original_File")]
    pub file_name: String,
    #[serde(rename = "Barcode")]
    pub barcode: String,
}

/// TSV with header `Original_File\tBarcode`
pub fn write_barcode_mapping(path: &Path, assignments: &[BarcodeAssignment]) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to create barcode mapping {}", path.display()))?;
    for a in assignments {
        writer.serialize(a)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_barcode_mapping(path: &Path) -> anyhow::Result<Vec<BarcodeAssignment>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to open barcode mapping {}", path.display()))?;
    let mut out = Vec::new();
    for row in reader.deserialize() {
        out.push(row.with_context(|| format!("Invalid row in {}", path.display()))?);
    }
    Ok(out)
}

/// One barcode per line, as kb count -w expects
pub fn write_whitelist(path: &Path, assignments: &[BarcodeAssignment]) -> anyhow::Result<()> {
    let f = File::create(path)
        .with_context(|| format!("Failed to create whitelist {}", path.display()))?;
    let mut w = BufWriter::new(f);
    for a in assignments {
        writeln!(w, "{}", a.barcode)?;
    }
    w.flush()?;
    Ok(())
}

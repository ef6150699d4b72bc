use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::Context;
use log::warn;
use regex::Regex;
use walkdir::WalkDir;

use crate::fileformat::is_fastq_name;
use crate::runtime::Error;
use crate::utils::file_stem_no_gz;

/// All FASTQ files of one sample. Several entries per read mean several lanes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqSample {
    pub name: String,
    pub r1: Vec<PathBuf>,
    pub r2: Vec<PathBuf>,
}

impl FastqSample {
    pub fn is_paired(&self) -> bool {
        !self.r2.is_empty()
    }

    /// (R1, R2) per lane
    pub fn lanes(&self) -> Vec<(PathBuf, Option<PathBuf>)> {
        self.r1
            .iter()
            .enumerate()
            .map(|(i, r1)| (r1.clone(), self.r2.get(i).cloned()))
            .collect()
    }

    /// R1, R2, R1, R2... as kb count wants them
    pub fn interleaved(&self) -> Vec<PathBuf> {
        self.lanes()
            .into_iter()
            .flat_map(|(r1, r2)| std::iter::once(r1).chain(r2))
            .collect()
    }
}

/// Regular FASTQ files directly inside a directory, sorted by file name
pub fn list_fastq_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::file_not_found(dir).into());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if is_fastq_name(&entry.file_name().to_string_lossy()) {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

fn read_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<sample>.+?)(?:_S\d+)?(?:_L\d{3})?[._]R?(?P<read>[12])(?:_001)?$")
            .expect("read name pattern is valid")
    })
}

/// Split a FASTQ file name into sample name and read number (1/2).
/// Files without a read marker are single-end reads of a sample named after the file
pub fn parse_read_name(file_name: &str) -> (String, u8) {
    let stem = file_stem_no_gz(file_name);
    match read_name_regex().captures(stem) {
        Some(caps) => {
            let read = if &caps["read"] == "2" { 2 } else { 1 };
            (caps["sample"].to_string(), read)
        }
        None => (stem.to_string(), 1),
    }
}

/// Group FASTQ files into samples, sorted by sample name
pub fn pair_samples(files: &[PathBuf]) -> anyhow::Result<Vec<FastqSample>> {
    let mut samples: BTreeMap<String, FastqSample> = BTreeMap::new();
    for f in files {
        let file_name = f
            .file_name()
            .ok_or_else(|| Error::file_not_valid(f, Some("no file name")))?
            .to_string_lossy();
        let (name, read) = parse_read_name(&file_name);
        let sample = samples.entry(name.clone()).or_insert_with(|| FastqSample {
            name,
            r1: Vec::new(),
            r2: Vec::new(),
        });
        if read == 2 {
            sample.r2.push(f.clone());
        } else {
            sample.r1.push(f.clone());
        }
    }

    for s in samples.values_mut() {
        s.r1.sort();
        s.r2.sort();
        if s.r1.is_empty() {
            return Err(Error::config_not_valid(format!(
                "sample {} has R2 reads but no R1 ({})",
                s.name,
                s.r2[0].display()
            ))
            .into());
        }
        if s.is_paired() && s.r1.len() != s.r2.len() {
            return Err(Error::config_not_valid(format!(
                "sample {} has {} R1 files but {} R2 files",
                s.name,
                s.r1.len(),
                s.r2.len()
            ))
            .into());
        }
    }
    Ok(samples.into_values().collect())
}

/// Discover and pair all samples in a directory
pub fn discover_samples(dir: &Path) -> anyhow::Result<Vec<FastqSample>> {
    let files = list_fastq_files(dir)?;
    if files.is_empty() {
        warn!("No FASTQ files found in {}", dir.display());
    }
    pair_samples(&files)
}

#[derive(Debug, serde::Deserialize, Eq, PartialEq, Clone)]
struct SampleSheetRow {
    name: String,
    r1: PathBuf,
    #[serde(default)]
    r2: Option<PathBuf>,
}

/// Read a tab separated sample sheet with columns name, r1 and optionally r2.
/// Relative paths are taken relative to the sheet. Rows sharing a name are lanes
pub fn read_sample_sheet(p: &Path) -> anyhow::Result<Vec<FastqSample>> {
    let f = File::open(p).map_err(|_| Error::file_not_found(p))?;
    let base = p.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(BufReader::new(f));

    let mut files = BTreeMap::<String, FastqSample>::new();
    for result in reader.deserialize() {
        let row: SampleSheetRow = result.map_err(|e| {
            Error::parse_error(format!("sample sheet {}", p.display()), Some(e.to_string()))
        })?;
        let sample = files.entry(row.name.clone()).or_insert_with(|| FastqSample {
            name: row.name.clone(),
            r1: Vec::new(),
            r2: Vec::new(),
        });
        sample.r1.push(base.join(&row.r1));
        if let Some(r2) = row.r2.filter(|r2| !r2.as_os_str().is_empty()) {
            sample.r2.push(base.join(r2));
        }
    }

    for s in files.values() {
        if s.is_paired() && s.r1.len() != s.r2.len() {
            return Err(Error::file_not_valid(
                p,
                Some(format!("sample {} mixes paired and single-end rows", s.name)),
            )
            .into());
        }
    }
    if files.is_empty() {
        warn!("empty sample sheet {}", p.display());
    }
    Ok(files.into_values().collect())
}

/// Keep only the named samples, in the order given. Unknown names are an error
pub fn select_samples(
    samples: Vec<FastqSample>,
    names: &[String],
) -> anyhow::Result<Vec<FastqSample>> {
    if names.is_empty() {
        return Ok(samples);
    }
    let mut by_name: BTreeMap<String, FastqSample> =
        samples.into_iter().map(|s| (s.name.clone(), s)).collect();
    names
        .iter()
        .map(|n| {
            by_name
                .remove(n)
                .ok_or_else(|| Error::config_not_valid(format!("no FASTQ files for sample {}", n)).into())
        })
        .collect()
}

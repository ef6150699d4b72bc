use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use anyhow::bail;
use crossbeam::channel::Sender;
use linya::Progress;
use log::debug;
use log::info;
use log::warn;
use seq_io::fastq::Record;

use crate::barcode::generate_barcodes;
use crate::barcode::BarcodePrefixer;
use crate::fileformat::barcode_mapping::write_barcode_mapping;
use crate::fileformat::list_fastq_files;
use crate::fileformat::open_fastq;
use crate::fileformat::BarcodeAssignment;
use crate::fileformat::GzFastqWriter;
use crate::runtime::Error;

pub const DEFAULT_BARCODE_LENGTH: usize = 8;
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;
pub const MAX_DEFAULT_CORES: usize = 16;

const OUTPUT_SUFFIX: &str = ".fastq.gz";
const MAPPING_SUFFIX: &str = "_barcode_mapping.txt";

/// Rough throughput used for the up-front time estimate
const SECONDS_PER_GB_PER_CORE: f64 = 10.0;

#[derive(Clone, Debug)]
pub struct RemultiplexParams {
    pub path_in: PathBuf,
    pub path_out: PathBuf,
    pub barcode_length: usize,
    pub threads_work: usize,
    pub chunk_size: usize,
    pub max_reads_per_file: Option<u64>,
    /// Draw a per-file progress bar on stderr
    pub show_progress: bool,
}

impl RemultiplexParams {
    pub fn new(path_in: PathBuf, path_out: PathBuf) -> RemultiplexParams {
        RemultiplexParams {
            path_in,
            path_out: normalize_output_path(&path_out),
            barcode_length: DEFAULT_BARCODE_LENGTH,
            threads_work: default_cores(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_reads_per_file: None,
            show_progress: false,
        }
    }

    pub fn path_mapping(&self) -> PathBuf {
        mapping_path_for(&self.path_out)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemultiplexSummary {
    pub total_sequences: u64,
    pub files_processed: usize,
    pub files_empty: usize,
    pub files_failed: usize,
    pub output: Option<PathBuf>,
    pub mapping: Option<PathBuf>,
    pub assignments: Vec<BarcodeAssignment>,
    pub elapsed: Duration,
}

/// All available cores, but at most 16
pub fn default_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_DEFAULT_CORES)
}

/// Output is always gzipped FASTQ; add the extension if missing
pub fn normalize_output_path(p: &Path) -> PathBuf {
    let s = p.to_string_lossy();
    if s.ends_with(OUTPUT_SUFFIX) {
        p.to_path_buf()
    } else {
        PathBuf::from(format!("{}{}", s, OUTPUT_SUFFIX))
    }
}

/// "out/run1.fastq.gz" gives "out/run1_barcode_mapping.txt"
pub fn mapping_path_for(output: &Path) -> PathBuf {
    let s = output.to_string_lossy();
    let base = s.strip_suffix(OUTPUT_SUFFIX).unwrap_or(&s);
    PathBuf::from(format!("{}{}", base, MAPPING_SUFFIX))
}

pub fn estimate_processing_time(total_size_gb: f64, num_cores: usize) -> Duration {
    let secs = total_size_gb * SECONDS_PER_GB_PER_CORE / num_cores.max(1) as f64;
    Duration::from_secs_f64(secs.max(0.0))
}

enum WorkerMsg {
    Chunk { data: Vec<u8>, records: u64 },
    Done { file_idx: usize, result: anyhow::Result<u64> },
}

pub struct Remultiplex {}

impl Remultiplex {
    pub fn run(params: &RemultiplexParams) -> anyhow::Result<RemultiplexSummary> {
        let start_time = Instant::now();

        if params.chunk_size == 0 {
            bail!(Error::config_not_valid("chunk size must be at least 1"));
        }
        if params.threads_work == 0 {
            bail!(Error::config_not_valid("at least one core is needed"));
        }

        info!("Input directory: {}", params.path_in.display());
        info!("Output file: {}", params.path_out.display());
        info!("Barcode length: {}", params.barcode_length);
        info!("CPU cores: {}", params.threads_work);
        info!("Chunk size: {}", params.chunk_size);

        let fastq_files = list_fastq_files(&params.path_in)?;
        if fastq_files.is_empty() {
            warn!("No FASTQ files found in {}", params.path_in.display());
            return Ok(RemultiplexSummary {
                total_sequences: 0,
                files_processed: 0,
                files_empty: 0,
                files_failed: 0,
                output: None,
                mapping: None,
                assignments: Vec::new(),
                elapsed: start_time.elapsed(),
            });
        }

        log_file_stats(&fastq_files, params.threads_work);

        let barcodes = generate_barcodes(fastq_files.len(), params.barcode_length)?;
        let assignments: Vec<BarcodeAssignment> = fastq_files
            .iter()
            .zip(barcodes.iter())
            .map(|(f, bc)| BarcodeAssignment {
                file_name: f
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                barcode: bc.clone(),
            })
            .collect();

        if let Some(parent) = params.path_out.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let path_mapping = params.path_mapping();
        write_barcode_mapping(&path_mapping, &assignments)?;
        info!("Barcode mapping saved to: {}", path_mapping.display());
        for a in assignments.iter().take(10) {
            info!("  {}: {}", a.file_name, a.barcode);
        }
        if assignments.len() > 10 {
            info!("  ... and {} more files", assignments.len() - 10);
        }

        let mut writer = GzFastqWriter::create(&params.path_out)?;

        //Limit chunks in flight so memory stays bounded by cores x chunk size
        let queue_size = params.threads_work * 2;
        let (tx, rx) = crossbeam::channel::bounded::<WorkerMsg>(queue_size);

        let thread_pool = threadpool::ThreadPool::new(params.threads_work);
        let params_shared = Arc::new(params.clone());
        for (file_idx, (path, barcode)) in fastq_files.iter().zip(barcodes.iter()).enumerate() {
            let tx = tx.clone();
            let path = path.clone();
            let barcode = barcode.clone();
            let params = Arc::clone(&params_shared);
            thread_pool.execute(move || {
                debug!("Worker started on {}", path.display());
                let result = process_single_file(&path, &barcode, &params, &tx);
                _ = tx.send(WorkerMsg::Done { file_idx, result });
            });
        }
        drop(tx);

        let mut progress = params.show_progress.then(|| {
            let mut progress = Progress::new();
            let bar = progress.bar(fastq_files.len(), "Remultiplexing");
            (progress, bar)
        });

        let mut files_done = 0;
        let mut files_processed = 0;
        let mut files_empty = 0;
        let mut files_failed = 0;
        let mut write_error: Option<anyhow::Error> = None;
        for msg in rx.iter() {
            match msg {
                WorkerMsg::Chunk { data, records } => {
                    if write_error.is_none() {
                        if let Err(e) = writer.write_raw(&data, records) {
                            write_error = Some(e.into());
                            break;
                        }
                    }
                }
                WorkerMsg::Done { file_idx, result } => {
                    files_done += 1;
                    if let Some((progress, bar)) = progress.as_mut() {
                        progress.inc_and_draw(bar, 1);
                    }
                    let name = &assignments[file_idx].file_name;
                    match result {
                        Ok(0) => {
                            files_empty += 1;
                            warn!("No sequences found in {}", name);
                        }
                        Ok(n) => {
                            files_processed += 1;
                            info!(
                                "Processed {} ({} sequences) - {}/{} files",
                                name,
                                n,
                                files_done,
                                fastq_files.len()
                            );
                        }
                        Err(e) => {
                            files_failed += 1;
                            warn!("Error processing {}: {:#}", name, e);
                        }
                    }
                    if files_done == fastq_files.len() {
                        break;
                    }
                }
            }
        }
        //Dropping the receiver makes any remaining workers stop at their next send
        drop(rx);
        thread_pool.join();

        if thread_pool.panic_count() > 0 {
            bail!("{} remultiplexing worker(s) panicked", thread_pool.panic_count());
        }
        if let Some(e) = write_error {
            return Err(e.context(format!("Failed writing {}", params.path_out.display())));
        }
        let total_sequences = writer.finish()?;

        let elapsed = start_time.elapsed();
        let secs = elapsed.as_secs_f64().max(f64::EPSILON);
        info!("Remultiplexing complete!");
        info!("Total sequences processed: {}", total_sequences);
        info!("Processing time: {:.1} minutes", secs / 60.0);
        info!("Sequences per second: {:.0}", total_sequences as f64 / secs);
        info!("Output file: {}", params.path_out.display());
        info!("Barcode mapping: {}", path_mapping.display());

        Ok(RemultiplexSummary {
            total_sequences,
            files_processed,
            files_empty,
            files_failed,
            output: Some(params.path_out.clone()),
            mapping: Some(path_mapping),
            assignments,
            elapsed,
        })
    }
}

fn log_file_stats(fastq_files: &[PathBuf], num_cores: usize) {
    let total_size: u64 = fastq_files
        .iter()
        .filter_map(|f| fs::metadata(f).ok())
        .map(|m| m.len())
        .sum();
    let avg_size = total_size as f64 / fastq_files.len() as f64;
    let total_size_gb = total_size as f64 / 1024f64.powi(3);

    info!("Found {} FASTQ files", fastq_files.len());
    info!("Total size: {:.2} GB", total_size_gb);
    info!("Average file size: {:.1} MB", avg_size / 1024f64.powi(2));
    let estimated = estimate_processing_time(total_size_gb, num_cores);
    info!(
        "Estimated processing time: {:.1} minutes",
        estimated.as_secs_f64() / 60.0
    );
}

/// Stream one file through the prefixer, handing full chunks to the writer.
/// Returns the number of records read
fn process_single_file(
    path: &Path,
    barcode: &str,
    params: &RemultiplexParams,
    tx: &Sender<WorkerMsg>,
) -> anyhow::Result<u64> {
    // niffler cannot sniff the format of an empty file
    if fs::metadata(path)?.len() == 0 {
        return Ok(0);
    }

    let mut reader = open_fastq(path)?;
    let mut prefixer = BarcodePrefixer::new(barcode);
    let limit = params.max_reads_per_file.unwrap_or(u64::MAX);

    let mut count: u64 = 0;
    let mut in_chunk: u64 = 0;
    let mut buf: Vec<u8> = Vec::new();
    while count < limit {
        let Some(record) = reader.next() else {
            break;
        };
        let record = record?;
        prefixer.write_record(&mut buf, record.head(), record.seq(), record.qual())?;
        count += 1;
        in_chunk += 1;

        if in_chunk as usize == params.chunk_size {
            let data = std::mem::take(&mut buf);
            if tx.send(WorkerMsg::Chunk { data, records: in_chunk }).is_err() {
                bail!("writer stopped");
            }
            in_chunk = 0;
        }
    }
    if in_chunk > 0 && tx.send(WorkerMsg::Chunk { data: buf, records: in_chunk }).is_err() {
        bail!("writer stopped");
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_suffix_is_added_once() {
        assert_eq!(normalize_output_path(Path::new("out/run1")), PathBuf::from("out/run1.fastq.gz"));
        assert_eq!(
            normalize_output_path(Path::new("out/run1.fastq.gz")),
            PathBuf::from("out/run1.fastq.gz")
        );
        assert_eq!(
            normalize_output_path(Path::new("run1.fastq")),
            PathBuf::from("run1.fastq.fastq.gz")
        );
    }

    #[test]
    fn mapping_path() {
        assert_eq!(
            mapping_path_for(Path::new("out/run1.fastq.gz")),
            PathBuf::from("out/run1_barcode_mapping.txt")
        );
    }

    #[test]
    fn time_estimate_scales_with_cores() {
        assert_eq!(estimate_processing_time(2.0, 4), Duration::from_secs(5));
        assert_eq!(estimate_processing_time(0.0, 1), Duration::ZERO);
    }

    #[test]
    fn default_cores_is_capped() {
        let c = default_cores();
        assert!(c >= 1 && c <= MAX_DEFAULT_CORES);
    }
}

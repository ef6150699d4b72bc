pub mod barcode_mapping;
pub mod fastq;
pub mod list_fastq;
mod detect_fileformat;

pub use detect_fileformat::detect_format;
pub use detect_fileformat::is_fastq_name;
pub use detect_fileformat::verify_input_file;
pub use detect_fileformat::verify_input_fq_file;
pub use detect_fileformat::DetectedFileformat;

pub use barcode_mapping::BarcodeAssignment;

pub use fastq::open_fastq;
pub use fastq::GzFastqWriter;

pub use list_fastq::discover_samples;
pub use list_fastq::list_fastq_files;
pub use list_fastq::read_sample_sheet;
pub use list_fastq::select_samples;
pub use list_fastq::FastqSample;

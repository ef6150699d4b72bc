pub mod nucleotide_barcode;

pub use nucleotide_barcode::generate_barcodes;
pub use nucleotide_barcode::BarcodePrefixer;

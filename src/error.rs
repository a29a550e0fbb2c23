use thiserror::Error;

#[derive(Debug, Error)]
pub enum CustomError {
    #[error("could not parse CSV in {path}")]
    CsvRead {
        #[source]
        source: csv::Error,
        path: std::path::PathBuf,
    },

    #[error("could not write to {path}")]
    Write {
        #[source]
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    #[error("could not write output")]
    WriteWithoutPath {
        #[source]
        source: std::io::Error,
    },

    #[error("could not write to CSV")]
    CsvWrite(#[from] csv::Error),

    #[error("could not move finished output into place at {path}")]
    Persist {
        #[source]
        source: tempfile::PersistError,
        path: std::path::PathBuf,
    },

    #[error("first five columns must be SNP, CHR, POS, REF, ALT (found {found})")]
    Header { found: String },

    #[error("encoding format must be \"012\" or \"-101\" (got \"{value}\")")]
    EncodingFormat { value: String },

    #[error("batch size must be at least 1 (got {batch_size})")]
    BatchSize { batch_size: usize },

    #[error("chunk size must be at least 1 (got {chunk_size})")]
    ChunkSize { chunk_size: usize },

    #[error("worker count must be at least 1 (got {workers})")]
    WorkerCount { workers: usize },

    #[error("could not build worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("marker {marker} on line {line_num} has unusable alleles")]
    Alleles {
        marker: String,
        line_num: u64,
        #[source]
        source: AlleleError,
    },

    #[error("encoding workers stopped before all batches were written")]
    WorkerDisconnected,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlleleError {
    #[error("REF \"{allele}\" is not one of A, C, G, T")]
    Reference { allele: String },

    #[error("ALT \"{allele}\" is not one of A, C, G, T")]
    Alternate { allele: String },

    #[error("REF and ALT are both \"{allele}\"")]
    Identical { allele: String },
}

pub type Result<T> = std::result::Result<T, CustomError>;

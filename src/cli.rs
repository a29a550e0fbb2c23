use crate::Args;
use crate::batch::partition;
use crate::driver::drive;
use crate::error::{CustomError, Result};
use crate::model::EncodingFormat;
use crate::output::{ChunkWriter, Delimiter};
use crate::reader::MarkerTableReader;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::ThreadPoolBuilder;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Everything a conversion run needs, validated up front.
#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub workers: usize,
    pub batch_size: usize,
    pub format: EncodingFormat,
    pub chunk_size: usize,
    pub delimiter: Delimiter,
    pub quote_all: bool,
}

impl Config {
    pub fn log_paths(&self) {
        info!("INPUT : {}", self.input.display());
        info!("OUTPUT: {}", self.output.display());
        info!(
            "format {}, {} workers, {} markers per batch, {} rows per write",
            self.format, self.workers, self.batch_size, self.chunk_size
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub n_markers: usize,
    pub n_samples: usize,
    pub n_batches: usize,
    pub n_chunks: usize,
}

pub fn build_config(args: &Args) -> Result<Config> {
    let format: EncodingFormat = args.format.parse()?;
    if args.workers == 0 {
        return Err(CustomError::WorkerCount {
            workers: args.workers,
        });
    }
    if args.batch_size == 0 {
        return Err(CustomError::BatchSize {
            batch_size: args.batch_size,
        });
    }
    if args.chunk_size == 0 {
        return Err(CustomError::ChunkSize {
            chunk_size: args.chunk_size,
        });
    }
    Ok(Config {
        input: args.input.clone(),
        output: args.output.clone(),
        workers: args.workers,
        batch_size: args.batch_size,
        format,
        chunk_size: args.chunk_size,
        delimiter: args.output_delimiter,
        quote_all: args.quote_all,
    })
}

// Sibling of the final output so the closing rename stays on one filesystem
fn staging_file(output: &Path) -> Result<NamedTempFile> {
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut builder = tempfile::Builder::new();
    builder.prefix(".hap2num-").suffix(".partial");
    // Same mode a plain create would give: 0o666 less the umask
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder
        .tempfile_in(dir)
        .map_err(|e| CustomError::Write {
            source: e,
            path: output.to_path_buf(),
        })
}

pub fn run(config: &Config) -> Result<RunSummary> {
    info!("Reading input file: {}", config.input.display());
    let reader = MarkerTableReader::open(&config.input)?;
    let header = reader.header().clone();
    let n_samples = reader.n_samples();
    let batches = partition(reader, config.batch_size)?;
    let pool = ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()?;

    let staging = staging_file(&config.output)?;
    let mut sink = ChunkWriter::new(
        staging,
        &header,
        config.chunk_size,
        config.delimiter,
        config.quote_all,
    )?;

    let pb = ProgressBar::no_length();
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {pos} markers encoded")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );

    info!("Starting parallel conversion...");
    // On error the staging file is dropped, which deletes it
    let drive_summary = drive(batches, config.format, &pool, &mut sink, &pb)?;
    pb.abandon();

    sink.flush()?;
    let n_chunks = sink.n_chunks();
    let staging = sink.finish()?;
    staging
        .persist(&config.output)
        .map_err(|source| CustomError::Persist {
            source,
            path: config.output.clone(),
        })?;

    let summary = RunSummary {
        n_markers: drive_summary.n_markers,
        n_samples,
        n_batches: drive_summary.n_batches,
        n_chunks,
    };
    info!(
        markers = summary.n_markers,
        samples = summary.n_samples,
        batches = summary.n_batches,
        chunks = summary.n_chunks,
        "Conversion completed successfully; output written to {}",
        config.output.display()
    );
    Ok(summary)
}

use std::io::Write;

use csv::StringRecord;
use tracing::debug;

use crate::error::{CustomError, Result};
use crate::model::EncodedRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
        }
    }
}

/// Buffers encoded rows and writes them out `chunk_size` rows at a time.
/// Rows must be pushed in output order.
pub struct ChunkWriter<W: Write> {
    writer: csv::Writer<W>,
    buffer: Vec<EncodedRow>,
    chunk_size: usize,
    n_chunks: usize,
    n_rows: usize,
}

impl<W: Write> ChunkWriter<W> {
    pub fn new(
        inner: W,
        header: &StringRecord,
        chunk_size: usize,
        delimiter: Delimiter,
        quote_all: bool,
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(CustomError::ChunkSize { chunk_size });
        }
        let quote_style = if quote_all {
            csv::QuoteStyle::Always
        } else {
            csv::QuoteStyle::Necessary
        };
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter.as_byte())
            .quote_style(quote_style)
            .from_writer(inner);
        writer.write_record(header)?;

        Ok(Self {
            writer,
            buffer: Vec::with_capacity(chunk_size.min(8192)),
            chunk_size,
            n_chunks: 0,
            n_rows: 0,
        })
    }

    pub fn push(&mut self, row: EncodedRow) -> Result<()> {
        self.buffer.push(row);
        if self.buffer.len() >= self.chunk_size {
            self.write_chunk()?;
        }
        Ok(())
    }

    fn write_chunk(&mut self) -> Result<()> {
        for row in self.buffer.drain(..) {
            for field in row.marker.iter() {
                self.writer.write_field(field)?;
            }
            for &code in &row.codes {
                self.writer.write_field(code_field(code))?;
            }
            self.writer.write_record(std::iter::empty::<&[u8]>())?;
            self.n_rows += 1;
        }
        self.writer
            .flush()
            .map_err(|source| CustomError::WriteWithoutPath { source })?;
        self.n_chunks += 1;
        debug!(chunk = self.n_chunks, rows = self.n_rows, "chunk written");
        Ok(())
    }

    pub fn n_chunks(&self) -> usize {
        self.n_chunks
    }

    /// Writes out any partial chunk.
    pub fn flush(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            self.write_chunk()?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| CustomError::WriteWithoutPath {
                source: e.into_error(),
            })
    }
}

fn code_field(code: i8) -> &'static str {
    match code {
        -1 => "-1",
        0 => "0",
        1 => "1",
        2 => "2",
        _ => "-9",
    }
}

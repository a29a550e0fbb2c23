use crate::error::{CustomError, Result};

// Cap on up-front allocation; very large batch sizes grow on demand.
const MAX_PREALLOCATED_ROWS: usize = 8192;

/// A contiguous run of input rows. `index` is the batch's position in the input,
/// so batch `i` holds rows `i * batch_size ..`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<T> {
    pub index: usize,
    pub rows: Vec<T>,
}

pub struct Batches<I> {
    rows: I,
    batch_size: usize,
    next_index: usize,
    done: bool,
}

/// Lazily groups a fallible row stream into batches of at most `batch_size` rows.
pub fn partition<I, T>(rows: I, batch_size: usize) -> Result<Batches<I::IntoIter>>
where
    I: IntoIterator<Item = Result<T>>,
{
    if batch_size == 0 {
        return Err(CustomError::BatchSize { batch_size });
    }
    Ok(Batches {
        rows: rows.into_iter(),
        batch_size,
        next_index: 0,
        done: false,
    })
}

impl<I, T> Iterator for Batches<I>
where
    I: Iterator<Item = Result<T>>,
{
    type Item = Result<Batch<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut rows = Vec::with_capacity(self.batch_size.min(MAX_PREALLOCATED_ROWS));
        while rows.len() < self.batch_size {
            match self.rows.next() {
                Some(Ok(row)) => rows.push(row),
                Some(Err(e)) => {
                    // Poison iterator to prevent further reads
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        if rows.is_empty() {
            return None;
        }
        let batch = Batch {
            index: self.next_index,
            rows,
        };
        self.next_index += 1;
        Some(Ok(batch))
    }
}

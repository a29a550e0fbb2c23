use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const HEADER: &str = "SNP,CHR,POS,REF,ALT";
const ALLELE_PAIRS: [(char, char); 6] = [
    ('A', 'T'),
    ('C', 'G'),
    ('A', 'G'),
    ('C', 'T'),
    ('G', 'T'),
    ('A', 'C'),
];

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

pub struct Dataset {
    pub input: PathBuf,
    pub output: PathBuf,
}

fn dataset_dir(label: &str) -> io::Result<PathBuf> {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base_dir = std::env::temp_dir().join("hap2num-tests").join(format!(
        "{}-{}-{}",
        std::process::id(),
        id,
        label
    ));
    fs::create_dir_all(&base_dir)?;
    Ok(base_dir)
}

/// Writes `contents` verbatim as the input table.
pub fn create_dataset_from(label: &str, contents: &str) -> io::Result<Dataset> {
    let base_dir = dataset_dir(label)?;
    let input = base_dir.join("genotypes.csv");
    fs::write(&input, contents)?;
    Ok(Dataset {
        input,
        output: base_dir.join("numeric.csv"),
    })
}

/// Generates `n_markers` markers across `n_samples` samples. Calls cycle
/// through hom-ref, het (both orders), hom-alt and a missing token, so the
/// expected code of every cell is known from its coordinates.
pub fn create_dataset(label: &str, n_markers: usize, n_samples: usize) -> io::Result<Dataset> {
    let base_dir = dataset_dir(label)?;
    let input = base_dir.join("genotypes.csv");
    let mut file = BufWriter::new(File::create(&input)?);

    write!(file, "{HEADER}")?;
    for s in 0..n_samples {
        write!(file, ",Sample{}", s + 1)?;
    }
    writeln!(file)?;

    for m in 0..n_markers {
        let (reference, alternate) = ALLELE_PAIRS[m % ALLELE_PAIRS.len()];
        write!(
            file,
            "{},{},{},{reference},{alternate}",
            marker_id(m),
            m % 22 + 1,
            (m + 1) * 100
        )?;
        for s in 0..n_samples {
            write!(file, ",{}", call(m, s, reference, alternate))?;
        }
        writeln!(file)?;
    }
    file.flush()?;

    Ok(Dataset {
        input,
        output: base_dir.join("numeric.csv"),
    })
}

pub fn marker_id(m: usize) -> String {
    format!("rs{}", m + 1)
}

fn call(m: usize, s: usize, reference: char, alternate: char) -> String {
    match (m + s) % 5 {
        0 => format!("{reference}{reference}"),
        1 => format!("{reference}{alternate}"),
        2 => format!("{alternate}{reference}"),
        3 => format!("{alternate}{alternate}"),
        _ => "NN".to_string(),
    }
}

/// Expected "012" code for the generated call at (marker, sample).
pub fn expected_code(m: usize, s: usize) -> i8 {
    match (m + s) % 5 {
        0 => 0,
        1 | 2 => 1,
        3 => 2,
        _ => -9,
    }
}

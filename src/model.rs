use std::fmt;
use std::str::FromStr;

use csv::StringRecord;

use crate::error::CustomError;

pub const MARKER_COLUMNS: [&str; 5] = ["SNP", "CHR", "POS", "REF", "ALT"];
pub const MISSING_CODE: i8 = -9;

/// Allele composition of a diploid call relative to its marker's REF/ALT.
/// Discriminants are the number of ALT alleles carried.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Genotype {
    HomRef = 0,
    Het = 1,
    HomAlt = 2,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingFormat {
    /// HomRef 0, Het 1, HomAlt 2
    #[default]
    ZeroOneTwo,
    /// HomRef -1, Het 0, HomAlt 1
    MinusOneZeroOne,
}

impl EncodingFormat {
    pub fn code(self, genotype: Genotype) -> i8 {
        if genotype == Genotype::Missing {
            return MISSING_CODE;
        }
        let alt_dosage = genotype as i8;
        match self {
            EncodingFormat::ZeroOneTwo => alt_dosage,
            EncodingFormat::MinusOneZeroOne => alt_dosage - 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EncodingFormat::ZeroOneTwo => "012",
            EncodingFormat::MinusOneZeroOne => "-101",
        }
    }
}

impl FromStr for EncodingFormat {
    type Err = CustomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "012" => Ok(EncodingFormat::ZeroOneTwo),
            "-101" => Ok(EncodingFormat::MinusOneZeroOne),
            other => Err(CustomError::EncodingFormat {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for EncodingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One input line: the five marker columns followed by the sample calls.
#[derive(Debug, Clone)]
pub struct MarkerRow {
    pub line_num: u64,
    pub record: StringRecord,
}

impl MarkerRow {
    pub fn id(&self) -> &str {
        self.record.get(0).unwrap_or_default()
    }

    pub fn ref_allele(&self) -> &str {
        self.record.get(3).unwrap_or_default()
    }

    pub fn alt_allele(&self) -> &str {
        self.record.get(4).unwrap_or_default()
    }

    pub fn calls(&self) -> impl Iterator<Item = &str> {
        self.record.iter().skip(MARKER_COLUMNS.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRow {
    // SNP, CHR, POS, REF, ALT as read
    pub marker: StringRecord,
    pub codes: Vec<i8>,
}

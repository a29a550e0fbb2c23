use crate::error::{AlleleError, CustomError, Result};
use crate::model::{EncodedRow, EncodingFormat, Genotype, MARKER_COLUMNS, MarkerRow};

const NUCLEOTIDES: [u8; 4] = *b"ACGT";

/// The validated REF/ALT pair of a single marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllelePair {
    reference: u8,
    alternate: u8,
}

fn nucleotide(allele: &str) -> Option<u8> {
    match allele.as_bytes() {
        &[base] if NUCLEOTIDES.contains(&base) => Some(base),
        _ => None,
    }
}

impl AllelePair {
    pub fn new(ref_allele: &str, alt_allele: &str) -> std::result::Result<Self, AlleleError> {
        let reference = nucleotide(ref_allele).ok_or_else(|| AlleleError::Reference {
            allele: ref_allele.to_string(),
        })?;
        let alternate = nucleotide(alt_allele).ok_or_else(|| AlleleError::Alternate {
            allele: alt_allele.to_string(),
        })?;
        if reference == alternate {
            return Err(AlleleError::Identical {
                allele: ref_allele.to_string(),
            });
        }
        Ok(Self {
            reference,
            alternate,
        })
    }

    fn alt_count(&self, base: u8) -> Option<u8> {
        if base == self.reference {
            Some(0)
        } else if base == self.alternate {
            Some(1)
        } else {
            None
        }
    }

    /// Classifies a call as an unordered pair of alleles. Anything that is not
    /// exactly two of this marker's alleles is `Missing`.
    pub fn classify(&self, call: &str) -> Genotype {
        let &[first, second] = call.as_bytes() else {
            return Genotype::Missing;
        };
        match (self.alt_count(first), self.alt_count(second)) {
            (Some(a), Some(b)) => match a + b {
                0 => Genotype::HomRef,
                1 => Genotype::Het,
                _ => Genotype::HomAlt,
            },
            _ => Genotype::Missing,
        }
    }

    pub fn encode(&self, call: &str, format: EncodingFormat) -> i8 {
        format.code(self.classify(call))
    }
}

pub fn encode_row(row: MarkerRow, format: EncodingFormat) -> Result<EncodedRow> {
    let alleles =
        AllelePair::new(row.ref_allele(), row.alt_allele()).map_err(|source| {
            CustomError::Alleles {
                marker: row.id().to_string(),
                line_num: row.line_num,
                source,
            }
        })?;
    let codes = row
        .calls()
        .map(|call| alleles.encode(call, format))
        .collect();
    let mut marker = row.record;
    marker.truncate(MARKER_COLUMNS.len());
    Ok(EncodedRow { marker, codes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MISSING_CODE;
    use csv::StringRecord;
    use proptest::prelude::*;

    const FORMATS: [EncodingFormat; 2] =
        [EncodingFormat::ZeroOneTwo, EncodingFormat::MinusOneZeroOne];

    fn encode(
        ref_allele: &str,
        alt_allele: &str,
        call: &str,
        format: EncodingFormat,
    ) -> std::result::Result<i8, AlleleError> {
        Ok(AllelePair::new(ref_allele, alt_allele)?.encode(call, format))
    }

    #[test]
    fn classifies_both_orders_of_heterozygote() {
        let pair = AllelePair::new("A", "T").unwrap();
        assert_eq!(pair.classify("AA"), Genotype::HomRef);
        assert_eq!(pair.classify("TT"), Genotype::HomAlt);
        assert_eq!(pair.classify("AT"), Genotype::Het);
        assert_eq!(pair.classify("TA"), Genotype::Het);
    }

    #[test]
    fn codes_follow_format_tables() {
        let calls = ["AA", "TT", "AT", "TA"];
        let zot: Vec<i8> = calls
            .iter()
            .map(|c| encode("A", "T", c, EncodingFormat::ZeroOneTwo).unwrap())
            .collect();
        assert_eq!(zot, vec![0, 2, 1, 1]);
        let mozo: Vec<i8> = calls
            .iter()
            .map(|c| encode("A", "T", c, EncodingFormat::MinusOneZeroOne).unwrap())
            .collect();
        assert_eq!(mozo, vec![-1, 1, 0, 0]);
    }

    #[test]
    fn unrecognized_calls_are_missing() {
        let pair = AllelePair::new("A", "T").unwrap();
        for call in ["GG", "AG", "CT", "aa", "at", "A", "AAT", "", "NA", "--", "00", "./."] {
            for format in FORMATS {
                assert_eq!(
                    pair.encode(call, format),
                    MISSING_CODE,
                    "call {call:?} under {format}"
                );
            }
        }
    }

    #[test]
    fn rejects_unusable_alleles() {
        assert_eq!(
            AllelePair::new("N", "T").unwrap_err(),
            AlleleError::Reference {
                allele: "N".to_string()
            }
        );
        assert_eq!(
            AllelePair::new("A", "AT").unwrap_err(),
            AlleleError::Alternate {
                allele: "AT".to_string()
            }
        );
        assert_eq!(
            AllelePair::new("G", "G").unwrap_err(),
            AlleleError::Identical {
                allele: "G".to_string()
            }
        );
        assert!(AllelePair::new("a", "t").is_err());
        assert!(AllelePair::new("", "T").is_err());
    }

    #[test]
    fn encodes_row_scenario() {
        let record = StringRecord::from(vec!["rs1", "1", "100", "A", "T", "AA", "AT", "TT", "GG"]);
        let row = MarkerRow {
            line_num: 2,
            record,
        };

        let encoded = encode_row(row.clone(), EncodingFormat::ZeroOneTwo).unwrap();
        assert_eq!(
            encoded.marker,
            StringRecord::from(vec!["rs1", "1", "100", "A", "T"])
        );
        assert_eq!(encoded.codes, vec![0, 1, 2, -9]);

        let encoded = encode_row(row, EncodingFormat::MinusOneZeroOne).unwrap();
        assert_eq!(encoded.codes, vec![-1, 0, 1, -9]);
    }

    #[test]
    fn row_error_names_marker_and_line() {
        let row = MarkerRow {
            line_num: 7,
            record: StringRecord::from(vec!["rs9", "2", "900", "C", "C", "CC"]),
        };
        let err = encode_row(row, EncodingFormat::ZeroOneTwo).unwrap_err();
        match err {
            CustomError::Alleles {
                marker,
                line_num,
                source,
            } => {
                assert_eq!(marker, "rs9");
                assert_eq!(line_num, 7);
                assert_eq!(
                    source,
                    AlleleError::Identical {
                        allele: "C".to_string()
                    }
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn call_order_does_not_matter(
            (reference, alternate) in (0usize..4, 0usize..4)
                .prop_filter("REF and ALT must differ", |(r, a)| r != a),
            first in prop::sample::select(vec!['A', 'C', 'G', 'T', 'N', '-', 'a']),
            second in prop::sample::select(vec!['A', 'C', 'G', 'T', 'N', '-', 'a']),
        ) {
            let reference = (NUCLEOTIDES[reference] as char).to_string();
            let alternate = (NUCLEOTIDES[alternate] as char).to_string();
            let forward: String = [first, second].iter().collect();
            let reverse: String = [second, first].iter().collect();
            for format in FORMATS {
                prop_assert_eq!(
                    encode(&reference, &alternate, &forward, format).unwrap(),
                    encode(&reference, &alternate, &reverse, format).unwrap()
                );
            }
        }

        #[test]
        fn codes_stay_in_format_range(
            (reference, alternate) in (0usize..4, 0usize..4)
                .prop_filter("REF and ALT must differ", |(r, a)| r != a),
            call in "[ACGTN.-]{0,3}",
        ) {
            let pair = AllelePair::new(
                &(NUCLEOTIDES[reference] as char).to_string(),
                &(NUCLEOTIDES[alternate] as char).to_string(),
            ).unwrap();
            let code = pair.encode(&call, EncodingFormat::ZeroOneTwo);
            prop_assert!(matches!(code, -9 | 0 | 1 | 2));
            let code = pair.encode(&call, EncodingFormat::MinusOneZeroOne);
            prop_assert!(matches!(code, -9 | -1 | 0 | 1));
        }
    }
}

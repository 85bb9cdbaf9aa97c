//! Lens Prescription Parser

use crate::LensError;
use lenscore::fileutil::file_to_string;
use lenscore::pbrt::Float;
use pest::iterators::Pair;
use pest::Parser;
use std::result::Result;

#[derive(Parser)]
#[grammar = "parser/prescription.pest"]
struct PrescriptionParser;

/// A single row of a lens prescription in file order and file units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PrescriptionRow {
    /// 1-based line number in the source text.
    pub line: usize,

    /// Signed radius of curvature. 0 marks the aperture stop.
    pub curvature: Float,

    /// Axial distance to the next surface towards the sensor.
    pub thickness: Float,

    /// Index of refraction of the medium behind the surface. 0 means air.
    pub ior: Float,

    /// Abbe number when the prescription has 5 columns.
    pub abbe: Option<Float>,

    /// Clear aperture diameter.
    pub aperture: Float,
}

/// A parsed lens prescription.
#[derive(Clone, Debug, Default)]
pub struct Prescription {
    /// The rows from the front of the lens to the sensor.
    pub rows: Vec<PrescriptionRow>,

    /// Number of columns per row (4 or 5).
    pub n_columns: usize,

    /// Number of comment lines.
    pub n_comments: usize,

    /// Number of lines that did not contain a row.
    pub n_skipped: usize,
}

/// Reads a lens prescription file.
///
/// * `path` - Path to file.
pub fn parse_prescription_file(path: &str) -> Result<Prescription, LensError> {
    let text = file_to_string(path).map_err(|reason| LensError::Io {
        path: path.to_string(),
        reason,
    })?;
    parse_prescription(&text, path)
}

/// Parses the text of a lens prescription. Each row has 4 columns
/// (curvature, thickness, index of refraction, aperture) or 5 with the Abbe
/// number before the aperture; every row must have the same count.
///
/// * `text`   - The prescription text.
/// * `source` - Name of the source used in error messages.
pub fn parse_prescription(text: &str, source: &str) -> Result<Prescription, LensError> {
    let file = parse_file_rule(text, source)?;

    let mut rows: Vec<Vec<Float>> = vec![];
    let mut lines: Vec<usize> = vec![];
    let mut n_comments = 0;

    for pair in file.into_inner() {
        match pair.as_rule() {
            Rule::row => {
                let (line, _) = pair.as_span().start_pos().line_col();
                let mut values = Vec::with_capacity(5);
                for num in pair.into_inner() {
                    let s = num.as_str();
                    let v = s.parse::<Float>().map_err(|e| LensError::Grammar {
                        path: source.to_string(),
                        reason: format!("line {line}: invalid number '{s}': {e}"),
                    })?;
                    values.push(v);
                }
                rows.push(values);
                lines.push(line);
            }
            Rule::comment => n_comments += 1,
            Rule::EOI => (), // End of input.
            _ => unreachable!(),
        }
    }

    if rows.is_empty() {
        return Err(LensError::Empty(source.to_string()));
    }

    let n_columns = rows[0].len();
    info!("{:<40} {:>12}", "Detected number of columns", n_columns);
    if !(4..=5).contains(&n_columns) {
        return Err(LensError::ColumnCount(n_columns));
    }

    let mut prescription_rows = Vec::with_capacity(rows.len());
    for (values, line) in rows.iter().zip(lines.iter()) {
        if values.len() != n_columns {
            return Err(LensError::RowWidth {
                line: *line,
                found: values.len(),
                expected: n_columns,
            });
        }
        let (abbe, aperture) = if n_columns == 5 {
            (Some(values[3]), values[4])
        } else {
            (None, values[3])
        };
        prescription_rows.push(PrescriptionRow {
            line: *line,
            curvature: values[0],
            thickness: values[1],
            ior: values[2],
            abbe,
            aperture,
        });
    }

    let n_skipped = text.lines().count().saturating_sub(prescription_rows.len());
    info!("{:<40} {:>12}", "Comment lines", n_comments);
    info!("{:<40} {:>12}", "Skipped lines", n_skipped);

    Ok(Prescription {
        rows: prescription_rows,
        n_columns,
        n_comments,
        n_skipped,
    })
}

/// Parse the initial `file` rule of the grammar and return the resulting token
/// pairs for remaining rules.
///
/// * `text`   - The text to parse.
/// * `source` - Name of the source used in error messages.
fn parse_file_rule<'a>(text: &'a str, source: &str) -> Result<Pair<'a, Rule>, LensError> {
    let mut pairs =
        PrescriptionParser::parse(Rule::file, text).map_err(|err| LensError::Grammar {
            path: source.to_string(),
            reason: err.to_string(),
        })?;
    pairs.next().ok_or_else(|| LensError::Grammar {
        path: source.to_string(),
        reason: "missing file rule".to_string(),
    })
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FOUR_COLUMNS: &str = "\
# Simple doublet
# r  t  n  a
100.0\t1.0\t1.5\t20.0

-100.0, 5.0, 0, 20.0
0;50;0;10
";

    #[test]
    fn four_columns() {
        let p = parse_prescription(FOUR_COLUMNS, "test").unwrap();
        assert_eq!(p.n_columns, 4);
        assert_eq!(p.n_comments, 2);
        assert_eq!(p.n_skipped, 3);
        assert_eq!(p.rows.len(), 3);

        let r = p.rows[1];
        assert_eq!(r.line, 5);
        assert_eq!(r.curvature, -100.0);
        assert_eq!(r.thickness, 5.0);
        assert_eq!(r.ior, 0.0);
        assert_eq!(r.abbe, None);
        assert_eq!(r.aperture, 20.0);
        assert_eq!(p.rows[2].curvature, 0.0);
    }

    #[test]
    fn five_columns_with_abbe() {
        let p = parse_prescription("58.95 7.52 1.670 47.1 50.4\n  169.66 0.24 1 0 50.4  \n", "test")
            .unwrap();
        assert_eq!(p.n_columns, 5);
        assert_eq!(p.rows[0].abbe, Some(47.1));
        assert_eq!(p.rows[0].aperture, 50.4);
        assert_eq!(p.rows[1].ior, 1.0);
    }

    #[test]
    fn scientific_notation_and_trailing_comment() {
        let p = parse_prescription("1e2 .5 1.5 2E1 # front\n", "test").unwrap();
        assert_eq!(p.rows[0].curvature, 100.0);
        assert_eq!(p.rows[0].thickness, 0.5);
        assert_eq!(p.rows[0].aperture, 20.0);
        assert_eq!(p.n_comments, 1);
    }

    #[test]
    fn wrong_column_counts() {
        assert!(matches!(
            parse_prescription("1 2 3\n", "test"),
            Err(LensError::ColumnCount(3))
        ));
        assert!(matches!(
            parse_prescription("1 2 3 4 5 6\n", "test"),
            Err(LensError::ColumnCount(6))
        ));
        assert!(matches!(
            parse_prescription("1 2 3 4\n1 2 3 4 5\n", "test"),
            Err(LensError::RowWidth {
                line: 2,
                found: 5,
                expected: 4
            })
        ));
    }

    #[test]
    fn empty_and_garbage() {
        assert!(matches!(
            parse_prescription("# nothing here\n\n", "test"),
            Err(LensError::Empty(_))
        ));
        assert!(matches!(
            parse_prescription("1 2 three 4\n", "test"),
            Err(LensError::Grammar { .. })
        ));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            parse_prescription_file("/definitely/not/here.txt"),
            Err(LensError::Io { .. })
        ));
    }
}

//! Plain-text ROC curve files.
//!
//! A curve file holds a fixed number of header lines followed by one point
//! per row, in whitespace-separated columns. FPR and TPR are read from two
//! 0-based column indices; other columns are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rocband_core::{Result, RocError};

use crate::curve::RocCurve;

/// Read a curve from the file at `path`.
///
/// Blank lines after the header are skipped. The curve carries no raw
/// scores and zero instance counts.
///
/// # Errors
///
/// Returns `Io` when the file cannot be read and `Parse` for a row missing
/// a requested column, a value that is not a number, or a file without
/// data rows.
pub fn read_curve_file(
    path: impl AsRef<Path>,
    header_lines: usize,
    fpr_column: usize,
    tpr_column: usize,
) -> Result<RocCurve> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        RocError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    let source = path.display().to_string();
    read_curve(BufReader::new(file), &source, header_lines, fpr_column, tpr_column)
}

/// Read a curve from any buffered reader; `source` names it in errors.
pub fn read_curve<R: BufRead>(
    reader: R,
    source: &str,
    header_lines: usize,
    fpr_column: usize,
    tpr_column: usize,
) -> Result<RocCurve> {
    let mut fpr = Vec::new();
    let mut tpr = Vec::new();
    for (line_num, line) in reader.lines().enumerate().skip(header_lines) {
        let line_num = line_num + 1;
        let line = line.map_err(|e| {
            RocError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: line {}: {}", source, line_num, e),
            ))
        })?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        fpr.push(parse_field(&fields, fpr_column, "FPR", source, line_num)?);
        tpr.push(parse_field(&fields, tpr_column, "TPR", source, line_num)?);
    }
    if fpr.is_empty() {
        return Err(RocError::Parse(format!("{}: no data rows", source)));
    }
    tracing::debug!(source, points = fpr.len(), "read curve file");
    RocCurve::from_points(fpr, tpr)
}

fn parse_field(fields: &[&str], column: usize, name: &str, source: &str, line_num: usize) -> Result<f64> {
    let raw = fields.get(column).ok_or_else(|| {
        RocError::Parse(format!(
            "{}: line {}: {} column {} missing, found {} columns",
            source,
            line_num,
            name,
            column,
            fields.len()
        ))
    })?;
    raw.parse().map_err(|_| {
        RocError::Parse(format!(
            "{}: line {}: invalid {} value '{}'",
            source, line_num, name, raw
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_curve(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".txt").unwrap();
        write!(file, "{}", content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_selected_columns() {
        let file = write_curve(
            "threshold fpr tpr\n\
             1.0 0.0 0.0\n\
             0.5 0.2   0.7\n\
             \n\
             0.0 1.0 1.0\n",
        );
        let curve = read_curve_file(file.path(), 1, 1, 2).unwrap();
        assert_eq!(curve.fpr(), &[0.0, 0.2, 1.0]);
        assert_eq!(curve.tpr(), &[0.0, 0.7, 1.0]);
        assert_eq!(curve.positive_count(), 0);
        assert!(!curve.has_raw_scores());
    }

    #[test]
    fn header_lines_are_skipped_verbatim() {
        let file = write_curve("# produced by a classifier\n\nfpr tpr\n0 0\n0.5 0.9\n1 1\n");
        let curve = read_curve_file(file.path(), 3, 0, 1).unwrap();
        assert_eq!(curve.resolution(), 3);
        assert!((curve.auc() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn reversed_columns() {
        let file = write_curve("0.7 0.2\n");
        let curve = read_curve_file(file.path(), 0, 1, 0).unwrap();
        assert_eq!(curve.fpr(), &[0.2]);
        assert_eq!(curve.tpr(), &[0.7]);
    }

    #[test]
    fn missing_column_names_line() {
        let file = write_curve("h\n0.0 0.0\n0.5\n");
        let err = read_curve_file(file.path(), 1, 0, 1).unwrap_err();
        assert!(matches!(err, RocError::Parse(_)));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn invalid_number() {
        let file = write_curve("0.0 abc\n");
        let err = read_curve_file(file.path(), 0, 0, 1).unwrap_err();
        assert!(err.to_string().contains("invalid TPR value 'abc'"));
    }

    #[test]
    fn empty_file() {
        let file = write_curve("fpr tpr\n");
        assert!(matches!(read_curve_file(file.path(), 1, 0, 1), Err(RocError::Parse(_))));
    }

    #[test]
    fn missing_file() {
        let err = read_curve_file("/nonexistent/curve.txt", 0, 0, 1).unwrap_err();
        assert!(matches!(err, RocError::Io(_)));
    }

    #[test]
    fn read_from_memory() {
        let data = "a b\n0 0\n1 1\n".as_bytes();
        let curve = read_curve(data, "inline", 1, 0, 1).unwrap();
        assert!((curve.auc() - 0.5).abs() < 1e-12);
    }
}

//! Matrix ingestion: separator-delimited text to a rectangular `f64` matrix
//!
//! Parsing is lenient and never fails:
//!
//! * lines that are blank after trimming are skipped, everything else is a row
//! * every token is trimmed and parsed as `f64`; a token with trailing junk
//!   keeps its leading number (`"1.5abc"` reads as `1.5`), and a token with no
//!   leading number or a non-finite value becomes `0.0`
//! * the first row fixes the dimensionality `d`; longer rows are truncated to
//!   `d` and shorter rows are padded with `0.0`

use ndarray::{Array2, ArrayView1};
use std::path::Path;
use tracing::debug;

/// Separator used when none is configured.
pub const DEFAULT_SEPARATOR: char = ',';

/// Value substituted for unparsable tokens and missing trailing fields.
pub const FILL_VALUE: f64 = 0.0;

/// Rectangular matrix of feature vectors, one row per vector.
///
/// An empty matrix has shape `(0, 0)`; any non-empty matrix has `dim() >= 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Array2<f64>,
}

impl Matrix {
    /// Matrix with no rows.
    pub fn empty() -> Self {
        Self {
            data: Array2::zeros((0, 0)),
        }
    }

    /// Wrap an existing array.
    pub fn from_array(data: Array2<f64>) -> Self {
        if data.nrows() == 0 {
            return Self::empty();
        }
        Self { data }
    }

    /// Build from row vectors, applying the same truncate/pad policy as
    /// [`parse_matrix`]: the first row decides the width.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Self {
        let Some(first) = rows.first() else {
            return Self::empty();
        };
        let dim = first.as_ref().len();
        if dim == 0 {
            return Self::empty();
        }

        let mut flat = Vec::with_capacity(rows.len() * dim);
        for row in rows {
            let row = row.as_ref();
            flat.extend(row.iter().copied().take(dim));
            flat.extend(std::iter::repeat(FILL_VALUE).take(dim.saturating_sub(row.len())));
        }

        // Every row contributes exactly `dim` values, so the shape always matches.
        let data = Array2::from_shape_vec((rows.len(), dim), flat)
            .unwrap_or_else(|_| Array2::zeros((0, 0)));
        Self::from_array(data)
    }

    /// Number of rows (n).
    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    /// Dimensionality (d); 0 for an empty matrix.
    pub fn dim(&self) -> usize {
        self.data.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.data.row(i)
    }

    /// Iterate rows in order.
    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, f64>> {
        self.data.outer_iter()
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn into_array(self) -> Array2<f64> {
        self.data
    }

    /// Copy out as nested vectors.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(|row| row.to_vec()).collect()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::empty()
    }
}

/// Parse separator-delimited text into a [`Matrix`].
///
/// Empty text (or text with only blank lines) yields an empty matrix.
/// See the module docs for the malformed-token and ragged-row policy.
pub fn parse_matrix(text: &str, separator: char) -> Matrix {
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    let Some(first) = lines.first() else {
        return Matrix::empty();
    };

    let dim = first.split(separator).count();
    let mut flat = Vec::with_capacity(lines.len() * dim);
    let mut malformed = 0usize;
    let mut ragged = 0usize;

    for line in &lines {
        let mut width = 0usize;
        for token in line.split(separator) {
            width += 1;
            if width > dim {
                continue;
            }
            match parse_field(token) {
                Some(value) => flat.push(value),
                None => {
                    malformed += 1;
                    flat.push(FILL_VALUE);
                }
            }
        }
        if width != dim {
            ragged += 1;
        }
        for _ in width..dim {
            flat.push(FILL_VALUE);
        }
    }

    if malformed > 0 || ragged > 0 {
        debug!(
            rows = lines.len(),
            dim, malformed, ragged, "recovered malformed input while parsing matrix"
        );
    }

    let data = Array2::from_shape_vec((lines.len(), dim), flat)
        .unwrap_or_else(|_| Array2::zeros((0, 0)));
    Matrix::from_array(data)
}

/// Read a file and parse it with [`parse_matrix`].
pub fn load_matrix(path: impl AsRef<Path>, separator: char) -> crate::Result<Matrix> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let matrix = parse_matrix(&text, separator);
    debug!(
        path = %path.as_ref().display(),
        rows = matrix.nrows(),
        dim = matrix.dim(),
        "loaded matrix"
    );
    Ok(matrix)
}

/// Parse a single trimmed token; `None` when it is not a finite number.
pub fn parse_token(token: &str) -> Option<f64> {
    token
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Parse a matrix field, falling back to its leading number when the whole
/// token is not one.
fn parse_field(token: &str) -> Option<f64> {
    let token = token.trim();
    token
        .parse::<f64>()
        .ok()
        .or_else(|| numeric_prefix(token).parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Longest leading `[sign] digits [. digits] [e [sign] digits]` of `token`.
fn numeric_prefix(token: &str) -> &str {
    let bytes = token.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|byte| byte.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = digits_from(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_from(end + 1);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_digits = digits_from(end + 1 + sign);
        if exp_digits > 0 {
            end += 1 + sign + exp_digits;
        }
    }

    &token[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_empty_text() {
        assert!(parse_matrix("", ',').is_empty());
        assert!(parse_matrix("\n  \n", ',').is_empty());
        assert_eq!(parse_matrix("", ',').dim(), 0);
    }

    #[test]
    fn test_parse_basic_matrix() {
        let matrix = parse_matrix("0,0\n0,0\n10,10\n10,10", ',');
        assert_eq!(matrix.nrows(), 4);
        assert_eq!(matrix.dim(), 2);
        assert_eq!(matrix.row(2).to_vec(), vec![10.0, 10.0]);
    }

    #[test]
    fn test_malformed_token_becomes_zero() {
        let matrix = parse_matrix("1,x\n2,3", ',');
        assert_eq!(matrix.to_rows(), vec![vec![1.0, 0.0], vec![2.0, 3.0]]);
    }

    #[test]
    fn test_non_finite_tokens_become_zero() {
        let matrix = parse_matrix("NaN,inf\nInfinity,-2e1\n1e400,abc1", ',');
        assert_eq!(
            matrix.to_rows(),
            vec![vec![0.0, 0.0], vec![0.0, -20.0], vec![0.0, 0.0]]
        );
    }

    #[test]
    fn test_trailing_junk_keeps_leading_number() {
        let matrix = parse_matrix("1.5abc,-2e1x\n3e,.5.5\n7.,-.x", ',');
        assert_eq!(
            matrix.to_rows(),
            vec![vec![1.5, -20.0], vec![3.0, 0.5], vec![7.0, 0.0]]
        );
    }

    #[test]
    fn test_numeric_prefix() {
        assert_eq!(numeric_prefix("12px"), "12");
        assert_eq!(numeric_prefix("-1.25e-3kg"), "-1.25e-3");
        assert_eq!(numeric_prefix("4e+"), "4");
        assert_eq!(numeric_prefix("+.x"), "");
        assert_eq!(numeric_prefix("abc"), "");
        assert_eq!(parse_token("1.5abc"), None);
    }

    #[test]
    fn test_whitespace_around_tokens_is_ignored() {
        let matrix = parse_matrix("  1.5 ,\t2 \r\n3,  4\r\n", ',');
        assert_eq!(matrix.to_rows(), vec![vec![1.5, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_ragged_rows_truncate_and_pad() {
        let matrix = parse_matrix("1,2\n3,4,5\n6", ',');
        assert_eq!(matrix.dim(), 2);
        assert_eq!(
            matrix.to_rows(),
            vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![6.0, 0.0]]
        );
    }

    #[test]
    fn test_blank_lines_are_not_rows() {
        let matrix = parse_matrix("1\n\n2\n   \n3\n", ',');
        assert_eq!(matrix.nrows(), 3);
        assert_eq!(matrix.dim(), 1);
    }

    #[test]
    fn test_custom_separator() {
        let matrix = parse_matrix("1\t2\n3\t4", '\t');
        assert_eq!(matrix.to_rows(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_from_rows_matches_parse_policy() {
        let matrix = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0], vec![4.0, 5.0, 6.0]]);
        assert_eq!(matrix, parse_matrix("1,2\n3\n4,5,6", ','));

        let empty: Vec<Vec<f64>> = Vec::new();
        assert!(Matrix::from_rows(&empty).is_empty());
    }

    #[test]
    fn test_load_matrix_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1,2").unwrap();
        writeln!(file, "3,4").unwrap();

        let matrix = load_matrix(file.path(), ',').unwrap();
        assert_eq!(matrix.nrows(), 2);
        assert_eq!(matrix.dim(), 2);
    }

    #[test]
    fn test_load_matrix_missing_file() {
        let result = load_matrix("/nonexistent/clusterpad/input.csv", ',');
        assert!(matches!(result, Err(crate::ClusterError::Io(_))));
    }
}

//! CSV tokenizer
//!
//! Comma-delimited, double-quote quoting with `""` as the escaped quote.
//! A quote opens a quoted run anywhere in a field, not only at its start, so
//! `x, "y,z"` is two fields. The first row is the header row (trimmed); the
//! remaining rows are returned untrimmed and unvalidated against the header
//! length.

use serde::Serialize;

/// Header row plus raw data rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ParsedCsv {
    /// Field `index` of `row`, empty when the row is short
    pub fn cell(row: &[String], index: usize) -> &str {
        row.get(index).map(String::as_str).unwrap_or("")
    }

    /// Map each header to the trimmed value of `row`.
    /// A later column wins when two headers share a name.
    pub fn row_map<'a>(&'a self, row: &'a [String]) -> Vec<(&'a str, &'a str)> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_str(), Self::cell(row, i).trim()))
            .collect()
    }
}

/// Tokenize CSV text into a header row and data rows.
///
/// `\n`, `\r\n` and a lone `\r` end a row outside quotes. A row holding a
/// single empty field is dropped once the header row exists. An unterminated
/// quote runs to the end of the input.
pub fn parse_csv(text: &str) -> ParsedCsv {
    if text.is_empty() {
        return ParsedCsv::default();
    }

    let mut records: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\n' | '\r' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(std::mem::take(&mut field));
                push_row(&mut records, std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    row.push(field);
    push_row(&mut records, row);

    let mut records = records.into_iter();
    let headers = records
        .next()
        .map(|h| h.iter().map(|s| s.trim().to_string()).collect())
        .unwrap_or_default();

    ParsedCsv {
        headers,
        rows: records.collect(),
    }
}

fn push_row(records: &mut Vec<Vec<String>>, row: Vec<String>) {
    // A lone empty field is a blank line once the header row exists
    if !records.is_empty() && row.len() == 1 && row[0].is_empty() {
        return;
    }
    records.push(row);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_and_rows() {
        let parsed = parse_csv("Date, Amount ,Account\n2024-01-01,-5,Checking\n");
        assert_eq!(parsed.headers, vec!["Date", "Amount", "Account"]);
        assert_eq!(parsed.rows, vec![vec!["2024-01-01", "-5", "Checking"]]);
    }

    #[test]
    fn test_quoted_fields() {
        let text = "a,b\n\"x, y\",\"she said \"\"hi\"\"\"\n\"multi\nline\",z\n";
        let parsed = parse_csv(text);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0], vec!["x, y", "she said \"hi\""]);
        assert_eq!(parsed.rows[1], vec!["multi\nline", "z"]);
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let parsed = parse_csv("a,b\r\n1,2\r\n\r\n3,4\r\n");
        assert_eq!(parsed.rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn test_data_fields_not_trimmed() {
        let parsed = parse_csv("a\n  padded  \n");
        assert_eq!(parsed.rows[0][0], "  padded  ");
        assert_eq!(parsed.row_map(&parsed.rows[0]), vec![("a", "padded")]);
    }

    #[test]
    fn test_ragged_rows() {
        let parsed = parse_csv("a,b,c\n1\n1,2,3,4\n");
        assert_eq!(parsed.rows[0].len(), 1);
        assert_eq!(parsed.rows[1].len(), 4);
        assert_eq!(ParsedCsv::cell(&parsed.rows[0], 2), "");
    }

    #[test]
    fn test_header_only_and_empty() {
        let parsed = parse_csv("a,b\n");
        assert_eq!(parsed.headers.len(), 2);
        assert!(parsed.rows.is_empty());

        let parsed = parse_csv("");
        assert!(parsed.headers.is_empty());
        assert!(parsed.rows.is_empty());
    }

    #[test]
    fn test_quote_after_leading_space() {
        let parsed = parse_csv("a,b\nx, \"y,z\"\n");
        assert_eq!(parsed.rows, vec![vec!["x", " y,z"]]);
    }

    #[test]
    fn test_quote_inside_field() {
        let parsed = parse_csv("a,b,c\nab\"c,d\"e,f\n");
        assert_eq!(parsed.rows, vec![vec!["abc,de", "f"]]);
    }

    #[test]
    fn test_escaped_quotes_round_trip() {
        let parsed = parse_csv("a\n\"a,\"\"b\"\",c\"\n");
        assert_eq!(parsed.rows[0], vec!["a,\"b\",c"]);
    }

    #[test]
    fn test_lone_carriage_return_ends_row() {
        let parsed = parse_csv("a,b\r1,2\r3,4");
        assert_eq!(parsed.rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    }
}

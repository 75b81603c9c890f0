//! JSON I/O handling for CLI
//!
//! - Input: one JSON value per line, blank lines ignored
//! - Output: one JSON response object per line
//! - UTF-8 only

use std::io::{BufRead, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Iterates the JSON values of `input`, paired with their 1-based line number
pub fn read_values<R: BufRead>(input: R) -> impl Iterator<Item = CliResult<(usize, Value)>> {
    input
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line_no = index + 1;
            match line {
                Err(e) => Some(Err(CliError::from(e))),
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(
                    serde_json::from_str(&line)
                        .map(|value| (line_no, value))
                        .map_err(|e| CliError::invalid_input(line_no, e.to_string())),
                ),
            }
        })
}

/// Write a success response
pub fn write_response<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    serde_json::to_writer(&mut *out, &response)?;
    writeln!(out)?;
    out.flush()?;

    Ok(())
}

/// Write an error response
pub fn write_error<W: Write>(out: &mut W, code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });

    serde_json::to_writer(&mut *out, &response)?;
    writeln!(out)?;
    out.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_values_skips_blank_lines() {
        let input = Cursor::new("{\"a\":1}\n\n  \n{\"b\":2}\n");
        let values: Vec<_> = read_values(input).map(|r| r.unwrap()).collect();

        assert_eq!(values.len(), 2);
        assert_eq!(values[0].0, 1);
        assert_eq!(values[1].0, 4);
        assert_eq!(values[1].1["b"], 2);
    }

    #[test]
    fn test_read_values_reports_bad_line() {
        let input = Cursor::new("{\"a\":1}\nnot json\n");
        let results: Vec<_> = read_values(input).collect();

        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err();
        assert!(err.message().starts_with("line 2"));
    }

    #[test]
    fn test_response_shapes() {
        let mut out = Vec::new();
        write_response(&mut out, serde_json::json!({"_id": 1})).unwrap();
        write_error(&mut out, "HOARD_NOT_FOUND", "missing").unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines[0]["status"], "ok");
        assert_eq!(lines[0]["data"]["_id"], 1);
        assert_eq!(lines[1]["status"], "error");
        assert_eq!(lines[1]["code"], "HOARD_NOT_FOUND");
    }
}

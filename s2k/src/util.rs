//! This module implements utility functions without much need for defining
//! context or not enough of it to warrant them having their own modules.
//!
//! Most of these deal with the `Label=value` tokens of export lines. A token
//! runs from right after its label up to the next space, or to the end of the
//! line if it's the last thing in it.

use std::io::{self, BufRead};
use std::str::FromStr;

use crate::decoders::RecordDecodeError;

/// The literal an export uses for a "true" flag.
pub const YES: &str = "Yes";

/// Removes carriage returns and turns comma decimal separators into periods.
/// Exports may use either convention depending on the locale they came from.
pub fn normalise_line(line: &str) -> String {
  return line
    .chars()
    .filter(|c| *c != '\r')
    .map(|c| if c == ',' { '.' } else { c })
    .collect();
}

/// Iterates over the lines of a reader like `BufRead::lines` does, except that
/// bytes which aren't UTF-8 get replaced instead of failing the read. Exports
/// saved under a Latin locale carry those in file names and descriptions.
/// Only a real I/O error comes out as an `Err`.
pub fn lossy_lines<R: BufRead>(
  reader: R
) -> impl Iterator<Item = io::Result<String>> {
  return reader.split(b'\n').map(|res| res.map(|mut bytes| {
    if bytes.last() == Some(&b'\r') {
      bytes.pop();
    }
    String::from_utf8_lossy(&bytes).into_owned()
  }));
}

/// Returns true for empty and whitespace-only lines.
pub fn is_blank(line: &str) -> bool {
  return line.chars().all(char::is_whitespace);
}

/// Finds the first occurrence of a label and returns the token after it.
pub fn field_token<'a>(line: &'a str, label: &str) -> Option<&'a str> {
  let start = line.find(label)? + label.len();
  let rest = &line[start..];
  let end = rest.find(' ').unwrap_or(rest.len());
  return Some(&rest[..end]);
}

/// Decodes the token after a label. An absent label is not an error, but a
/// token that doesn't parse is.
pub fn decode_field<T: FromStr>(
  line: &str,
  label: &'static str
) -> Result<Option<T>, RecordDecodeError> {
  return match field_token(line, label) {
    None => Ok(None),
    Some(tok) => tok.parse::<T>()
      .map(Some)
      .map_err(|_| RecordDecodeError::BadToken {
        label,
        token: tok.to_string()
      })
  };
}

/// Tests whether the token after a label is exactly "Yes". Anything else,
/// including a missing label, means false.
pub fn decode_flag(line: &str, label: &str) -> bool {
  return field_token(line, label) == Some(YES);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tokens_stop_at_spaces_or_line_end() {
    let line = "   Joint=12   XorR=1.5   Y=-2 Z=3";
    assert_eq!(field_token(line, "Joint="), Some("12"));
    assert_eq!(field_token(line, "XorR="), Some("1.5"));
    assert_eq!(field_token(line, " Y="), Some("-2"));
    assert_eq!(field_token(line, " Z="), Some("3"));
    assert_eq!(field_token(line, "Frame="), None);
    assert_eq!(field_token("Joint=", "Joint="), Some(""));
  }

  #[test]
  fn lines_survive_foreign_bytes() {
    let bytes: &[u8] = b"A\xF1ejo\r\nJoint=1\n\nlast";
    let lines: Vec<String> = lossy_lines(bytes)
      .collect::<Result<_, _>>()
      .unwrap();
    assert_eq!(lines, vec!["A\u{FFFD}ejo", "Joint=1", "", "last"]);
  }

  #[test]
  fn normalisation() {
    assert_eq!(normalise_line("XorR=1,25 Y=0,5\r"), "XorR=1.25 Y=0.5");
    assert!(is_blank(""));
    assert!(is_blank(" \t "));
    assert!(!is_blank(" x "));
  }

  #[test]
  fn field_decoding() {
    let line = "Joint=7 XorR=abc";
    assert_eq!(decode_field::<i64>(line, "Joint=").unwrap(), Some(7));
    assert_eq!(decode_field::<f64>(line, " Z=").unwrap(), None);
    assert!(decode_field::<f64>(line, "XorR=").is_err());
    assert!(decode_flag("U1=Yes U2=No", "U1="));
    assert!(!decode_flag("U1=Yes U2=No", "U2="));
    assert!(!decode_flag("U1=yes", "U1="));
    assert!(!decode_flag("U1=Yesterday", "U1="));
    assert!(!decode_flag("", "R3="));
  }
}

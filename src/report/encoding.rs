//! Output charsets of the HTML report

use serde::{Deserialize, Serialize};
use std::fmt;

/// Charset the HTML report is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Charset {
    #[default]
    #[serde(rename = "iso-8859-1", alias = "latin1", alias = "ISO-8859-1")]
    Latin1,
    #[serde(rename = "utf-8", alias = "utf8", alias = "UTF-8")]
    Utf8,
}

impl Charset {
    /// Name used in `<meta charset>`
    pub fn as_str(&self) -> &'static str {
        match self {
            Charset::Latin1 => "ISO-8859-1",
            Charset::Utf8 => "UTF-8",
        }
    }

    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Charset::Latin1 => encode_latin1(text),
            Charset::Utf8 => text.as_bytes().to_vec(),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Charset::Latin1 => decode_latin1(bytes),
            Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encode to ISO-8859-1. Characters past U+00FF become `&#N;` references,
/// so the input must already be HTML.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        let code = c as u32;
        if code <= 0xFF {
            out.push(code as u8);
        } else {
            out.extend_from_slice(format!("&#{};", code).as_bytes());
        }
    }
    out
}

/// Every byte maps to the code point of the same value
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_keeps_portuguese_accents_single_byte() {
        let bytes = encode_latin1("Ação");
        assert_eq!(bytes, vec![b'A', 0xE7, 0xE3, b'o']);
        assert_eq!(decode_latin1(&bytes), "Ação");
    }

    #[test]
    fn test_latin1_escapes_wide_characters() {
        assert_eq!(encode_latin1("a→b"), b"a&#8594;b".to_vec());
        assert_eq!(encode_latin1("✓"), b"&#10003;".to_vec());
    }

    #[test]
    fn test_charset_names() {
        let c: Charset = serde_yaml::from_str("iso-8859-1").unwrap();
        assert_eq!(c, Charset::Latin1);
        let c: Charset = serde_yaml::from_str("utf8").unwrap();
        assert_eq!(c, Charset::Utf8);
        assert_eq!(Charset::Latin1.to_string(), "ISO-8859-1");
    }
}

/*
 * source_map.rs
 * Copyright (c) 2025 Lesspack Contributors
 *
 * Source map (revision 3) data model and the line-oriented mappings
 * builder the bundled implementation emits through.
 */

use base64::alphabet;
use serde::{Deserialize, Serialize};

/// A source map in the standard revision 3 JSON shape.
///
/// `sources` entries use POSIX separators, which is what stylesheet
/// compilers emit on every platform. Consumers that want native paths
/// normalize them afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,

    pub sources: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<String>>,

    #[serde(default)]
    pub names: Vec<String>,

    pub mappings: String,
}

impl SourceMap {
    pub fn new() -> Self {
        Self {
            version: 3,
            file: None,
            source_root: None,
            sources: Vec::new(),
            sources_content: None,
            names: Vec::new(),
            mappings: String::new(),
        }
    }
}

impl Default for SourceMap {
    fn default() -> Self {
        Self::new()
    }
}

// Base64 VLQ as used by revision 3 mappings: sign in the lowest bit,
// then 5-bit groups with 0x20 marking continuation. Digits come from
// the standard base64 alphabet.
fn encode_vlq(out: &mut String, value: i64) {
    let standard = &alphabet::STANDARD;
    let digits = standard.as_str().as_bytes();

    let mut rest = if value < 0 {
        (((-value) as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };

    loop {
        let mut digit = (rest & 0x1f) as usize;
        rest >>= 5;
        if rest > 0 {
            digit |= 0x20;
        }
        out.push(digits[digit] as char);
        if rest == 0 {
            break;
        }
    }
}

/// Builds the `mappings` field one generated line at a time.
///
/// Each generated line maps either to the start of one source line or to
/// nothing. Field deltas carry across lines the way the format requires;
/// the generated column resets per line.
#[derive(Debug, Default)]
pub struct MappingsBuilder {
    lines: Vec<String>,
    prev_source: i64,
    prev_source_line: i64,
    prev_source_column: i64,
}

impl MappingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map the next generated line to `source_line` (0-based) of the
    /// source with index `source`.
    pub fn push_mapped(&mut self, source: usize, source_line: usize) {
        let mut segment = String::new();
        encode_vlq(&mut segment, 0);
        encode_vlq(&mut segment, source as i64 - self.prev_source);
        encode_vlq(&mut segment, source_line as i64 - self.prev_source_line);
        encode_vlq(&mut segment, -self.prev_source_column);

        self.prev_source = source as i64;
        self.prev_source_line = source_line as i64;
        self.prev_source_column = 0;
        self.lines.push(segment);
    }

    /// Emit a generated line with no source attribution.
    pub fn push_unmapped(&mut self) {
        self.lines.push(String::new());
    }

    /// Number of generated lines recorded so far.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn build(self) -> String {
        self.lines.join(";")
    }
}

//! Version 3 source maps.
//!
//! Mappings are added in generated order; each segment is delta-encoded
//! against the previous one as base64 VLQ.

use gesso_palette::{FxHashMap, String};
use serde::Serialize;

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Append `value` as a base64 VLQ
pub fn encode_vlq(out: &mut std::string::String, value: i64) {
    let mut vlq = if value < 0 { ((-value) << 1) | 1 } else { value << 1 };
    loop {
        let mut digit = (vlq & 0b11111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b100000;
        }
        out.push(BASE64[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceMap<'m> {
    version: u8,
    file: &'m str,
    sources: [&'m str; 1],
    sources_content: [&'m str; 1],
    names: &'m [String],
    mappings: &'m str,
}

/// Collects mappings from a single template to the generated code
#[derive(Debug)]
pub struct SourceMapBuilder {
    filename: String,
    source: String,
    names: std::vec::Vec<String>,
    name_indices: FxHashMap<String, i64>,
    mappings: std::string::String,
    line: u32,
    line_has_segment: bool,
    prev_column: i64,
    prev_source_line: i64,
    prev_source_column: i64,
    prev_name: i64,
}

impl SourceMapBuilder {
    pub fn new(filename: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            source: source.into(),
            names: std::vec::Vec::new(),
            name_indices: FxHashMap::default(),
            mappings: std::string::String::new(),
            line: 0,
            line_has_segment: false,
            prev_column: 0,
            prev_source_line: 0,
            prev_source_column: 0,
            prev_name: 0,
        }
    }

    /// Map generated `(line, column)` to the 0-based source position. All
    /// positions are 0-based.
    pub fn add_mapping(
        &mut self,
        generated_line: u32,
        generated_column: u32,
        source_line: u32,
        source_column: u32,
        name: Option<&str>,
    ) {
        debug_assert!(generated_line >= self.line, "mappings must be added in order");
        while self.line < generated_line {
            self.mappings.push(';');
            self.line += 1;
            self.line_has_segment = false;
            self.prev_column = 0;
        }
        if self.line_has_segment {
            self.mappings.push(',');
        }
        self.line_has_segment = true;

        let column = i64::from(generated_column);
        encode_vlq(&mut self.mappings, column - self.prev_column);
        self.prev_column = column;
        // single source
        encode_vlq(&mut self.mappings, 0);
        let source_line = i64::from(source_line);
        encode_vlq(&mut self.mappings, source_line - self.prev_source_line);
        self.prev_source_line = source_line;
        let source_column = i64::from(source_column);
        encode_vlq(&mut self.mappings, source_column - self.prev_source_column);
        self.prev_source_column = source_column;

        if let Some(name) = name {
            let index = self.name_index(name);
            encode_vlq(&mut self.mappings, index - self.prev_name);
            self.prev_name = index;
        }
    }

    fn name_index(&mut self, name: &str) -> i64 {
        if let Some(&index) = self.name_indices.get(name) {
            return index;
        }
        let index = self.names.len() as i64;
        self.names.push(String::from(name));
        self.name_indices.insert(String::from(name), index);
        index
    }

    pub fn mappings(&self) -> &str {
        &self.mappings
    }

    /// Serialized JSON
    pub fn to_json(&self) -> Option<std::string::String> {
        let raw = RawSourceMap {
            version: 3,
            file: &self.filename,
            sources: [&self.filename],
            sources_content: [&self.source],
            names: &self.names,
            mappings: &self.mappings,
        };
        match serde_json::to_string(&raw) {
            Ok(json) => Some(json),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize source map");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlq(value: i64) -> std::string::String {
        let mut out = std::string::String::new();
        encode_vlq(&mut out, value);
        out
    }

    #[test]
    fn test_vlq() {
        assert_eq!(vlq(0), "A");
        assert_eq!(vlq(1), "C");
        assert_eq!(vlq(-1), "D");
        assert_eq!(vlq(15), "e");
        assert_eq!(vlq(16), "gB");
        assert_eq!(vlq(-17), "jB");
    }

    #[test]
    fn test_mappings_and_names() {
        let mut map = SourceMapBuilder::new("App.vue", "<div>{{ msg }}</div>");
        map.add_mapping(0, 4, 0, 0, None);
        map.add_mapping(0, 10, 0, 8, Some("msg"));
        map.add_mapping(2, 2, 0, 8, Some("msg"));
        assert_eq!(map.mappings(), "IAAA,MAAQA;;EAAAA");

        let json: serde_json::Value = serde_json::from_str(&map.to_json().unwrap()).unwrap();
        assert_eq!(json["version"], 3);
        assert_eq!(json["names"][0], "msg");
        assert_eq!(json["sourcesContent"][0], "<div>{{ msg }}</div>");
    }
}

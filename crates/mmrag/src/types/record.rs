//! Records persisted to the vector store

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::document::SourceType;

/// Position of a record within its document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkIndex {
    /// A text chunk
    Position(u32),
    /// The single whole-image vector of an image document
    Image,
}

impl ChunkIndex {
    /// Key used when deriving the record id
    pub fn key(&self) -> String {
        match self {
            Self::Position(i) => i.to_string(),
            Self::Image => "image".to_string(),
        }
    }
}

impl fmt::Display for ChunkIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl Serialize for ChunkIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Position(i) => serializer.serialize_u32(*i),
            Self::Image => serializer.serialize_str("image"),
        }
    }
}

impl<'de> Deserialize<'de> for ChunkIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u32),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Num(i) => Ok(Self::Position(i)),
            Raw::Str(s) if s == "image" => Ok(Self::Image),
            Raw::Str(s) => s
                .parse()
                .map(Self::Position)
                .map_err(|_| serde::de::Error::custom(format!("invalid chunk_index '{}'", s))),
        }
    }
}

/// Inclusive `start-end` range (pages or lines), stored as `"start-end"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanRange {
    pub start: u32,
    pub end: u32,
}

impl SpanRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for SpanRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for SpanRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (start, end) = match s.split_once('-') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (s, s),
        };
        let start = start
            .parse()
            .map_err(|_| format!("invalid range start in '{}'", s))?;
        let end = end.parse().map_err(|_| format!("invalid range end in '{}'", s))?;
        if end < start {
            return Err(format!("range '{}' ends before it starts", s));
        }
        Ok(Self { start, end })
    }
}

impl Serialize for SpanRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SpanRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Metadata stored next to each vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordPayload {
    /// Chunk text, or the whole OCR text for the image vector; never absent
    #[serde(default)]
    pub text: String,
    pub filename: String,
    pub doc_id: String,
    pub chunk_index: ChunkIndex,
    pub source_type: SourceType,
    pub page_range: Option<SpanRange>,
    pub line_range: Option<SpanRange>,
    pub page_number: Option<u32>,
    pub audio_start: Option<f64>,
    pub audio_end: Option<f64>,
}

/// Unit written to the vector store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexRecord {
    /// Deterministic in `(doc_id, chunk_index)`
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: RecordPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_index_wire_format() {
        assert_eq!(serde_json::to_value(ChunkIndex::Position(3)).unwrap(), 3);
        assert_eq!(serde_json::to_value(ChunkIndex::Image).unwrap(), "image");

        let parsed: ChunkIndex = serde_json::from_str("\"image\"").unwrap();
        assert_eq!(parsed, ChunkIndex::Image);
        let parsed: ChunkIndex = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, ChunkIndex::Position(7));
        assert!(serde_json::from_str::<ChunkIndex>("\"video\"").is_err());
    }

    #[test]
    fn test_span_range_parsing() {
        assert_eq!("2-4".parse::<SpanRange>().unwrap(), SpanRange::new(2, 4));
        assert_eq!("5".parse::<SpanRange>().unwrap(), SpanRange::new(5, 5));
        assert!("4-2".parse::<SpanRange>().is_err());
        assert!("a-b".parse::<SpanRange>().is_err());
        assert_eq!(SpanRange::new(1, 3).to_string(), "1-3");
    }

    #[test]
    fn test_payload_text_defaults_to_empty() {
        let payload: RecordPayload = serde_json::from_value(serde_json::json!({
            "filename": "scan.png",
            "doc_id": "d",
            "chunk_index": "image",
            "source_type": "image",
            "page_range": null,
            "line_range": null,
            "page_number": null,
            "audio_start": null,
            "audio_end": null
        }))
        .unwrap();
        assert_eq!(payload.text, "");
        assert_eq!(payload.chunk_index, ChunkIndex::Image);
    }
}

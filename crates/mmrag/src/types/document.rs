//! Extracted documents and the chunks derived from them

use serde::{Deserialize, Serialize};

/// Modality a record was derived from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// PDF, DOCX or plain text
    Text,
    /// OCR'd image, or the image-global vector
    Image,
    /// Transcribed audio
    Audio,
}

impl SourceType {
    /// Payload string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of extracted text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Line {
    /// Global line number, 1-based, not reset per page
    pub line_number: u32,
    /// Line text
    pub text: String,
}

/// One page of extracted text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,
    /// Lines in reading order
    pub lines: Vec<Line>,
}

/// A time-coded transcript segment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds (>= start)
    pub end: f64,
    /// Transcribed text
    pub text: String,
}

/// Uniform output of every extractor
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractedDocument {
    /// Whole-document text the chunker runs over
    pub full_text: String,
    /// Pages in order
    pub pages: Vec<Page>,
    /// Transcript segments, only for audio sources
    pub segments: Option<Vec<AudioSegment>>,
}

impl ExtractedDocument {
    /// Build a document from per-page texts, numbering lines globally.
    ///
    /// Blank lines are dropped; pages are joined with a blank line.
    pub fn from_page_texts<I, S>(page_texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut pages = Vec::new();
        let mut full = Vec::new();
        let mut line_number = 0u32;

        for (i, text) in page_texts.into_iter().enumerate() {
            let text = text.as_ref().trim();
            let lines = text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(|l| {
                    line_number += 1;
                    Line {
                        line_number,
                        text: l.to_string(),
                    }
                })
                .collect();

            pages.push(Page {
                number: i as u32 + 1,
                lines,
            });
            full.push(text.to_string());
        }

        Self {
            full_text: full.join("\n\n"),
            pages,
            segments: None,
        }
    }

    /// Single-page document from a transcript and its segments.
    ///
    /// The page has no lines: audio chunks are located by time, not by page.
    pub fn from_transcript(text: &str, segments: Vec<AudioSegment>) -> Self {
        Self {
            full_text: text.trim().to_string(),
            pages: vec![Page {
                number: 1,
                lines: Vec::new(),
            }],
            segments: Some(segments),
        }
    }

    /// True when extraction produced nothing to chunk
    pub fn is_empty(&self) -> bool {
        self.full_text.trim().is_empty()
    }

    /// True for transcribed audio
    pub fn has_segments(&self) -> bool {
        self.segments.is_some()
    }

    /// Number of lines across all pages
    pub fn line_count(&self) -> usize {
        self.pages.iter().map(|p| p.lines.len()).sum()
    }
}

/// A word-window of a document's text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Position within the document, 0-based
    pub index: u32,
    /// Window text (non-empty)
    pub text: String,
    /// First line the chunk is attributed to
    pub start_line: u32,
    /// Last line the chunk is attributed to (>= start_line)
    pub end_line: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_numbers_continue_across_pages() {
        let doc = ExtractedDocument::from_page_texts(["first\nsecond\n", "\nthird\n\nfourth"]);

        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[0].number, 1);
        assert_eq!(doc.pages[1].number, 2);

        let numbers: Vec<u32> = doc
            .pages
            .iter()
            .flat_map(|p| p.lines.iter().map(|l| l.line_number))
            .collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(doc.full_text, "first\nsecond\n\nthird\n\nfourth");
        assert_eq!(doc.line_count(), 4);
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        let doc = ExtractedDocument::from_page_texts(["  \n\t", ""]);
        assert!(doc.is_empty());
        assert!(!doc.has_segments());
    }

    #[test]
    fn test_transcript_page_has_no_lines() {
        let segments = vec![AudioSegment {
            start: 0.0,
            end: 2.0,
            text: "one line\nanother".to_string(),
        }];
        let doc = ExtractedDocument::from_transcript(" one line\nanother ", segments);

        assert_eq!(doc.full_text, "one line\nanother");
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.line_count(), 0);
        assert!(doc.has_segments());
    }

    #[test]
    fn test_source_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&SourceType::Audio).unwrap(), "\"audio\"");
        assert_eq!(SourceType::Image.to_string(), "image");
    }
}

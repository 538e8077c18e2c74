//! Maps chunks back to page, line and audio-time ranges.
//!
//! Line attribution is approximate: each chunk is split on ". " and every
//! fragment counts as one line, continuing a running counter from the previous
//! chunk. Audio attribution is a literal substring test of those fragments
//! against segment texts, so repeated sentences can be attributed to the
//! wrong segment. Both are best-effort provenance, not alignment.

use std::collections::BTreeMap;

use crate::types::{AudioSegment, Chunk, ExtractedDocument, SpanRange};

/// Sentence separator used to approximate lines
const FRAGMENT_SEPARATOR: &str = ". ";

/// Provenance attached to one chunk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Provenance {
    /// `(min, max)` page covered by the chunk's line range
    pub page_range: Option<SpanRange>,
    /// First page covered
    pub page_number: Option<u32>,
    /// Line range, None when no page maps to it
    pub line_range: Option<SpanRange>,
    pub audio_start: Option<f64>,
    pub audio_end: Option<f64>,
}

/// Sequential correlator over one document.
///
/// Must be fed chunks in index order: the line counter carries over from
/// one chunk to the next.
pub struct ProvenanceCorrelator<'a> {
    line_to_page: BTreeMap<u32, u32>,
    segments: Option<&'a [AudioSegment]>,
    line_counter: u32,
}

impl<'a> ProvenanceCorrelator<'a> {
    /// Build the line -> page table for `doc`
    pub fn new(doc: &'a ExtractedDocument) -> Self {
        let line_to_page = doc
            .pages
            .iter()
            .flat_map(|page| page.lines.iter().map(move |line| (line.line_number, page.number)))
            .collect();

        Self {
            line_to_page,
            segments: doc.segments.as_deref(),
            line_counter: 0,
        }
    }

    /// Correlate the next chunk in order
    pub fn next_chunk(&mut self, index: u32, text: &str) -> (Chunk, Provenance) {
        let fragments = sentence_fragments(text);

        let start_line = self.line_counter + 1;
        let end_line = self.line_counter + fragments.len() as u32;
        self.line_counter = end_line;

        let mut provenance = self.pages_for(start_line, end_line);
        if let Some(segments) = self.segments {
            let (start, end) = audio_span(segments, &fragments);
            provenance.audio_start = start;
            provenance.audio_end = end;
        }

        let chunk = Chunk {
            index,
            text: text.to_string(),
            start_line,
            end_line,
        };

        (chunk, provenance)
    }

    /// Correlate every chunk of a document in order
    pub fn correlate_all(doc: &ExtractedDocument, texts: &[String]) -> Vec<(Chunk, Provenance)> {
        let mut correlator = ProvenanceCorrelator::new(doc);
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| correlator.next_chunk(i as u32, text))
            .collect()
    }

    fn pages_for(&self, start_line: u32, end_line: u32) -> Provenance {
        // BTreeMap iteration gives ascending lines; pages are monotonic in lines
        let mut pages = self
            .line_to_page
            .range(start_line..=end_line)
            .map(|(_, page)| *page);

        let Some(first) = pages.next() else {
            return Provenance::default();
        };
        let (min, max) = pages.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));

        Provenance {
            page_range: Some(SpanRange::new(min, max)),
            page_number: Some(min),
            line_range: Some(SpanRange::new(start_line, end_line)),
            audio_start: None,
            audio_end: None,
        }
    }
}

/// Split chunk text into pseudo-lines on ". "
pub fn sentence_fragments(text: &str) -> Vec<&str> {
    text.split(FRAGMENT_SEPARATOR).collect()
}

/// Min start / max end over segments containing any fragment verbatim
fn audio_span(segments: &[AudioSegment], fragments: &[&str]) -> (Option<f64>, Option<f64>) {
    // an empty fragment (from a lone "." word) is contained in every segment
    let fragments: Vec<&str> = fragments.iter().map(|f| f.trim()).collect();

    let mut start: Option<f64> = None;
    let mut end: Option<f64> = None;

    for segment in segments {
        let segment_text = segment.text.trim();
        if fragments.iter().any(|f| segment_text.contains(f)) {
            start = Some(start.map_or(segment.start, |s| s.min(segment.start)));
            end = Some(end.map_or(segment.end, |e| e.max(segment.end)));
        }
    }

    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::WordChunker;
    use crate::types::{Line, Page};

    fn doc_with_pages(lines_per_page: &[u32]) -> ExtractedDocument {
        let mut number = 0;
        let pages = lines_per_page
            .iter()
            .enumerate()
            .map(|(i, &count)| Page {
                number: i as u32 + 1,
                lines: (0..count)
                    .map(|_| {
                        number += 1;
                        Line {
                            line_number: number,
                            text: format!("line {}", number),
                        }
                    })
                    .collect(),
            })
            .collect();

        ExtractedDocument {
            full_text: String::new(),
            pages,
            segments: None,
        }
    }

    #[test]
    fn test_fragments_drive_line_ranges() {
        let doc = doc_with_pages(&[2, 3]);
        let texts = vec![
            "One. Two. Three".to_string(),
            "Four. Five".to_string(),
            "Six".to_string(),
        ];
        let out = ProvenanceCorrelator::correlate_all(&doc, &texts);

        assert_eq!((out[0].0.start_line, out[0].0.end_line), (1, 3));
        assert_eq!((out[1].0.start_line, out[1].0.end_line), (4, 5));
        assert_eq!((out[2].0.start_line, out[2].0.end_line), (6, 6));

        assert_eq!(out[0].1.page_range, Some(SpanRange::new(1, 2)));
        assert_eq!(out[0].1.page_number, Some(1));
        assert_eq!(out[0].1.line_range, Some(SpanRange::new(1, 3)));

        assert_eq!(out[1].1.page_range, Some(SpanRange::new(2, 2)));
        assert_eq!(out[1].1.page_number, Some(2));

        // Line 6 is past the last extracted line
        assert_eq!(out[2].1, Provenance::default());
    }

    #[test]
    fn test_line_ranges_are_monotonic() {
        let doc = doc_with_pages(&[10, 10, 10]);
        let text = (0..200)
            .map(|i| if i % 7 == 0 { format!("w{}.", i) } else { format!("w{}", i) })
            .collect::<Vec<_>>()
            .join(" ");
        let chunker = WordChunker::new(20, 5).unwrap();
        let out = ProvenanceCorrelator::correlate_all(&doc, &chunker.chunk(&text));

        for pair in out.windows(2) {
            let (prev, next) = (&pair[0].0, &pair[1].0);
            assert!(prev.start_line <= prev.end_line);
            assert_eq!(next.start_line, prev.end_line + 1);
        }
    }

    #[test]
    fn test_audio_segment_overlap() {
        let mut doc = doc_with_pages(&[1]);
        doc.segments = Some(vec![AudioSegment {
            start: 0.0,
            end: 5.0,
            text: "hello world".to_string(),
        }]);

        let out = ProvenanceCorrelator::correlate_all(&doc, &["hello world".to_string()]);
        assert_eq!(out[0].1.audio_start, Some(0.0));
        assert_eq!(out[0].1.audio_end, Some(5.0));
    }

    #[test]
    fn test_audio_span_takes_min_start_max_end() {
        let segments = vec![
            AudioSegment { start: 0.0, end: 2.5, text: " The cat sat".to_string() },
            AudioSegment { start: 2.5, end: 4.0, text: " Unrelated words".to_string() },
            AudioSegment { start: 4.0, end: 7.25, text: " It purred".to_string() },
        ];
        let (start, end) = audio_span(&segments, &sentence_fragments("The cat sat. It purred"));
        assert_eq!(start, Some(0.0));
        assert_eq!(end, Some(7.25));
    }

    #[test]
    fn test_audio_match_is_case_sensitive() {
        let segments = vec![AudioSegment {
            start: 1.0,
            end: 2.0,
            text: "Hello World".to_string(),
        }];
        assert_eq!(audio_span(&segments, &["hello world"]), (None, None));
    }

    #[test]
    fn test_lone_period_spans_every_segment() {
        let segments = vec![
            AudioSegment { start: 0.0, end: 1.0, text: " first".to_string() },
            AudioSegment { start: 1.0, end: 3.5, text: " second".to_string() },
        ];
        let fragments = sentence_fragments("done. . zzz");
        assert!(fragments.contains(&""));
        assert_eq!(audio_span(&segments, &fragments), (Some(0.0), Some(3.5)));
    }

    #[test]
    fn test_transcript_chunks_have_no_page() {
        let doc = ExtractedDocument::from_transcript(
            "hello world. goodbye now",
            vec![
                AudioSegment { start: 0.0, end: 2.0, text: " hello world.".to_string() },
                AudioSegment { start: 2.0, end: 3.0, text: " goodbye now".to_string() },
            ],
        );
        let chunker = WordChunker::new(2, 0).unwrap();
        let out = ProvenanceCorrelator::correlate_all(&doc, &chunker.chunk(&doc.full_text));

        assert_eq!(out.len(), 2);
        for (_, provenance) in &out {
            assert_eq!(provenance.page_number, None);
            assert_eq!(provenance.page_range, None);
            assert_eq!(provenance.line_range, None);
        }
        assert_eq!(out[1].1.audio_start, Some(2.0));
    }

    #[test]
    fn test_no_segments_means_no_audio_range() {
        let doc = doc_with_pages(&[3]);
        let out = ProvenanceCorrelator::correlate_all(&doc, &["hello world".to_string()]);
        assert_eq!(out[0].1.audio_start, None);
        assert_eq!(out[0].1.audio_end, None);
    }
}

//! Word-window text chunking

use crate::config::ChunkingConfig;
use crate::error::Result;

/// Splits text into overlapping windows of whitespace-separated words.
///
/// Windows are word-aligned: text without whitespace (e.g. CJK) becomes a
/// single word.
#[derive(Debug, Clone)]
pub struct WordChunker {
    /// Words per window
    window_size: usize,
    /// Words shared by consecutive windows
    overlap: usize,
}

impl WordChunker {
    /// Create a chunker, rejecting `overlap >= window_size`
    pub fn new(window_size: usize, overlap: usize) -> Result<Self> {
        ChunkingConfig {
            window_size,
            overlap,
        }
        .validate()?;

        Ok(Self {
            window_size,
            overlap,
        })
    }

    /// Create from config
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.window_size, config.overlap)
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk `text` into window strings, words joined by single spaces
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        self.windows(words.len())
            .into_iter()
            .map(|(i, j)| words[i..j].join(" "))
            .collect()
    }

    /// Word-index bounds `[start, end)` of every window over `n` words
    pub fn windows(&self, n: usize) -> Vec<(usize, usize)> {
        let mut bounds = Vec::new();
        let mut i = 0usize;

        while i < n {
            let j = (i + self.window_size).min(n);
            bounds.push((i, j));
            if j == n {
                break;
            }
            i = j - self.overlap;
        }

        bounds
    }
}

impl Default for WordChunker {
    fn default() -> Self {
        let config = ChunkingConfig::default();
        Self {
            window_size: config.window_size,
            overlap: config.overlap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_chunk_scenario() {
        let chunker = WordChunker::new(3, 1).unwrap();
        let chunks = chunker.chunk("a b c d e f g h");
        assert_eq!(chunks, vec!["a b c", "c d e", "e f g", "g h"]);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let chunker = WordChunker::new(3, 1).unwrap();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\t ").is_empty());
    }

    #[test]
    fn test_overlap_not_smaller_than_window_rejected() {
        assert!(WordChunker::new(3, 3).is_err());
        assert!(WordChunker::new(3, 5).is_err());
        assert!(WordChunker::new(0, 0).is_err());
    }

    #[test]
    fn test_short_text_is_one_window() {
        let chunker = WordChunker::new(150, 50).unwrap();
        assert_eq!(chunker.chunk("only three words"), vec!["only three words"]);
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let chunker = WordChunker::new(2, 0).unwrap();
        assert_eq!(chunker.chunk("a\n\nb   c\td"), vec!["a b", "c d"]);
    }

    #[test]
    fn test_unspaced_text_is_one_word() {
        let chunker = WordChunker::new(2, 1).unwrap();
        assert_eq!(chunker.chunk("日本語のテキスト"), vec!["日本語のテキスト"]);
    }

    proptest! {
        #[test]
        fn prop_windows_cover_every_word(n in 1usize..400, w in 1usize..40, o_seed in 0usize..40) {
            let o = o_seed % w;
            let chunker = WordChunker::new(w, o).unwrap();
            let windows = chunker.windows(n);

            prop_assert!(!windows.is_empty());
            prop_assert_eq!(windows[0].0, 0);
            prop_assert_eq!(windows.last().unwrap().1, n);

            let mut covered = vec![false; n];
            for &(i, j) in &windows {
                prop_assert!(i < j);
                prop_assert!(j - i <= w);
                covered[i..j].iter_mut().for_each(|c| *c = true);
            }
            prop_assert!(covered.into_iter().all(|c| c));

            for pair in windows.windows(2) {
                let (prev, next) = (pair[0], pair[1]);
                prop_assert_eq!(prev.1 - next.0, o);
                prop_assert_eq!(prev.1 - prev.0, w);
            }

            let expected = if n <= w { 1 } else { (n - o + (w - o) - 1) / (w - o) };
            prop_assert_eq!(windows.len(), expected);
        }
    }
}

//! Token-aware text chunking.
//!
//! The primary path tokenizes with the cl100k_base encoding and splits into
//! consecutive, non-overlapping windows of exactly `max_tokens` tokens (the
//! final window may be shorter), decoding each window back to text. When the
//! tokenizer is unavailable the chunker falls back to sentence-boundary
//! accumulation against an approximate character budget of `max_tokens * 4`.
//!
//! Chunking is a pure function of its input: identical text always yields
//! identical chunk boundaries.

use tiktoken_rs::CoreBPE;
use tracing::warn;

/// Splits normalized text into embeddable chunks.
pub struct TokenChunker {
    encoder: Option<CoreBPE>,
    max_tokens: usize,
    min_chunk_chars: usize,
}

impl TokenChunker {
    /// Create a chunker with the given token budget per chunk.
    ///
    /// Chunks shorter than `min_chunk_chars` after trimming are discarded as
    /// noise (typically stray headers).
    pub fn new(max_tokens: usize, min_chunk_chars: usize) -> Self {
        let encoder = match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                warn!("cl100k_base tokenizer unavailable, using sentence fallback: {}", e);
                None
            }
        };
        Self {
            encoder,
            max_tokens,
            min_chunk_chars,
        }
    }

    /// Split `text` into chunks of at most `max_tokens` tokens each.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let chunks = match &self.encoder {
            Some(bpe) => match self.token_chunks(bpe, text) {
                Some(chunks) => chunks,
                None => self.sentence_chunks(text),
            },
            None => self.sentence_chunks(text),
        };

        chunks
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| c.len() >= self.min_chunk_chars)
            .collect()
    }

    /// Token-window path. Returns `None` if a window fails to decode, in
    /// which case the caller falls back to sentence accumulation.
    fn token_chunks(&self, bpe: &CoreBPE, text: &str) -> Option<Vec<String>> {
        let tokens = bpe.encode_ordinary(text);
        let mut chunks = Vec::with_capacity(tokens.len() / self.max_tokens.max(1) + 1);

        for window in tokens.chunks(self.max_tokens.max(1)) {
            match bpe.decode(window.to_vec()) {
                Ok(piece) => chunks.push(piece),
                Err(e) => {
                    warn!("token window failed to decode: {}", e);
                    return None;
                }
            }
        }

        Some(chunks)
    }

    /// Sentence-accumulation fallback with a `max_tokens * 4` character
    /// budget per chunk.
    pub fn sentence_chunks(&self, text: &str) -> Vec<String> {
        let budget = self.max_tokens * 4;
        let mut chunks = Vec::new();
        let mut current = String::new();

        for sentence in split_sentences(text) {
            if current.len() + sentence.len() > budget {
                if current.is_empty() {
                    chunks.push(sentence);
                } else {
                    chunks.push(std::mem::take(&mut current));
                    current = sentence;
                }
            } else if current.is_empty() {
                current = sentence;
            } else {
                current.push(' ');
                current.push_str(&sentence);
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }
}

/// Split text on sentence terminators followed by whitespace or end of input.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().map_or(true, |n| n.is_whitespace()) {
            let sentence = current.trim().to_string();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            current.clear();
        }
    }

    let tail = current.trim().to_string();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_short_sentence_is_one_chunk() {
        let chunker = TokenChunker::new(500, 20);
        let chunks = chunker.chunk("Manas knows Python, Go, and Rust.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "Manas knows Python, Go, and Rust.");
    }

    #[test]
    fn test_chunks_respect_token_bound() {
        let chunker = TokenChunker::new(8, 1);
        let bpe = tiktoken_rs::cl100k_base().unwrap();
        let text = "The quick brown fox jumps over the lazy dog. \
                    Pack my box with five dozen liquor jugs. \
                    How vexingly quick daft zebras jump.";

        let chunks = chunker.chunk(text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(bpe.encode_ordinary(chunk).len() <= 8, "chunk too long: {:?}", chunk);
        }
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let chunker = TokenChunker::new(12, 1);
        let text = "Alpha beta gamma delta. Epsilon zeta eta theta. Iota kappa lambda mu.";
        assert_eq!(chunker.chunk(text), chunker.chunk(text));
    }

    #[test]
    fn test_short_chunks_discarded() {
        let chunker = TokenChunker::new(2, 20);
        // Every two-token window is far shorter than 20 chars.
        let chunks = chunker.chunk("a b c d e f");
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_sentence_fallback_accumulates_to_budget() {
        let chunker = TokenChunker::new(10, 1); // 40-char budget
        let text = "First sentence here. Second sentence here. Third sentence here.";
        let chunks = chunker.sentence_chunks(text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            // A single sentence may exceed the budget, pairs may not.
            assert!(chunk.len() <= 40 || !chunk.contains(". "));
        }
    }

    #[test]
    fn test_split_sentences_handles_terminators() {
        let sentences = split_sentences("One. Two! Three? Four");
        assert_eq!(sentences, vec!["One.", "Two!", "Three?", "Four"]);
    }

    #[test]
    fn test_abbreviation_mid_word_not_split() {
        // A period not followed by whitespace stays inside the sentence.
        let sentences = split_sentences("See example.com for details. Done.");
        assert_eq!(
            sentences,
            vec!["See example.com for details.", "Done."]
        );
    }
}

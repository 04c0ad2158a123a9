//! Overlapping word-window chunker and content hashing.
//!
//! Splits extracted document text into fixed-size word windows that overlap
//! by a configurable number of words, so context at window boundaries is
//! preserved. Each chunk's identity is derived from its source, ordinal, and
//! a SHA-256 content hash, which makes re-insertion of identical content a
//! detectable no-op.

use sha2::{Digest, Sha256};

use crate::error::Error;

/// Number of hash characters carried into a chunk identity. Short enough to
/// stay human-inspectable; collisions are already qualified by source and
/// ordinal.
const ID_HASH_CHARS: usize = 12;

/// Split `text` into windows of `window` words advancing by
/// `window - overlap` words per step. Windows are joined with single spaces;
/// empty windows are dropped. Empty input produces an empty vector.
///
/// Fails when `overlap >= window`, which would make the step non-positive.
pub fn chunk_words(text: &str, window: usize, overlap: usize) -> Result<Vec<String>, Error> {
    if window == 0 {
        return Err(Error::Config("chunk window must be > 0".to_string()));
    }
    if overlap >= window {
        return Err(Error::Config(format!(
            "chunk overlap ({}) must be smaller than window ({})",
            overlap, window
        )));
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let step = window - overlap;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + window).min(words.len());
        let joined = words[start..end].join(" ");
        if !joined.trim().is_empty() {
            chunks.push(joined);
        }
        start += step;
    }

    Ok(chunks)
}

/// SHA-256 of the UTF-8 encoding of `text`, as 64 lowercase hex characters.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Chunk identity: `{source}_{ordinal}_{hash prefix}`.
///
/// Identical text always yields the same hash suffix, but source and ordinal
/// keep the same text from different documents (or different positions in
/// one document) distinct. Deduplication is therefore scoped to exact
/// re-insertion of the same (source, ordinal, text) tuple.
pub fn chunk_id(source: &str, ordinal: usize, text: &str) -> String {
    let hash = content_hash(text);
    format!("{}_{}_{}", source, ordinal, &hash[..ID_HASH_CHARS])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn thousand_words_default_window() {
        // Starts at 0, 450, 900.
        let text = words(1000);
        let chunks = chunk_words(&text, 500, 50).unwrap();
        assert_eq!(chunks.len(), 3);
        for c in &chunks {
            assert!(c.split_whitespace().count() <= 500);
        }
        assert!(chunks[0].starts_with("w0 "));
        assert!(chunks[1].starts_with("w450 "));
        assert!(chunks[2].starts_with("w900 "));
    }

    #[test]
    fn consecutive_chunks_share_overlap_words() {
        let text = words(1000);
        let chunks = chunk_words(&text, 500, 50).unwrap();
        let first: Vec<&str> = chunks[0].split_whitespace().collect();
        let second: Vec<&str> = chunks[1].split_whitespace().collect();
        // Last 50 words of chunk 0 == first 50 words of chunk 1.
        assert_eq!(&first[450..], &second[..50]);
    }

    #[test]
    fn short_text_single_chunk() {
        let chunks = chunk_words("hello world", 500, 50).unwrap();
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_words("", 500, 50).unwrap().is_empty());
        assert!(chunk_words("   \n\t  ", 500, 50).unwrap().is_empty());
    }

    #[test]
    fn collapses_whitespace_runs() {
        let chunks = chunk_words("a  b\n\nc\td", 500, 50).unwrap();
        assert_eq!(chunks, vec!["a b c d".to_string()]);
    }

    #[test]
    fn overlap_equal_to_window_is_rejected() {
        let err = chunk_words("some text", 50, 50).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = chunk_words("some text", 50, 80).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn deterministic() {
        let text = words(700);
        assert_eq!(
            chunk_words(&text, 500, 50).unwrap(),
            chunk_words(&text, 500, 50).unwrap()
        );
    }

    #[test]
    fn hash_of_hello_is_stable() {
        let h = content_hash("hello");
        assert_eq!(h.len(), 64);
        assert_eq!(
            h,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn chunk_id_incorporates_source_and_ordinal() {
        let a = chunk_id("doc.pdf", 0, "same text");
        let b = chunk_id("doc.pdf", 1, "same text");
        let c = chunk_id("other.pdf", 0, "same text");
        assert_ne!(a, b);
        assert_ne!(a, c);
        // Identical tuple yields identical identity.
        assert_eq!(a, chunk_id("doc.pdf", 0, "same text"));
        // Hash suffix is 12 hex chars.
        let suffix = a.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 12);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

//! Word-bounded text chunking for speech playback.

use super::TextChunk;

/// Default target chunk size in words.
pub const DEFAULT_CHUNK_WORDS: usize = 10_000;

/// Split text into chunks of at most `target_size` words.
///
/// Words are never split. Every chunk except possibly the last holds exactly
/// `target_size` words; the last holds the remainder. A `target_size` of 0
/// is treated as 1.
///
/// # Returns
/// An empty list for empty or whitespace-only input.
pub fn chunk(text: &str, target_size: usize) -> Vec<TextChunk> {
    let target_size = target_size.max(1);
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::with_capacity(target_size.min(1024));

    for word in text.split_whitespace() {
        current.push(word);

        if current.len() >= target_size {
            chunks.push(close_chunk(&current));
            current.clear();
        }
    }

    // Don't forget the remainder
    if !current.is_empty() {
        chunks.push(close_chunk(&current));
    }

    chunks
}

fn close_chunk(words: &[&str]) -> TextChunk {
    TextChunk {
        text: words.join(" "),
        word_count: words.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_chunk_empty_text() {
        assert!(chunk("", 10).is_empty());
        assert!(chunk("  \n\t ", 10).is_empty());
    }

    #[test]
    fn test_chunk_short_text() {
        let chunks = chunk("Hello world. How are you?", 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello world. How are you?");
        assert_eq!(chunks[0].word_count, 5);
    }

    #[test]
    fn test_chunk_exact_multiple() {
        let chunks = chunk("one two three four", 2);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "one two");
        assert_eq!(chunks[1].text, "three four");
    }

    #[test]
    fn test_chunk_remainder() {
        let chunks = chunk("one two three four five", 2);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["one two", "three four", "five"]);
        assert_eq!(chunks[2].word_count, 1);
    }

    #[test]
    fn test_chunk_collapses_inner_whitespace() {
        let chunks = chunk("  one\n\ntwo\tthree  ", 5);
        assert_eq!(chunks[0].text, "one two three");
    }

    #[test]
    fn test_chunk_zero_target_treated_as_one() {
        let chunks = chunk("a b c", 0);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.word_count == 1));
    }

    proptest! {
        #[test]
        fn prop_chunks_reconstruct_text(
            words in prop::collection::vec("[a-zA-Z0-9.,;]{1,8}", 0..200),
            size in 1usize..40,
        ) {
            let text = words.join(" ");
            let chunks = chunk(&text, size);

            let rejoined: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
            prop_assert_eq!(rejoined.join(" "), text);

            if let Some((last, full)) = chunks.split_last() {
                prop_assert!(full.iter().all(|c| c.word_count == size));
                prop_assert!(last.word_count >= 1 && last.word_count <= size);
            }
            for c in &chunks {
                prop_assert_eq!(c.word_count, c.text.split_whitespace().count());
            }
            let total: usize = chunks.iter().map(|c| c.word_count).sum();
            prop_assert_eq!(total, words.len());
        }
    }
}

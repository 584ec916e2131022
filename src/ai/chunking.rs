//! Transcript chunking for prompts with a bounded context window.

pub const DEFAULT_CHUNK_SIZE: usize = 8000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Preferred break points, strongest first.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Split `text` into windows of at most `chunk_size` characters.
///
/// Text that fits is returned as a single chunk. Otherwise each window ends at the
/// last paragraph break, line break or space inside it (hard cut if there is
/// none), and the next window starts `overlap` characters before that end.
pub fn split_into_chunks(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chunk_size == 0 || chars.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let overlap = overlap.min(chunk_size / 2);
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let hard_end = (start + chunk_size).min(chars.len());
        let end = if hard_end == chars.len() {
            hard_end
        } else {
            break_point(&chars, start + overlap + 1, hard_end).unwrap_or(hard_end)
        };

        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start = end - overlap;
    }

    chunks
}

/// End index just past the strongest separator found in `chars[from..to]`.
fn break_point(chars: &[char], from: usize, to: usize) -> Option<usize> {
    if from >= to {
        return None;
    }
    let window: String = chars[from..to].iter().collect();

    SEPARATORS.iter().find_map(|sep| {
        window
            .rfind(sep)
            .map(|byte_idx| from + window[..byte_idx].chars().count() + sep.chars().count())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble(chunks: &[String], overlap: usize) -> String {
        let mut text = chunks[0].clone();
        for chunk in &chunks[1..] {
            text.extend(chunk.chars().skip(overlap));
        }
        text
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_into_chunks("hello", 10, 2), vec!["hello".to_string()]);
        assert_eq!(split_into_chunks("", 10, 2), vec![String::new()]);
    }

    #[test]
    fn text_at_the_limit_is_one_chunk() {
        let text = "a".repeat(DEFAULT_CHUNK_SIZE);
        let chunks = split_into_chunks(&text, DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn chunks_stay_within_the_limit_and_overlap() {
        let text = "Customer: the export button does nothing.\nAgent: which browser?\n".repeat(40);
        let chunks = split_into_chunks(&text, 300, 40);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 300);
        }
        for pair in chunks.windows(2) {
            let tail: String = {
                let chars: Vec<char> = pair[0].chars().collect();
                chars[chars.len() - 40..].iter().collect()
            };
            assert!(pair[1].starts_with(&tail));
        }
        assert_eq!(reassemble(&chunks, 40), text);
    }

    #[test]
    fn prefers_line_breaks() {
        let text = format!("{}\n{}", "a".repeat(60), "b".repeat(60));
        let chunks = split_into_chunks(&text, 100, 0);

        assert_eq!(chunks[0], format!("{}\n", "a".repeat(60)));
        assert_eq!(chunks[1], "b".repeat(60));
    }

    #[test]
    fn hard_cuts_text_without_separators() {
        let text = "x".repeat(250);
        let chunks = split_into_chunks(&text, 100, 10);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(reassemble(&chunks, 10), text);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "é".repeat(150);
        let chunks = split_into_chunks(&text, 100, 0);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 100);
        assert_eq!(chunks[1].chars().count(), 50);
    }
}

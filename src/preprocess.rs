/// Text preprocessing shared by the sentiment components
///
/// Two leaf utilities: `clean_text` normalizes raw input, `chunk_text` splits
/// long text on word boundaries so it fits an external classifier's
/// input-length limit. Both are total functions.

/// Trims, lowercases, and collapses internal whitespace.
///
/// Empty or whitespace-only input yields an empty string; this never fails.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Splits text into word-boundary chunks of at most `max_length` characters.
///
/// Words are never split; a single word longer than `max_length` becomes its
/// own (overlong) chunk. Joining the chunks with single spaces reconstructs
/// the original token sequence.
pub fn chunk_text(text: &str, max_length: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            if word.len() > max_length {
                chunks.push(word.to_string());
            } else {
                current.push_str(word);
            }
        } else if current.len() + 1 + word.len() > max_length {
            chunks.push(std::mem::take(&mut current));
            if word.len() > max_length {
                chunks.push(word.to_string());
            } else {
                current.push_str(word);
            }
        } else {
            current.push(' ');
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

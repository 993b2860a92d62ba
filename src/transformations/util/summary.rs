//! Plain-text summaries of markdown bodies.

const SUMMARY_MAX_CHARS: usize = 300;

/// Strip markdown markers, collapse whitespace and cut at a word boundary.
pub fn summarize(body: &str) -> String {
    let plain: Vec<&str> = body
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| matches!(c, '#' | '*' | '_' | '`' | '>' | '~')))
        .filter(|word| !word.is_empty())
        .collect();
    let text = plain.join(" ");

    if text.chars().count() <= SUMMARY_MAX_CHARS {
        return text;
    }

    let mut cut = String::new();
    for word in text.split(' ') {
        if cut.chars().count() + word.chars().count() + 1 > SUMMARY_MAX_CHARS {
            break;
        }
        if !cut.is_empty() {
            cut.push(' ');
        }
        cut.push_str(word);
    }
    if cut.is_empty() {
        cut = text.chars().take(SUMMARY_MAX_CHARS).collect();
    }
    cut.push_str("...");
    cut
}

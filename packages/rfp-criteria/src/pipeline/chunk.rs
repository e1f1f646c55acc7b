//! Semantic chunking of document text.
//!
//! Markdown headings are the preferred split points. Sections are packed
//! greedily into chunks up to a character budget; a section that alone
//! exceeds the budget is re-split at paragraph boundaries. Lengths are
//! counted in `char`s.

use tracing::debug;

/// Default chunk budget in characters (~10k tokens).
pub const DEFAULT_CHUNK_SIZE: usize = 40_000;

const SECTION_JOIN: &str = "\n";
const PARAGRAPH_JOIN: &str = "\n\n";

/// Whether a line is a markdown ATX heading (`^#{1,6}\s+.*$`).
pub fn is_heading(line: &str) -> bool {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    (1..=6).contains(&hashes) && line[hashes..].starts_with(char::is_whitespace)
}

/// Split `text` into ordered chunks of at most `budget` characters.
///
/// A chunk exceeds the budget only when it is a single paragraph that is
/// itself larger. Empty or whitespace-only input yields no chunks.
pub fn split_semantic(text: &str, budget: usize) -> Vec<String> {
    let budget = budget.max(1);

    let sections = split_sections(text);
    let packed = pack(sections.iter().map(String::as_str), budget, SECTION_JOIN);

    let mut chunks = Vec::with_capacity(packed.len());
    for chunk in packed {
        if chunk.chars().count() <= budget {
            chunks.push(chunk);
        } else {
            let paragraphs = split_paragraphs(&chunk);
            chunks.extend(pack(paragraphs.iter().map(String::as_str), budget, PARAGRAPH_JOIN));
        }
    }

    debug!(chunks = chunks.len(), budget, "Split content into semantic chunks");
    chunks
}

/// Sections start at heading lines; text before the first heading is its own section.
fn split_sections(text: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if is_heading(line) && !current.is_empty() {
            sections.push(current.join("\n"));
            current.clear();
        }
        current.push(line);
    }
    if !current.is_empty() {
        sections.push(current.join("\n"));
    }

    sections.retain(|s| !s.trim().is_empty());
    sections
}

/// Paragraphs are separated by lines that are blank after trimming.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }
    paragraphs
}

/// Greedily pack pieces in order, emitting trimmed, non-empty chunks.
fn pack<'a>(pieces: impl Iterator<Item = &'a str>, budget: usize, join: &str) -> Vec<String> {
    let join_len = join.chars().count();
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for piece in pieces {
        if piece.trim().is_empty() {
            continue;
        }
        let piece_len = piece.chars().count();

        if current.is_empty() {
            current.push_str(piece);
            current_len = piece_len;
        } else if current_len + join_len + piece_len > budget {
            push_trimmed(&mut chunks, &current);
            current.clear();
            current.push_str(piece);
            current_len = piece_len;
        } else {
            current.push_str(join);
            current.push_str(piece);
            current_len += join_len + piece_len;
        }
    }
    push_trimmed(&mut chunks, &current);
    chunks
}

fn push_trimmed(chunks: &mut Vec<String>, chunk: &str) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

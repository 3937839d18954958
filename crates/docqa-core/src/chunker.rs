//! Splits loaded blocks into bounded-size, locator-tagged chunks.
//!
//! Blocks that carry Markdown headers are first cut into header sections;
//! every section is then packed line by line into chunks of at most
//! `max_chars` characters. A single line longer than `max_chars` becomes its
//! own oversized chunk rather than being cut mid-line.

use tracing::debug;

use crate::config::DEFAULT_MAX_CHARS;
use crate::loader::DOCUMENT_LOCATOR;
use crate::types::{Block, Chunk};

const HEADER_MAX_CHARS: usize = 80;

#[derive(Debug, Clone)]
pub struct Chunker {
    max_chars: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self { max_chars: DEFAULT_MAX_CHARS }
    }
}

impl Chunker {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars: max_chars.max(1) }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Chunk ids are `chunk_{n}` with one counter for the whole call.
    pub fn chunk(&self, blocks: &[Block]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for block in blocks {
            let sections = if has_markdown_headers(&block.text) {
                split_markdown_headers(&block.text)
            } else {
                vec![(DOCUMENT_LOCATOR.to_string(), block.text.clone())]
            };
            for (sub_locator, text) in sections {
                let locator = if sub_locator == DOCUMENT_LOCATOR {
                    block.locator.clone()
                } else {
                    format!("{} | {}", block.locator, sub_locator)
                };
                for piece in pack_lines(&text, self.max_chars) {
                    chunks.push(Chunk { chunk_id: format!("chunk_{}", chunks.len()), text: piece, locator: locator.clone() });
                }
            }
        }
        debug!(blocks = blocks.len(), chunks = chunks.len(), max_chars = self.max_chars, "chunked blocks");
        chunks
    }
}

pub fn chunk_document(blocks: &[Block], max_chars: usize) -> Vec<Chunk> {
    Chunker::new(max_chars).chunk(blocks)
}

/// Chunk one blob of text into `(chunk_id, text)` pairs.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<(String, String)> {
    chunk_document(&[Block::new(DOCUMENT_LOCATOR, text)], max_chars)
        .into_iter()
        .map(|c| (c.chunk_id, c.text))
        .collect()
}

fn has_markdown_headers(text: &str) -> bool {
    text.contains("##") || text.contains("\n# ")
}

/// `#`..`######` followed by whitespace and some content.
fn header_line(line: &str) -> Option<&str> {
    let hashes = line.len() - line.trim_start_matches('#').len();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with([' ', '\t']) || rest.trim().is_empty() {
        return None;
    }
    Some(line)
}

fn split_markdown_headers(text: &str) -> Vec<(String, String)> {
    let mut sections = Vec::new();
    let mut header = DOCUMENT_LOCATOR.to_string();
    let mut body: Vec<&str> = Vec::new();

    let mut flush = |header: &str, body: &mut Vec<&str>| {
        let joined = body.join("\n");
        let joined = joined.trim();
        if !joined.is_empty() {
            sections.push((header.to_string(), joined.to_string()));
        }
        body.clear();
    };

    for line in text.lines() {
        if let Some(h) = header_line(line) {
            flush(&header, &mut body);
            let title: String = h.replace('#', "").trim().chars().take(HEADER_MAX_CHARS).collect();
            header = if title.is_empty() { DOCUMENT_LOCATOR.to_string() } else { title };
        } else {
            body.push(line);
        }
    }
    flush(&header, &mut body);

    if sections.is_empty() {
        sections.push((DOCUMENT_LOCATOR.to_string(), text.to_string()));
    }
    sections
}

/// Greedy line packing. Each line costs its length plus one for the newline.
fn pack_lines(text: &str, max_chars: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    let emit = |lines: &[&str], out: &mut Vec<String>| {
        let joined = lines.join("\n");
        let trimmed = joined.trim();
        if !trimmed.is_empty() {
            out.push(trimmed.to_string());
        }
    };

    for line in text.split('\n') {
        let cost = line.chars().count() + 1;
        if current_len + cost > max_chars && !current.is_empty() {
            emit(&current, &mut out);
            current.clear();
            current_len = 0;
        }
        current.push(line);
        current_len += cost;
    }
    if !current.is_empty() {
        emit(&current, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn non_ws(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn short_text_is_single_chunk() {
        let chunks = chunk_text("hello\nworld", 800);
        assert_eq!(chunks, vec![("chunk_0".to_string(), "hello\nworld".to_string())]);
    }

    #[test]
    fn chunks_respect_max_chars_and_lose_nothing() {
        let text: String = (0..200).map(|i| format!("line number {i} with some filler text\n")).collect();
        let chunks = chunk_document(&[Block::new("document", text.clone())], 120);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.text.chars().count() <= 120, "chunk too long: {}", c.text.len());
        }
        let rebuilt: String = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n");
        assert_eq!(non_ws(&rebuilt), non_ws(&text));
    }

    #[test]
    fn oversized_line_is_kept_whole() {
        let long = "x".repeat(50);
        let text = format!("short\n{long}\nafter");
        let chunks = chunk_text(&text, 20);
        let texts: Vec<&str> = chunks.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(texts, vec!["short", long.as_str(), "after"]);
    }

    #[test]
    fn ids_are_global_across_blocks() {
        let blocks = vec![Block::new("page_1", "a\nb"), Block::new("page_2", "c"), Block::new("page_3", "d")];
        let chunks = chunk_document(&blocks, 800);
        let ids: Vec<&str> = chunks.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["chunk_0", "chunk_1", "chunk_2"]);
        assert_eq!(chunks[2].locator, "page_3");
    }

    #[test]
    fn markdown_headers_become_sub_locators() {
        let text = "intro line\n## Install\nrun make\n## Usage\n### Flags\n--verbose";
        let chunks = chunk_document(&[Block::new("document", text)], 800);
        let got: Vec<(&str, &str)> = chunks.iter().map(|c| (c.locator.as_str(), c.text.as_str())).collect();
        assert_eq!(
            got,
            vec![
                ("document", "intro line"),
                ("document | Install", "run make"),
                ("document | Flags", "--verbose"),
            ]
        );
    }

    #[test]
    fn block_locator_is_prefixed_to_header() {
        let chunks = chunk_document(&[Block::new("page_2", "## Results\nall good")], 800);
        assert_eq!(chunks[0].locator, "page_2 | Results");
    }

    #[test]
    fn hashes_without_space_are_not_headers() {
        assert!(header_line("##nospace").is_none());
        assert!(header_line("####### seven").is_none());
        assert!(header_line("#  ").is_none());
        assert!(header_line("### ok").is_some());
    }

    #[test]
    fn blank_text_yields_no_chunks() {
        assert!(chunk_text("\n\n   \n", 800).is_empty());
        assert!(chunk_document(&[], 800).is_empty());
    }
}

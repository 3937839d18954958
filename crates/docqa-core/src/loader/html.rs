use crate::types::Block;

/// Cap applied when a page has no usable heading sections.
pub const HTML_FALLBACK_MAX_CHARS: usize = 50_000;

const SECTION_TITLE_MAX_CHARS: usize = 80;
const FALLBACK_LOCATOR: &str = "Document";

/// Segment an HTML page into one block per heading section.
///
/// `script` and `style` contents are dropped. Text of paragraph, list and
/// div elements accumulates into the current section until the next `h1`-`h6`.
/// Pages without headings become a single `Document` block capped at
/// [`HTML_FALLBACK_MAX_CHARS`]. Returns `None` when no visible text remains.
pub fn parse_html(raw: &str) -> Option<Vec<Block>> {
    let mut seg = Segmenter::default();
    let lower = raw.to_ascii_lowercase();
    let mut pos = 0;

    while pos < raw.len() {
        let Some(rel) = raw[pos..].find('<') else {
            seg.text(&raw[pos..]);
            break;
        };
        let lt = pos + rel;
        if lt > pos {
            seg.text(&raw[pos..lt]);
        }

        if lower[lt..].starts_with("<!--") {
            pos = lower[lt..].find("-->").map_or(raw.len(), |i| lt + i + 3);
            continue;
        }
        if !raw[lt + 1..].starts_with(|c: char| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?')) {
            // `a < b` in running text
            seg.text("<");
            pos = lt + 1;
            continue;
        }
        let Some(gt) = tag_end(raw, lt) else {
            // Unterminated tag; keep it as text.
            seg.text(&raw[lt..]);
            break;
        };
        let inner = &lower[lt + 1..gt];
        pos = gt + 1;

        let closing = inner.starts_with('/');
        let name: String = inner
            .trim_start_matches('/')
            .chars()
            .take_while(char::is_ascii_alphanumeric)
            .collect();
        if name.is_empty() {
            // `<!doctype>` and `<?xml ?>`
            continue;
        }

        if !closing && (name == "script" || name == "style") && !inner.ends_with('/') {
            let close = format!("</{name}");
            pos = match lower[pos..].find(&close) {
                Some(i) => lower[pos + i..].find('>').map_or(raw.len(), |j| pos + i + j + 1),
                None => raw.len(),
            };
            continue;
        }

        seg.tag(&name, closing);
    }

    seg.finish()
}

#[derive(Default)]
struct Segmenter {
    blocks: Vec<Block>,
    locator: Option<String>,
    parts: Vec<String>,
    part: String,
    heading: Option<String>,
    visible: String,
}

impl Segmenter {
    fn text(&mut self, raw: &str) {
        let decoded = decode_entities(raw);
        if decoded.trim().is_empty() {
            return;
        }
        self.visible.push(' ');
        self.visible.push_str(&decoded);
        let target = self.heading.as_mut().unwrap_or(&mut self.part);
        target.push(' ');
        target.push_str(&decoded);
    }

    fn tag(&mut self, name: &str, closing: bool) {
        if is_heading(name) {
            self.end_part();
            if closing {
                if let Some(title) = self.heading.take().map(|t| collapse_ws(&t)) {
                    if !title.is_empty() {
                        self.flush();
                        let title: String = title.chars().take(SECTION_TITLE_MAX_CHARS).collect();
                        self.locator = Some(format!("Section: {title}"));
                    }
                }
            } else {
                self.heading = Some(String::new());
            }
        } else if matches!(name, "p" | "li" | "div" | "br" | "tr" | "td" | "th" | "ul" | "ol" | "table" | "section" | "article" | "body") {
            self.end_part();
        }
    }

    fn end_part(&mut self) {
        let part = collapse_ws(&self.part);
        if !part.is_empty() {
            self.parts.push(part);
        }
        self.part.clear();
    }

    fn flush(&mut self) {
        if self.parts.is_empty() {
            return;
        }
        let text = self.parts.join("\n");
        self.parts.clear();
        let locator = self.locator.clone().unwrap_or_else(|| FALLBACK_LOCATOR.to_string());
        self.blocks.push(Block::new(locator, text));
    }

    fn finish(mut self) -> Option<Vec<Block>> {
        if let Some(title) = self.heading.take() {
            // Unclosed heading: treat its text as body.
            self.part.push_str(&title);
        }
        self.end_part();
        if self.locator.is_some() {
            self.flush();
        }
        if self.locator.is_some() && !self.blocks.is_empty() {
            return Some(self.blocks);
        }

        let visible = collapse_ws(&self.visible);
        if visible.is_empty() {
            return None;
        }
        let capped: String = visible.chars().take(HTML_FALLBACK_MAX_CHARS).collect();
        Some(vec![Block::new(FALLBACK_LOCATOR, capped)])
    }
}

fn is_heading(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte offset of the `>` closing the tag opened at `lt`. A `>` inside a
/// quoted attribute value does not count.
fn tag_end(raw: &str, lt: usize) -> Option<usize> {
    let bytes = raw.as_bytes();
    let mut quote: Option<u8> = None;
    let mut last_significant = b'<';
    for (i, &b) in bytes.iter().enumerate().skip(lt + 1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'>' => return Some(i),
            None if (b == b'"' || b == b'\'') && last_significant == b'=' => quote = Some(b),
            None => {}
        }
        if !b.is_ascii_whitespace() {
            last_significant = b;
        }
    }
    None
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .bytes()
            .take(ENTITY_MAX_LEN)
            .position(|b| b == b';')
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi + 1)));
        match decoded {
            Some((c, consumed)) => {
                out.push_str(&c);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

const ENTITY_MAX_LEN: usize = 12;

/// `name` is the text between `&` and `;`.
fn decode_entity(name: &str) -> Option<String> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    let decoded = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" | "ensp" | "emsp" | "thinsp" => " ",
        "shy" | "zwj" | "zwnj" => "",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "sbquo" => "\u{201a}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "bdquo" => "\u{201e}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "bull" => "\u{2022}",
        "middot" => "\u{b7}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        "deg" => "\u{b0}",
        "plusmn" => "\u{b1}",
        "times" => "\u{d7}",
        "divide" => "\u{f7}",
        "frac12" => "\u{bd}",
        "frac14" => "\u{bc}",
        "frac34" => "\u{be}",
        "micro" => "\u{b5}",
        "para" => "\u{b6}",
        "sect" => "\u{a7}",
        "cent" => "\u{a2}",
        "pound" => "\u{a3}",
        "euro" => "\u{20ac}",
        "yen" => "\u{a5}",
        "larr" => "\u{2190}",
        "rarr" => "\u{2192}",
        "eacute" => "\u{e9}",
        "egrave" => "\u{e8}",
        "aacute" => "\u{e1}",
        "agrave" => "\u{e0}",
        "ouml" => "\u{f6}",
        "uuml" => "\u{fc}",
        "auml" => "\u{e4}",
        "ccedil" => "\u{e7}",
        "ntilde" => "\u{f1}",
        "szlig" => "\u{df}",
        _ => return None,
    };
    Some(decoded.to_string())
}

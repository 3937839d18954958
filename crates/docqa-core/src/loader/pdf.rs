use std::io;
use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::Block;

const PDFTOTEXT: &str = "pdftotext";
const PDFINFO: &str = "pdfinfo";
const INSTALL_HINT: &str = "install poppler-utils so that `pdftotext` and `pdfinfo` are on PATH";

/// Text extraction backend. `ErrorKind::NotFound` means the tool is missing.
pub(crate) trait PdfExtractor {
    /// Text of the whole file (pages separated by form feeds) or of one
    /// 1-indexed page.
    fn text(&self, path: &Path, page: Option<usize>) -> io::Result<String>;
    /// `pdfinfo`-style `Key: value` report.
    fn info(&self, path: &Path) -> io::Result<String>;
}

/// poppler-utils command line tools.
pub(crate) struct Poppler;

impl PdfExtractor for Poppler {
    fn text(&self, path: &Path, page: Option<usize>) -> io::Result<String> {
        let mut cmd = Command::new(PDFTOTEXT);
        cmd.arg("-layout").arg("-enc").arg("UTF-8");
        if let Some(page) = page {
            let page = page.to_string();
            cmd.arg("-f").arg(&page).arg("-l").arg(&page);
        }
        run(cmd.arg(path).arg("-"), PDFTOTEXT)
    }

    fn info(&self, path: &Path) -> io::Result<String> {
        run(Command::new(PDFINFO).arg(path), PDFINFO)
    }
}

fn run(cmd: &mut Command, tool: &str) -> io::Result<String> {
    let output = cmd.output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(io::Error::new(io::ErrorKind::Other, format!("{tool} failed: {}", stderr.trim())));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub(super) fn parse_pdf(path: &Path) -> Result<Vec<Block>> {
    extract_blocks(&Poppler, path)
}

/// One block per page with text, located as `page_{n}` (1-indexed).
///
/// The whole file is extracted in one run. If that run fails, pages are
/// extracted one at a time and the ones that fail are skipped.
pub(crate) fn extract_blocks(extractor: &dyn PdfExtractor, path: &Path) -> Result<Vec<Block>> {
    let pages = match extractor.text(path, None) {
        Ok(text) => text.split('\u{c}').map(|page| Some(page.to_string())).collect(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(unsupported()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "whole-file PDF extraction failed; retrying page by page");
            extract_page_by_page(extractor, path)?
        }
    };
    let blocks = pages_to_blocks(pages);
    if blocks.is_empty() {
        return Err(Error::NoExtractableText { path: path.to_path_buf() });
    }
    Ok(blocks)
}

fn pages_to_blocks(pages: Vec<Option<String>>) -> Vec<Block> {
    pages
        .into_iter()
        .enumerate()
        .filter_map(|(i, page)| {
            let text = page?;
            let text = text.trim();
            (!text.is_empty()).then(|| Block::new(format!("page_{}", i + 1), text))
        })
        .collect()
}

fn extract_page_by_page(extractor: &dyn PdfExtractor, path: &Path) -> Result<Vec<Option<String>>> {
    let count = page_count(extractor, path)?;
    let mut pages = Vec::with_capacity(count);
    for page in 1..=count {
        match extractor.text(path, Some(page)) {
            Ok(text) => pages.push(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(unsupported()),
            Err(e) => {
                warn!(path = %path.display(), page, error = %e, "skipping PDF page");
                pages.push(None);
            }
        }
    }
    debug!(path = %path.display(), pages = count, "extracted PDF page by page");
    Ok(pages)
}

fn page_count(extractor: &dyn PdfExtractor, path: &Path) -> Result<usize> {
    let info = match extractor.info(path) {
        Ok(info) => info,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(unsupported()),
        // Unreadable document structure: nothing can be extracted.
        Err(e) if e.kind() == io::ErrorKind::Other => {
            return Err(Error::NoExtractableText { path: path.to_path_buf() })
        }
        Err(e) => return Err(Error::io(path, e)),
    };
    parse_page_count(&info).ok_or_else(|| Error::NoExtractableText { path: path.to_path_buf() })
}

fn parse_page_count(info: &str) -> Option<usize> {
    info.lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse().ok())
}

fn unsupported() -> Error {
    Error::UnsupportedFormat { format: "PDF", hint: INSTALL_HINT.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Canned poppler output. `None` in `whole` or `info` simulates a failed
    /// run; `missing` simulates tools absent from PATH.
    struct Scripted {
        whole: Option<&'static str>,
        pages: Vec<Option<&'static str>>,
        info: Option<&'static str>,
        missing: bool,
    }

    impl Scripted {
        fn whole(text: &'static str) -> Self {
            Self { whole: Some(text), pages: Vec::new(), info: None, missing: false }
        }
    }

    fn failed(what: &str) -> io::Error {
        io::Error::new(io::ErrorKind::Other, format!("{what} failed"))
    }

    impl PdfExtractor for Scripted {
        fn text(&self, _path: &Path, page: Option<usize>) -> io::Result<String> {
            if self.missing {
                return Err(io::ErrorKind::NotFound.into());
            }
            let out = match page {
                None => self.whole,
                Some(n) => self.pages.get(n - 1).copied().flatten(),
            };
            out.map(str::to_string).ok_or_else(|| failed("pdftotext"))
        }

        fn info(&self, _path: &Path) -> io::Result<String> {
            if self.missing {
                return Err(io::ErrorKind::NotFound.into());
            }
            self.info.map(str::to_string).ok_or_else(|| failed("pdfinfo"))
        }
    }

    fn locators(blocks: &[Block]) -> Vec<&str> {
        blocks.iter().map(|b| b.locator.as_str()).collect()
    }

    #[test]
    fn whole_file_run_is_split_on_form_feeds() {
        let blocks = extract_blocks(&Scripted::whole("first\u{c}  \u{c}third page\n\u{c}"), Path::new("a.pdf")).unwrap();
        assert_eq!(blocks, vec![Block::new("page_1", "first"), Block::new("page_3", "third page")]);
    }

    #[test]
    fn all_pages_empty_is_no_extractable_text() {
        let err = extract_blocks(&Scripted::whole("\n\u{c}   \u{c}"), Path::new("scan.pdf")).unwrap_err();
        assert!(matches!(err, Error::NoExtractableText { .. }));
    }

    #[test]
    fn missing_tools_are_unsupported_with_install_hint() {
        let tools = Scripted { whole: None, pages: Vec::new(), info: None, missing: true };
        match extract_blocks(&tools, Path::new("a.pdf")).unwrap_err() {
            Error::UnsupportedFormat { format, hint } => {
                assert_eq!(format, "PDF");
                assert!(hint.contains("pdftotext"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn failed_whole_run_falls_back_to_pages_and_skips_bad_ones() {
        let tools = Scripted {
            whole: None,
            pages: vec![Some("page one"), None, Some("page three")],
            info: Some("Title: x\nPages:          3\n"),
            missing: false,
        };
        let blocks = extract_blocks(&tools, Path::new("a.pdf")).unwrap();
        assert_eq!(locators(&blocks), vec!["page_1", "page_3"]);
        assert_eq!(blocks[1].text, "page three");
    }

    #[test]
    fn fallback_with_unreadable_info_is_no_extractable_text() {
        let tools = Scripted { whole: None, pages: Vec::new(), info: None, missing: false };
        assert!(matches!(extract_blocks(&tools, Path::new("a.pdf")), Err(Error::NoExtractableText { .. })));

        let every_page_fails = Scripted { whole: None, pages: vec![None, None], info: Some("Pages: 2\n"), missing: false };
        assert!(matches!(extract_blocks(&every_page_fails, Path::new("a.pdf")), Err(Error::NoExtractableText { .. })));
    }

    #[test]
    fn blank_and_failed_pages_are_skipped_but_numbering_is_kept() {
        let pages = vec![
            Some("  first page  ".to_string()),
            Some("\n\n".to_string()),
            None,
            Some("fourth".to_string()),
            Some(String::new()),
        ];
        let blocks = pages_to_blocks(pages);
        assert_eq!(blocks, vec![Block::new("page_1", "first page"), Block::new("page_4", "fourth")]);
    }

    #[test]
    fn page_count_is_read_from_pdfinfo_output() {
        let info = "Producer:       LibreOffice\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_page_count(info), Some(12));
        assert_eq!(parse_page_count("Title: x\n"), None);
    }

    /// Single page, Helvetica, with a correct xref table.
    fn tiny_pdf(text: &str) -> Vec<u8> {
        let content = format!("BT /F1 18 Tf 20 100 Td ({text}) Tj ET");
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 300 144] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>"
                .to_string(),
            format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];
        let mut pdf = String::from("%PDF-1.4\n");
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.push_str(&format!("{} 0 obj\n{body}\nendobj\n", i + 1));
        }
        let xref = pdf.len();
        pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
        for off in offsets {
            pdf.push_str(&format!("{off:010} 00000 n \n"));
        }
        pdf.push_str(&format!("trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n", objects.len() + 1));
        pdf.into_bytes()
    }

    #[test]
    fn real_pdf_round_trip_when_poppler_is_installed() {
        if Command::new(PDFTOTEXT).arg("-v").output().is_err() {
            eprintln!("pdftotext not on PATH; skipping");
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tiny.pdf");
        fs::write(&path, tiny_pdf("Hello pdf world")).unwrap();

        let blocks = parse_pdf(&path).unwrap();
        assert_eq!(locators(&blocks), vec!["page_1"]);
        assert!(blocks[0].text.contains("Hello pdf world"), "got {:?}", blocks[0].text);
    }
}

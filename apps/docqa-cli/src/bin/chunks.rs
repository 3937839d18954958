use std::env;
use std::path::PathBuf;

use docqa_core::chunker::Chunker;
use docqa_core::config::{expand_path, Config};
use docqa_core::loader::DocumentLoader;

fn main() -> anyhow::Result<()> {
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <file> [--max-chars N]", args[0]);
        eprintln!("Example: {} notes/manual.pdf --max-chars 400", args[0]);
        std::process::exit(1);
    }

    let mut file: Option<PathBuf> = None;
    let mut max_chars = settings.chunking.max_chars;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--max-chars" => {
                match args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) {
                    Some(n) if n > 0 => max_chars = n,
                    _ => {
                        eprintln!("Error: --max-chars requires a positive number");
                        std::process::exit(1);
                    }
                }
                i += 1;
            }
            a if !a.starts_with('-') => file = Some(expand_path(a)),
            _ => {}
        }
        i += 1;
    }
    let Some(file) = file else {
        eprintln!("Usage: {} <file> [--max-chars N]", args[0]);
        std::process::exit(1);
    };

    let blocks = DocumentLoader::new(settings.index.max_file_bytes).load(&file)?;
    let chunks = Chunker::new(max_chars).chunk(&blocks);
    println!("{}: {} blocks, {} chunks (max_chars={})", file.display(), blocks.len(), chunks.len(), max_chars);
    for chunk in &chunks {
        println!("\n[{}] {} ({} chars)", chunk.chunk_id, chunk.locator, chunk.text.chars().count());
        println!("{}", chunk.text);
    }
    Ok(())
}

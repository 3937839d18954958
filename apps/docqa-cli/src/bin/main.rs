use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use docqa_core::config::{resolve_with_base, Config, Settings};
use docqa_core::types::{Answer, IndexStats};
use docqa_hybrid::{AnswerAssembler, HybridSearchEngine, OpenAiChat, RetrievalRequest};
use docqa_vector::{get_embedder, MemoryVectorStore};

const DEFAULT_SANITY_OUT: &str = "artifacts/sanity_output.json";

const USAGE: &str = "Usage:
  docqa index <path>... [--source TAG]
  docqa ask <question> --file <path>... [--top-k N] [--no-hybrid] [--no-rerank] [--source S]
  docqa sanity <file> <question> [--out PATH]";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "index" => run_index(&settings, &args),
        "ask" => run_ask(&settings, &args),
        "sanity" => run_sanity(&settings, &args),
        "-h" | "--help" | "help" => {
            println!("{USAGE}");
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}\n{USAGE}", cmd);
            std::process::exit(1);
        }
    }
}

fn build_engine(settings: &Settings) -> anyhow::Result<HybridSearchEngine<MemoryVectorStore>> {
    let embedder = get_embedder(&settings.embedding)?;
    let store = MemoryVectorStore::new(settings.index.collection.clone(), embedder);
    Ok(HybridSearchEngine::new(store, settings))
}

fn value_after(args: &[String], i: usize, flag: &str) -> String {
    match args.get(i + 1) {
        Some(v) => v.clone(),
        None => {
            eprintln!("Error: {flag} requires a value");
            std::process::exit(1);
        }
    }
}

/// Files are taken as given; directories are walked recursively in name order.
fn collect_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(Result::ok) {
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(input.clone());
        }
    }
    files
}

fn index_files(
    engine: &mut HybridSearchEngine<MemoryVectorStore>,
    files: &[PathBuf],
    source: Option<&str>,
) -> anyhow::Result<Vec<IndexStats>> {
    if source.is_some() && files.len() > 1 {
        warn!(files = files.len(), "one --source tag for several files: each file replaces the previous one");
    }
    let pb = if files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut all = Vec::with_capacity(files.len());
    for file in files {
        if let Some(pb) = &pb {
            pb.set_message(file.display().to_string());
        }
        let stats = engine.index(file, source).with_context(|| format!("indexing {}", file.display()))?;
        all.push(stats);
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }
    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }
    Ok(all)
}

fn run_index(settings: &Settings, args: &[String]) -> anyhow::Result<()> {
    let cwd = env::current_dir()?;
    let mut inputs = Vec::new();
    let mut source = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--source" => {
                source = Some(value_after(args, i, "--source"));
                i += 1;
            }
            a if !a.starts_with('-') => inputs.push(resolve_with_base(&cwd, a)),
            other => bail!("unknown option {other}"),
        }
        i += 1;
    }
    if inputs.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }

    let mut engine = build_engine(settings)?;
    let files = collect_files(&inputs);
    for stats in index_files(&mut engine, &files, source.as_deref())? {
        println!("{}", serde_json::to_string(&stats)?);
    }
    info!(sources = engine.sources().len(), chunks = engine.lexical().len(), "index complete");
    Ok(())
}

fn run_ask(settings: &Settings, args: &[String]) -> anyhow::Result<()> {
    let cwd = env::current_dir()?;
    let mut question = None;
    let mut files = Vec::new();
    let mut req = RetrievalRequest::from_config("", &settings.retrieval);
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--file" => {
                files.push(resolve_with_base(&cwd, value_after(args, i, "--file")));
                i += 1;
            }
            "--top-k" => {
                let raw = value_after(args, i, "--top-k");
                req.top_k = raw.parse().with_context(|| format!("--top-k expects a number, got {raw}"))?;
                i += 1;
            }
            "--source" => {
                req.source_filter = Some(value_after(args, i, "--source"));
                i += 1;
            }
            "--no-hybrid" => req.use_hybrid = false,
            "--no-rerank" => req.rerank = false,
            a if !a.starts_with('-') && question.is_none() => question = Some(a.to_string()),
            other => bail!("unexpected argument {other}"),
        }
        i += 1;
    }
    let Some(question) = question else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };
    if files.is_empty() {
        bail!("ask needs at least one --file to answer from");
    }
    req.query = question;

    let mut engine = build_engine(settings)?;
    index_files(&mut engine, &collect_files(&files), None)?;
    let assembler = AnswerAssembler::new(OpenAiChat::from_env(&settings.llm)?);
    let answer = assembler.answer(&engine, &req)?;
    println!("{}", serde_json::to_string_pretty(&answer)?);
    Ok(())
}

fn run_sanity(settings: &Settings, args: &[String]) -> anyhow::Result<()> {
    let cwd = env::current_dir()?;
    let mut positional = Vec::new();
    let mut out = resolve_with_base(&cwd, DEFAULT_SANITY_OUT);
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--out" => {
                out = resolve_with_base(&cwd, value_after(args, i, "--out"));
                i += 1;
            }
            a => positional.push(a.to_string()),
        }
        i += 1;
    }
    let [file, question] = positional.as_slice() else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };

    let mut engine = build_engine(settings)?;
    let stats = engine.index(&resolve_with_base(&cwd, file), None)?;
    info!(source = %stats.source, chunks = stats.chunks_created, "indexed sanity document");

    let assembler = AnswerAssembler::new(OpenAiChat::from_env(&settings.llm)?);
    let answer = assembler.answer(&engine, &RetrievalRequest::from_config(question.as_str(), &settings.retrieval))?;
    check_citations(&answer)?;
    write_report(&out, question, &answer)?;
    println!("Sanity check passed; wrote {}", out.display());
    Ok(())
}

fn check_citations(answer: &Answer) -> anyhow::Result<()> {
    let usable = answer
        .citations
        .iter()
        .filter(|c| !c.source.is_empty() && !c.locator.is_empty() && !c.snippet.is_empty())
        .count();
    if usable == 0 {
        bail!("sanity check failed: answer came back without a usable citation");
    }
    Ok(())
}

fn write_report(out: &Path, question: &str, answer: &Answer) -> anyhow::Result<()> {
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let report = json!({
        "qa": [{
            "question": question,
            "answer": answer.answer,
            "citations": answer.citations,
        }]
    });
    fs::write(out, serde_json::to_string_pretty(&report)?).with_context(|| format!("writing {}", out.display()))?;
    Ok(())
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;
use wikirank_core::persist::{save_meta, save_ranks, save_relevance, save_titles, IndexPaths, MetaFile, FORMAT_VERSION};
use wikirank_core::rank::{DEFAULT_MAX_ITERATIONS, DEFAULT_THRESHOLD};
use wikirank_core::{compute_page_rank, compute_relevance, Corpus, DocId, DocRecord, IdfMode, RankConfig};

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: Option<DocId>,
    title: Option<String>,
    #[serde(alias = "text")]
    body: Option<String>,
}

impl From<InputDoc> for DocRecord {
    fn from(doc: InputDoc) -> Self {
        DocRecord {
            id: doc.id,
            title: doc.title.map(|t| t.trim().to_string()),
            body: doc.body.map(|b| b.trim().to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a TF-IDF and PageRank index over a wiki corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input XML/JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Use smoothed IDF = ln(1 + N/df) instead of ln(N/df)
        #[arg(long, default_value_t = false)]
        smoothed_idf: bool,
        /// Upper bound on PageRank sweeps
        #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
        max_iterations: usize,
        /// PageRank convergence distance
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, smoothed_idf, max_iterations, threshold } => {
            let idf_mode = if smoothed_idf { IdfMode::Smoothed } else { IdfMode::Plain };
            let config = RankConfig::new().threshold(threshold).max_iterations(max_iterations);
            build_index(Path::new(&input), &IndexPaths::new(&output), idf_mode, &config)
        }
    }
}

fn build_index(input: &Path, out_paths: &IndexPaths, idf_mode: IdfMode, config: &RankConfig) -> Result<()> {
    let records = load_records(input)?;
    tracing::info!(num_records = records.len(), "loaded records");

    let corpus = Corpus::from_records(&records)?;
    let relevance = compute_relevance(&corpus, idf_mode);
    let outcome = compute_page_rank(&corpus, config)?;

    save_titles(out_paths, &corpus.titles())?;
    save_ranks(out_paths, &outcome.ranks.to_map())?;
    save_relevance(out_paths, &relevance)?;
    let meta = MetaFile {
        num_docs: corpus.len() as u32,
        num_terms: corpus.num_terms() as u32,
        iterations: outcome.iterations as u32,
        converged: outcome.converged,
        idf_mode,
        created_at: time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "".into()),
        version: FORMAT_VERSION,
    };
    save_meta(out_paths, &meta)?;

    tracing::info!(output = %out_paths.root.display(), "index build complete");
    Ok(())
}

/// Collect records from a file, or from every .json/.jsonl/.xml file under a directory in path order.
fn load_records(input: &Path) -> Result<Vec<DocRecord>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl" | "xml") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        anyhow::bail!("input path {} does not exist", input.display());
    }

    let mut records = Vec::new();
    for file in files {
        match file.extension().and_then(|s| s.to_str()) {
            Some("jsonl") => read_jsonl(&file, &mut records)?,
            Some("xml") => read_xml(&file, &mut records)?,
            _ => read_json(&file, &mut records)?,
        }
    }
    Ok(records)
}

fn read_jsonl(file: &Path, records: &mut Vec<DocRecord>) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line)?;
        records.push(doc.into());
    }
    Ok(())
}

fn read_json(file: &Path, records: &mut Vec<DocRecord>) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                let doc: InputDoc = serde_json::from_value(v)?;
                records.push(doc.into());
            }
        }
        serde_json::Value::Object(_) => {
            let doc: InputDoc = serde_json::from_value(json)?;
            records.push(doc.into());
        }
        _ => anyhow::bail!("{} holds neither a JSON object nor an array of objects", file.display()),
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum PageField {
    Title,
    Id,
    Text,
}

#[derive(Default)]
struct XmlPage {
    title: Option<String>,
    id: Option<String>,
    text: Option<String>,
}

impl XmlPage {
    fn slot(&mut self, field: PageField) -> &mut Option<String> {
        match field {
            PageField::Title => &mut self.title,
            PageField::Id => &mut self.id,
            PageField::Text => &mut self.text,
        }
    }

    fn into_input(self, file: &Path) -> Result<InputDoc> {
        let id = match self.id {
            Some(raw) => match raw.trim().parse::<DocId>() {
                Ok(id) => Some(id),
                Err(_) => anyhow::bail!("{}: page id {raw:?} is not a number", file.display()),
            },
            None => None,
        };
        Ok(InputDoc { id, title: self.title, body: self.text })
    }
}

fn page_field(name: &[u8]) -> Option<PageField> {
    match name {
        b"title" => Some(PageField::Title),
        b"id" => Some(PageField::Id),
        b"text" => Some(PageField::Text),
        _ => None,
    }
}

/// Read a wiki dump of `<page><title/><id/><text/></page>` elements.
///
/// Only direct children of `<page>` count, so a nested `<revision><id>` is ignored.
/// The first occurrence of a field wins.
fn read_xml(file: &Path, records: &mut Vec<DocRecord>) -> Result<()> {
    let mut reader = Reader::from_reader(BufReader::new(File::open(file)?));
    let mut buf = Vec::new();
    let mut depth = 0usize;
    // (depth of the open <page>, fields collected so far)
    let mut page: Option<(usize, XmlPage)> = None;
    let mut field: Option<PageField> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                depth += 1;
                if let Some((page_depth, current)) = page.as_mut() {
                    if depth == *page_depth + 1 {
                        if let Some(f) = page_field(e.name().as_ref()) {
                            let slot = current.slot(f);
                            if slot.is_none() {
                                *slot = Some(String::new());
                                field = Some(f);
                            }
                        }
                    }
                } else if e.name().as_ref() == b"page" {
                    page = Some((depth, XmlPage::default()));
                }
            }
            Event::Empty(e) => {
                if let Some((page_depth, current)) = page.as_mut() {
                    if depth == *page_depth {
                        if let Some(f) = page_field(e.name().as_ref()) {
                            current.slot(f).get_or_insert_with(String::new);
                        }
                    }
                }
            }
            Event::Text(t) => {
                if let (Some(f), Some((_, current))) = (field, page.as_mut()) {
                    let text = t.unescape()?;
                    current.slot(f).get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::CData(t) => {
                if let (Some(f), Some((_, current))) = (field, page.as_mut()) {
                    let bytes = t.into_inner();
                    current.slot(f).get_or_insert_with(String::new).push_str(&String::from_utf8_lossy(&bytes));
                }
            }
            Event::End(_) => {
                if let Some(page_depth) = page.as_ref().map(|(d, _)| *d) {
                    if depth == page_depth + 1 {
                        field = None;
                    } else if depth == page_depth {
                        if let Some((_, current)) = page.take() {
                            records.push(current.into_input(file)?.into());
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

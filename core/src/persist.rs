use crate::relevance::{IdfMode, RelevanceTable};
use crate::DocId;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub iterations: u32,
    pub converged: bool,
    pub idf_mode: IdfMode,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn titles(&self) -> PathBuf { self.root.join("titles.bin") }
    pub fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    pub fn words(&self) -> PathBuf { self.root.join("words.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn write_bincode<T: Serialize>(paths: &IndexPaths, path: PathBuf, value: &T) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    let bytes = bincode::serialize(value)?;
    f.write_all(&bytes)?;
    Ok(())
}

fn read_bincode<T: DeserializeOwned>(path: PathBuf) -> Result<T> {
    let mut f = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let value = bincode::deserialize(&buf)?;
    Ok(value)
}

pub fn save_titles(paths: &IndexPaths, titles: &BTreeMap<DocId, String>) -> Result<()> {
    write_bincode(paths, paths.titles(), titles)
}

pub fn load_titles(paths: &IndexPaths) -> Result<BTreeMap<DocId, String>> {
    read_bincode(paths.titles())
}

pub fn save_ranks(paths: &IndexPaths, ranks: &BTreeMap<DocId, f64>) -> Result<()> {
    write_bincode(paths, paths.docs(), ranks)
}

pub fn load_ranks(paths: &IndexPaths) -> Result<BTreeMap<DocId, f64>> {
    read_bincode(paths.docs())
}

pub fn save_relevance(paths: &IndexPaths, relevance: &RelevanceTable) -> Result<()> {
    write_bincode(paths, paths.words(), relevance)
}

pub fn load_relevance(paths: &IndexPaths) -> Result<RelevanceTable> {
    read_bincode(paths.words())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

//! Test utilities for classweave-lib.
//!
//! Small transformers with observable behavior, a throwaway context and
//! helpers for building and reading jars.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::context::{ContextConfig, TransformContext};
use crate::execute::WorkerPool;
use crate::transform::{Transformer, TransformerError};

/// Returns a context rooted in a fresh temporary project directory.
pub fn test_context() -> (TempDir, TransformContext) {
  let dir = tempfile::tempdir().unwrap();
  let config = ContextConfig::new("test", dir.path().join("project"));
  let ctx = TransformContext::new(config, WorkerPool::new(2).unwrap());
  (dir, ctx)
}

/// Appends a fixed suffix.
pub struct Append {
  name: String,
  suffix: Vec<u8>,
}

impl Append {
  pub fn new(name: impl Into<String>, suffix: &[u8]) -> Self {
    Self {
      name: name.into(),
      suffix: suffix.to_vec(),
    }
  }
}

impl Transformer for Append {
  fn name(&self) -> &str {
    &self.name
  }

  fn transform(&self, _ctx: &TransformContext, mut bytecode: Vec<u8>) -> Result<Vec<u8>, TransformerError> {
    bytecode.extend_from_slice(&self.suffix);
    Ok(bytecode)
  }
}

/// XORs every byte with a key.
pub struct Xor {
  name: String,
  key: u8,
}

impl Xor {
  pub fn new(name: impl Into<String>, key: u8) -> Self {
    Self { name: name.into(), key }
  }
}

impl Transformer for Xor {
  fn name(&self) -> &str {
    &self.name
  }

  fn transform(&self, _ctx: &TransformContext, bytecode: Vec<u8>) -> Result<Vec<u8>, TransformerError> {
    Ok(bytecode.into_iter().map(|b| b ^ self.key).collect())
  }
}

/// Always fails.
pub struct Fail {
  name: String,
}

impl Fail {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into() }
  }
}

impl Transformer for Fail {
  fn name(&self) -> &str {
    &self.name
  }

  fn transform(&self, _ctx: &TransformContext, _bytecode: Vec<u8>) -> Result<Vec<u8>, TransformerError> {
    Err(TransformerError::msg(&self.name, "refusing to transform"))
  }
}

/// Identity transformer that counts hook calls and records them in a shared journal.
pub struct Counting {
  name: String,
  pub pre: AtomicUsize,
  pub transformed: AtomicUsize,
  pub post: AtomicUsize,
  journal: Option<Arc<Mutex<Vec<String>>>>,
}

impl Counting {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      pre: AtomicUsize::new(0),
      transformed: AtomicUsize::new(0),
      post: AtomicUsize::new(0),
      journal: None,
    }
  }

  pub fn with_journal(mut self, journal: Arc<Mutex<Vec<String>>>) -> Self {
    self.journal = Some(journal);
    self
  }

  fn record(&self, event: &str) {
    if let Some(journal) = &self.journal {
      journal.lock().unwrap().push(format!("{}:{}", self.name, event));
    }
  }
}

impl Transformer for Counting {
  fn name(&self) -> &str {
    &self.name
  }

  fn on_pre_transform(&self, _ctx: &TransformContext) -> Result<(), TransformerError> {
    self.pre.fetch_add(1, Ordering::SeqCst);
    self.record("pre");
    Ok(())
  }

  fn transform(&self, _ctx: &TransformContext, bytecode: Vec<u8>) -> Result<Vec<u8>, TransformerError> {
    self.transformed.fetch_add(1, Ordering::SeqCst);
    self.record("transform");
    Ok(bytecode)
  }

  fn on_post_transform(&self, _ctx: &TransformContext) -> Result<(), TransformerError> {
    self.post.fetch_add(1, Ordering::SeqCst);
    self.record("post");
    Ok(())
  }
}

/// Writes a jar with the given entries, in order.
pub fn write_jar(path: &Path, entries: &[(&str, &str)]) {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  let mut writer = ZipWriter::new(File::create(path).unwrap());
  let options = SimpleFileOptions::default().last_modified_time(zip::DateTime::default());
  for (name, content) in entries {
    writer.start_file(*name, options).unwrap();
    writer.write_all(content.as_bytes()).unwrap();
  }
  writer.finish().unwrap();
}

/// Reads every file entry of a jar, in order.
pub fn read_jar(path: &Path) -> Vec<(String, Vec<u8>)> {
  let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
  let mut entries = Vec::new();
  for index in 0..archive.len() {
    let mut entry = archive.by_index(index).unwrap();
    if entry.is_dir() {
      continue;
    }
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).unwrap();
    entries.push((entry.name().to_string(), bytes));
  }
  entries
}

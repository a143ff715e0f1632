//! Shared helpers for pipeline integration tests.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use classweave_lib::context::{ContextConfig, TransformContext};
use classweave_lib::execute::{TransformSummary, WorkerPool};
use classweave_lib::input::TransformInput;
use classweave_lib::invocation::{InvocationError, TransformInvocation, TransformMode};
use classweave_lib::output::DirectoryOutputProvider;
use classweave_lib::transform::{Transformer, TransformerError, TransformerRegistry};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{DateTime, ZipWriter};

/// Isolated project with a source area and an output root.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn path(&self, relative: &str) -> PathBuf {
    self.temp.path().join(relative)
  }

  pub fn out(&self) -> PathBuf {
    self.path("out")
  }

  pub fn outputs(&self) -> DirectoryOutputProvider {
    DirectoryOutputProvider::new(self.out())
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = self.path(relative);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
  }

  /// Write a jar with fixed timestamps so identical entries give identical bytes.
  pub fn write_jar(&self, relative: &str, entries: &[(&str, &str)]) -> PathBuf {
    let path = self.path(relative);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    let mut writer = ZipWriter::new(File::create(&path).unwrap());
    let options = SimpleFileOptions::default().last_modified_time(DateTime::default());
    for (name, content) in entries {
      writer.start_file(*name, options).unwrap();
      writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    path
  }

  pub fn context(&self) -> TransformContext {
    let config = ContextConfig::new("debug", self.path("project"));
    TransformContext::new(config, WorkerPool::new(4).unwrap())
  }

  pub fn run(
    &self,
    registry: TransformerRegistry,
    mode: TransformMode,
    inputs: Vec<TransformInput>,
  ) -> Result<TransformSummary, InvocationError> {
    let mut invocation = TransformInvocation::new(self.context(), registry, self.outputs(), mode).with_inputs(inputs);
    invocation.run()
  }
}

/// Every file under `root`, keyed by its path relative to `root`.
pub fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
  let mut files = BTreeMap::new();
  collect(root, root, &mut files);
  files
}

fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<String, Vec<u8>>) {
  let Ok(entries) = fs::read_dir(dir) else {
    return;
  };
  for entry in entries {
    let path = entry.unwrap().path();
    if path.is_dir() {
      collect(root, &path, files);
    } else {
      let key = path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
      files.insert(key, fs::read(&path).unwrap());
    }
  }
}

/// Appends a fixed suffix to every class file.
pub struct Append {
  name: &'static str,
  suffix: &'static str,
}

impl Append {
  pub fn new(name: &'static str, suffix: &'static str) -> Self {
    Self { name, suffix }
  }
}

impl Transformer for Append {
  fn name(&self) -> &str {
    self.name
  }

  fn transform(&self, _ctx: &TransformContext, mut bytecode: Vec<u8>) -> Result<Vec<u8>, TransformerError> {
    bytecode.extend_from_slice(self.suffix.as_bytes());
    Ok(bytecode)
  }
}

/// Identity transformer counting `transform` calls.
#[derive(Default)]
pub struct Counting {
  pub calls: AtomicUsize,
}

impl Counting {
  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

impl Transformer for Counting {
  fn name(&self) -> &str {
    "counting"
  }

  fn transform(&self, _ctx: &TransformContext, bytecode: Vec<u8>) -> Result<Vec<u8>, TransformerError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Ok(bytecode)
  }
}

/// Fails on class files whose content contains `needle`.
pub struct FailOn {
  pub needle: &'static [u8],
}

impl Transformer for FailOn {
  fn name(&self) -> &str {
    "fail-on"
  }

  fn transform(&self, _ctx: &TransformContext, bytecode: Vec<u8>) -> Result<Vec<u8>, TransformerError> {
    if bytecode.windows(self.needle.len()).any(|w| w == self.needle) {
      Err(TransformerError::msg(self.name(), "poisoned class"))
    } else {
      Ok(bytecode)
    }
  }
}

pub fn marking_registry() -> TransformerRegistry {
  TransformerRegistry::builder().register(Append::new("mark", "+")).build()
}

pub fn counting_registry(counting: &Arc<Counting>) -> TransformerRegistry {
  TransformerRegistry::builder()
    .register_shared(0, counting.clone())
    .build()
}

/// Every file entry of a jar, in archive order.
pub fn read_jar(path: &Path) -> Vec<(String, Vec<u8>)> {
  let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
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

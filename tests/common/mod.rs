#![allow(dead_code)]

use labelseek::vector::VectorError;
use labelseek::{EmbeddingGenerator, Settings, VectorDimension};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

pub const SAMPLE_CSV: &str = "\
label,domain,source
Hours of sleep per night,lifestyle,q1
Difficulty falling asleep,lifestyle,q2
Total household income,socioeconomic,q3
Income from benefits,socioeconomic,q4
Grey matter brain volume,imaging,mri
Sleep related brain activity,imaging,mri
Alcohol units per week,lifestyle,q5
,lifestyle,q6
";

/// Deterministic generator: one dimension per keyword, 1.0 on a hit and a
/// small floor otherwise.
pub struct KeywordGenerator {
    keywords: Vec<&'static str>,
    name: &'static str,
    calls: AtomicUsize,
}

impl KeywordGenerator {
    pub fn new(keywords: &[&'static str]) -> Self {
        Self {
            keywords: keywords.to_vec(),
            name: "keyword-test-model",
            calls: AtomicUsize::new(0),
        }
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn default_generator() -> KeywordGenerator {
    KeywordGenerator::new(&["sleep", "asleep", "income", "brain", "alcohol"])
}

impl EmbeddingGenerator for KeywordGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                self.keywords
                    .iter()
                    .map(|kw| if lower.contains(kw) { 1.0 } else { 0.05 })
                    .collect()
            })
            .collect())
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(self.keywords.len()).expect("at least one keyword")
    }

    fn model_name(&self) -> &str {
        self.name
    }
}

/// A temp directory laid out like a labelseek workspace.
pub struct TestWorkspace {
    pub dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn with_csv(content: &str) -> Self {
        let workspace = Self::new();
        workspace.write("data/labels.csv", content);
        workspace
    }

    pub fn write(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Default settings rooted at this workspace.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.workspace_root = Some(self.dir.path().to_path_buf());
        settings
    }
}

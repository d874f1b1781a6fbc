// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Reads a pre-split word-level corpus from a directory:
//
//   <data>/train.txt
//   <data>/valid.txt
//   <data>/test.txt
//
// Every line is split on whitespace and terminated with an
// `<eos>` token, so line breaks survive as a predictable token.
// All three splits share one Dictionary, built while reading
// them in train → valid → test order.
//
// Reference: Rust Book §8 (HashMap), §9 (Error Handling)

use anyhow::{bail, Context, Result};
use std::{collections::HashMap, fs, path::Path};

/// End-of-line marker appended to every line of every split.
pub const EOS: &str = "<eos>";

// ─── Dictionary ───────────────────────────────────────────────────────────────
/// Word ↔ index bijection. Indices are dense and assigned in
/// first-seen order starting from zero.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    word2idx: HashMap<String, u32>,
    idx2word: Vec<String>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `word` if unseen and return its index either way.
    pub fn add_word(&mut self, word: &str) -> u32 {
        if let Some(&idx) = self.word2idx.get(word) {
            return idx;
        }
        let idx = self.idx2word.len() as u32;
        self.idx2word.push(word.to_string());
        self.word2idx.insert(word.to_string(), idx);
        idx
    }

    #[cfg(test)]
    pub fn index_of(&self, word: &str) -> Option<u32> {
        self.word2idx.get(word).copied()
    }

    #[cfg(test)]
    pub fn word_of(&self, idx: u32) -> Option<&str> {
        self.idx2word.get(idx as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.idx2word.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idx2word.is_empty()
    }
}

// ─── Corpus ───────────────────────────────────────────────────────────────────
/// A dictionary plus the three encoded splits.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub dictionary: Dictionary,
    pub train:      Vec<u32>,
    pub valid:      Vec<u32>,
    pub test:       Vec<u32>,
}

impl Corpus {
    /// Load `train.txt`, `valid.txt` and `test.txt` from `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut dictionary = Dictionary::new();

        let train = tokenize_file(&dir.join("train.txt"), &mut dictionary)?;
        let valid = tokenize_file(&dir.join("valid.txt"), &mut dictionary)?;
        let test  = tokenize_file(&dir.join("test.txt"),  &mut dictionary)?;
        if dictionary.is_empty() {
            bail!("Corpus in '{}' contains no lines", dir.display());
        }

        tracing::info!(
            "Corpus '{}': vocab={} train={} valid={} test={}",
            dir.display(),
            dictionary.len(),
            train.len(),
            valid.len(),
            test.len(),
        );

        Ok(Self { dictionary, train, valid, test })
    }

    pub fn vocab_size(&self) -> usize {
        self.dictionary.len()
    }
}

fn tokenize_file(path: &Path, dictionary: &mut Dictionary) -> Result<Vec<u32>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read corpus split '{}'", path.display()))?;
    let ids = tokenize_text(&text, dictionary);
    tracing::debug!("Tokenized '{}' into {} ids", path.display(), ids.len());
    Ok(ids)
}

/// Encode `text` line by line, growing `dictionary` with unseen words.
pub fn tokenize_text(text: &str, dictionary: &mut Dictionary) -> Vec<u32> {
    let mut ids = Vec::new();
    for line in text.lines() {
        for word in line.split_whitespace().chain(std::iter::once(EOS)) {
            ids.push(dictionary.add_word(word));
        }
    }
    ids
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_dense_and_first_seen() {
        let mut d = Dictionary::new();
        assert_eq!(d.add_word("the"), 0);
        assert_eq!(d.add_word("cat"), 1);
        assert_eq!(d.add_word("the"), 0);
        assert_eq!(d.len(), 2);
        assert_eq!(d.word_of(1), Some("cat"));
        assert_eq!(d.index_of("dog"), None);
    }

    #[test]
    fn test_every_line_ends_with_eos() {
        let mut d = Dictionary::new();
        let ids   = tokenize_text("a b\nb  c\n", &mut d);
        let eos   = d.index_of(EOS).unwrap();
        // a b <eos> b c <eos>
        assert_eq!(ids, vec![0, 1, eos, 1, 3, eos]);
        assert_eq!(d.len(), 4);
    }

    #[test]
    fn test_blank_line_is_a_lone_eos() {
        let mut d = Dictionary::new();
        let ids   = tokenize_text("\n", &mut d);
        assert_eq!(ids, vec![0]);
        assert_eq!(d.word_of(0), Some(EOS));
    }

    #[test]
    fn test_load_shares_vocab_across_splits() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("train.txt"), "x y\n").unwrap();
        fs::write(dir.path().join("valid.txt"), "y z\n").unwrap();
        fs::write(dir.path().join("test.txt"),  "z x\n").unwrap();

        let corpus = Corpus::load(dir.path()).unwrap();
        // x y <eos> z
        assert_eq!(corpus.vocab_size(), 4);
        assert_eq!(corpus.train, vec![0, 1, 2]);
        assert_eq!(corpus.valid, vec![1, 3, 2]);
        assert_eq!(corpus.test,  vec![3, 0, 2]);
    }

    #[test]
    fn test_missing_split_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("train.txt"), "x\n").unwrap();
        let err = Corpus::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("valid.txt"));
    }

    #[test]
    fn test_all_empty_splits_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        for split in ["train.txt", "valid.txt", "test.txt"] {
            fs::write(dir.path().join(split), "").unwrap();
        }
        let err = Corpus::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no lines"));
    }
}

//! Display preferences
//!
//! Small scalars that survive restarts through a key/value store. Values are
//! read once on load, defaulted when missing or malformed, and written back
//! on every change. A store that cannot persist only costs persistence.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::warn;

pub const LINE_HEIGHT_KEY: &str = "plain-word-line-height";
pub const WORD_GAP_KEY: &str = "plain-word-word-gap";
pub const LOCALE_KEY: &str = "plain-word-locale";

pub const DEFAULT_LINE_HEIGHT: f64 = 40.0;
pub const DEFAULT_WORD_GAP: f64 = 16.0;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable string key/value storage.
pub trait LocalStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Process-lifetime storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A JSON object on disk, rewritten on every `set`.
///
/// A missing or unreadable file opens as empty.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "preferences file unreadable, starting empty");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    ZhCn,
    En,
}

impl Locale {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "zh-CN" => Some(Self::ZhCn),
            "en" => Some(Self::En),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::ZhCn => "zh-CN",
            Self::En => "en",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ZhCn => "简体中文",
            Self::En => "English",
        }
    }

    pub fn available() -> &'static [Locale] {
        &[Locale::ZhCn, Locale::En]
    }
}

pub struct Preferences<S> {
    storage: S,
    line_height: f64,
    word_gap: f64,
    locale: Locale,
}

impl<S: LocalStorage> Preferences<S> {
    pub fn load(storage: S) -> Self {
        let line_height = read_positive(&storage, LINE_HEIGHT_KEY).unwrap_or(DEFAULT_LINE_HEIGHT);
        let word_gap = read_positive(&storage, WORD_GAP_KEY).unwrap_or(DEFAULT_WORD_GAP);
        let locale = storage
            .get(LOCALE_KEY)
            .and_then(|v| Locale::parse(&v))
            .unwrap_or_default();

        Self {
            storage,
            line_height,
            word_gap,
            locale,
        }
    }

    pub fn line_height(&self) -> f64 {
        self.line_height
    }

    pub fn word_gap(&self) -> f64 {
        self.word_gap
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Ignores values that would read back as the default.
    pub fn set_line_height(&mut self, value: f64) {
        if accept(LINE_HEIGHT_KEY, value) {
            self.line_height = value;
            self.persist(LINE_HEIGHT_KEY, &value.to_string());
        }
    }

    pub fn set_word_gap(&mut self, value: f64) {
        if accept(WORD_GAP_KEY, value) {
            self.word_gap = value;
            self.persist(WORD_GAP_KEY, &value.to_string());
        }
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
        self.persist(LOCALE_KEY, locale.code());
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn persist(&self, key: &str, value: &str) {
        if let Err(err) = self.storage.set(key, value) {
            warn!(key, error = %err, "preference not persisted");
        }
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn accept(key: &str, value: f64) -> bool {
    let ok = is_positive(value);
    if !ok {
        warn!(key, value, "rejected non-positive preference");
    }
    ok
}

fn read_positive<S: LocalStorage>(storage: &S, key: &str) -> Option<f64> {
    storage
        .get(key)?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| is_positive(*v))
}

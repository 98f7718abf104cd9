//! Translation catalog
//!
//! Locale tables are JSON objects embedded from `locales/`. A table is parsed
//! on first use and kept in a small LRU cache; lookups fall back to the
//! default language and then to the key itself, so resolution never fails.

use lru::LruCache;
use rust_embed::Embed;
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

#[derive(Embed)]
#[folder = "locales"]
struct Locales;

/// Number of parsed locale tables kept in memory
const CACHE_CAPACITY: usize = 8;

/// Languages a user can pick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    En,
    Fa,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Fa, Language::En];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fa => "fa",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language code: {0}")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "fa" => Ok(Language::Fa),
            _ => Err(UnsupportedLanguage(s.to_string())),
        }
    }
}

type Table = Arc<HashMap<String, String>>;

/// Resolves translation keys against the embedded locale tables
pub struct Translator {
    default_language: Language,
    cache: Mutex<LruCache<String, Table>>,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

impl Translator {
    pub fn new(default_language: Language) -> Self {
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            default_language,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Translate `key` into `language`.
    ///
    /// `language` is a raw code on purpose: unsupported codes resolve against
    /// the default table instead of being rejected.
    pub fn resolve(&self, language: &str, key: &str, substitutions: &[(&str, &str)]) -> String {
        let text = self
            .table(language)
            .get(key)
            .cloned()
            .or_else(|| self.table(self.default_language.code()).get(key).cloned())
            .unwrap_or_else(|| key.to_string());

        if substitutions.is_empty() {
            text
        } else {
            interpolate(&text, substitutions)
        }
    }

    /// Shorthand for [`Translator::resolve`] with a typed language and no substitutions
    pub fn t(&self, language: Language, key: &str) -> String {
        self.resolve(language.code(), key, &[])
    }

    fn table(&self, language: &str) -> Table {
        let code = language.trim().to_ascii_lowercase();
        let mut cache = self.cache.lock().unwrap();
        if let Some(table) = cache.get(&code) {
            return Arc::clone(table);
        }

        let table = Arc::new(
            load_table(&code).unwrap_or_else(|| {
                load_table(self.default_language.code()).unwrap_or_default()
            }),
        );
        cache.put(code, Arc::clone(&table));
        table
    }
}

fn load_table(code: &str) -> Option<HashMap<String, String>> {
    let file = Locales::get(&format!("{code}.json"))?;
    match serde_json::from_slice(&file.data) {
        Ok(table) => Some(table),
        Err(e) => {
            tracing::error!(language = %code, error = %e, "Malformed locale table");
            None
        }
    }
}

/// Replace `{name}` placeholders. Unknown placeholders are left untouched.
/// The template is scanned once, so substituted values are never expanded again.
fn interpolate(text: &str, substitutions: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let Some((before, after)) = rest.split_once('{') else {
            out.push_str(rest);
            return out;
        };
        out.push_str(before);
        match after.split_once('}') {
            Some((name, tail)) if !name.contains('{') => {
                match substitutions.iter().find(|(n, _)| *n == name) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = tail;
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
}

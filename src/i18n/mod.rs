//! Internationalization (i18n) support
//!
//! UI strings ship built in for `pt-BR` and `en`. A site can override or
//! add languages with `languages/<lang>.yml` files of flat `key: value`
//! pairs.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const PT_BR: &[(&str, &str)] = &[
    ("load_more", "Carregar mais posts"),
    ("reading_time", "%d min"),
    ("no_posts", "Nenhum post publicado ainda."),
];

const EN: &[(&str, &str)] = &[
    ("load_more", "Load more posts"),
    ("reading_time", "%d min"),
    ("no_posts", "No posts published yet."),
];

/// Internationalization handler
#[derive(Debug, Clone)]
pub struct I18n {
    /// Current language
    language: String,
    /// Language data: lang -> key -> translation
    translations: HashMap<String, HashMap<String, String>>,
}

impl I18n {
    /// Create a handler with the built-in languages loaded
    pub fn new(language: &str) -> Self {
        let mut translations = HashMap::new();
        translations.insert("pt-BR".to_string(), to_map(PT_BR));
        translations.insert("en".to_string(), to_map(EN));

        Self {
            language: language.to_string(),
            translations,
        }
    }

    /// Load language files from a directory, overriding built-in keys
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if !path.is_file() || !matches!(ext, Some("yml") | Some("yaml")) {
                continue;
            }

            let lang = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("en")
                .to_string();

            let content = fs::read_to_string(&path)?;
            match serde_yaml::from_str::<HashMap<String, serde_yaml::Value>>(&content) {
                Ok(data) => {
                    let entries = self.translations.entry(lang).or_default();
                    for (key, value) in data {
                        if let Some(text) = yaml_value_to_string(&value) {
                            entries.insert(key, text);
                        }
                    }
                    tracing::debug!("Loaded language file: {:?}", path);
                }
                Err(e) => {
                    tracing::warn!("Failed to parse language file {:?}: {}", path, e);
                }
            }
        }

        Ok(())
    }

    /// Get a translation by key, falling back to English and then the key
    pub fn get(&self, key: &str) -> String {
        self.lookup(&self.language, key)
            .or_else(|| self.lookup("en", key))
            .unwrap_or_else(|| key.to_string())
    }

    /// Get a translation with `%d` replaced by `count`
    pub fn get_count(&self, key: &str, count: usize) -> String {
        self.get(key).replace("%d", &count.to_string())
    }

    /// All translations for the current language, English filling gaps
    pub fn get_all_translations(&self) -> HashMap<String, String> {
        let mut all = self.translations.get("en").cloned().unwrap_or_default();
        if let Some(current) = self.translations.get(&self.language) {
            all.extend(current.clone());
        }
        all
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<String> {
        self.translations
            .get(lang)
            .or_else(|| {
                // "pt" finds "pt-BR" and the reverse
                let base = lang.split('-').next().unwrap_or(lang);
                self.translations
                    .iter()
                    .find(|(l, _)| l.split('-').next() == Some(base))
                    .map(|(_, t)| t)
            })
            .and_then(|t| t.get(key))
            .cloned()
    }
}

fn to_map(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn yaml_value_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_languages() {
        let i18n = I18n::new("pt-BR");
        assert_eq!(i18n.get("load_more"), "Carregar mais posts");
        assert_eq!(i18n.get_count("reading_time", 4), "4 min");

        let en = I18n::new("en");
        assert_eq!(en.get("load_more"), "Load more posts");
    }

    #[test]
    fn test_fallbacks() {
        let i18n = I18n::new("ja");
        assert_eq!(i18n.get("no_posts"), "No posts published yet.");
        assert_eq!(i18n.get("missing.key"), "missing.key");

        let pt = I18n::new("pt");
        assert_eq!(pt.get("load_more"), "Carregar mais posts");
    }

    #[test]
    fn test_load_languages_overrides() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("pt-BR.yml"),
            "load_more: Mais posts\nextra: 3\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut i18n = I18n::new("pt-BR");
        i18n.load_languages(dir.path()).unwrap();
        assert_eq!(i18n.get("load_more"), "Mais posts");
        assert_eq!(i18n.get("extra"), "3");
        assert_eq!(i18n.get("no_posts"), "Nenhum post publicado ainda.");

        let all = i18n.get_all_translations();
        assert_eq!(all.get("load_more").map(String::as_str), Some("Mais posts"));
        assert_eq!(
            all.get("reading_time").map(String::as_str),
            Some("%d min")
        );
    }
}

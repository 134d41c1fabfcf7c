//! Internationalization (i18n) module.
//!
//! Translations are embedded JSON files, looked up by dotted key
//! (e.g. `prefix.current`) with English as the fallback language.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde_json::Value;
use tracing::warn;

/// Global translation store: LangCode -> Key -> Text
static TRANSLATIONS: OnceLock<HashMap<String, Value>> = OnceLock::new();

const FALLBACK_LANG: &str = "en";

/// Languages shipped with the bot.
pub const SUPPORTED_LANGS: &[&str] = &["en", "id"];

fn load() -> HashMap<String, Value> {
    let sources = [("en", include_str!("en.json")), ("id", include_str!("id.json"))];

    let mut map = HashMap::new();
    for (lang, json) in sources {
        match serde_json::from_str(json) {
            Ok(val) => {
                map.insert(lang.to_string(), val);
            }
            Err(e) => warn!("Failed to parse translations for {}: {}", lang, e),
        }
    }
    map
}

/// Load translations. Safe to call more than once.
pub fn init() {
    TRANSLATIONS.get_or_init(load);
}

/// Get text for a key in a specific language.
///
/// Falls back to English, then to the key itself.
pub fn get_text(lang: &str, key: &str) -> String {
    let store = TRANSLATIONS.get_or_init(load);

    store
        .get(lang)
        .and_then(|val| resolve_key(val, key))
        .or_else(|| store.get(FALLBACK_LANG).and_then(|val| resolve_key(val, key)))
        .unwrap_or_else(|| key.to_string())
}

/// Get text and substitute `{name}` placeholders.
pub fn format_text(lang: &str, key: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(get_text(lang, key), |text, (name, value)| {
        text.replace(&format!("{{{name}}}"), value)
    })
}

fn resolve_key(val: &Value, key: &str) -> Option<String> {
    let mut current = val;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    current.as_str().map(str::to_string)
}

/// Pick the reply language: the configured one if we ship it, else English.
pub fn resolve_locale(configured: &str) -> String {
    let lang = configured.trim().to_lowercase();
    if SUPPORTED_LANGS.contains(&lang.as_str()) {
        lang
    } else {
        FALLBACK_LANG.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_fallback() {
        init();
        assert_eq!(get_text("en", "prefix.no_prefix"), "No Prefix");
        assert_eq!(get_text("id", "prefix.no_prefix"), "Tanpa Prefix");
        // Missing in id, present in en.
        assert!(get_text("id", "start.text").contains("Sigil"));
        assert_eq!(get_text("en", "does.not.exist"), "does.not.exist");
    }

    #[test]
    fn test_format_text() {
        let text = format_text("en", "prefix.current", &[("prefix", "?")]);
        assert_eq!(text, "The prefix for this chat is <code>?</code>");
    }

    #[test]
    fn test_resolve_locale() {
        assert_eq!(resolve_locale("ID"), "id");
        assert_eq!(resolve_locale("fr"), "en");
    }
}

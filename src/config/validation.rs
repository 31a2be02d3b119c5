//! Settings validation: unknown-key detection with suggestions and value checks.
//!
//! Raw TOML is walked before serde sees it so a misspelled key (which serde
//! would silently default) produces a "did you mean?" warning. Warnings never
//! break a settings file; value errors do.

use std::collections::HashSet;
use std::net::SocketAddr;

use super::Settings;

/// A non-fatal settings warning (typo, unknown section).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Keys
// ============================================================================

/// Every valid dotted key path of [`Settings`].
///
/// Kept by hand in step with `settings.rs`.
pub fn known_config_keys() -> HashSet<&'static str> {
    [
        "motor",
        "remote",
        "remote.url",
        "remote.api_key",
        "remote.model",
        "endpoints",
        "endpoints.ollama_url",
        "endpoints.lmstudio_url",
        "ui",
        "ui.theme",
        "server",
        "server.addr",
    ]
    .into_iter()
    .collect()
}

/// Collect dotted key paths from a parsed TOML tree.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Closest known key within edit distance 3, if any.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (*k, levenshtein(unknown, k)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by(|(ka, da), (kb, db)| da.cmp(db).then_with(|| ka.cmp(kb)))
        .map(|(k, _)| k.to_string())
}

/// Warn about keys that [`Settings`] does not know.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        // serde reports the parse error
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown settings key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Value Checks
// ============================================================================

/// Hard errors in setting values.
pub fn validate_values(settings: &Settings) -> Vec<String> {
    let mut errors = Vec::new();

    check_http_url("endpoints.ollama_url", &settings.endpoints.ollama_url, &mut errors);
    check_http_url("endpoints.lmstudio_url", &settings.endpoints.lmstudio_url, &mut errors);

    // remote.url may stay empty until the user fills in the form
    if !settings.remote.url.trim().is_empty() {
        check_http_url("remote.url", &settings.remote.url, &mut errors);
    }

    if settings.server.addr.parse::<SocketAddr>().is_err() {
        errors.push(format!(
            "server.addr '{}' is not a valid HOST:PORT socket address",
            settings.server.addr
        ));
    }

    errors
}

fn check_http_url(name: &str, url: &str, errors: &mut Vec<String>) {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(format!("{name} must start with http:// or https:// (got '{url}')"));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typo_gets_suggestion() {
        let warnings = validate_unknown_keys("[remote]\napi_kye = \"sk\"\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "remote.api_kye");
        assert_eq!(warnings[0].suggestion.as_deref(), Some("remote.api_key"));
    }

    #[test]
    fn test_known_keys_produce_no_warnings() {
        let toml_str = r#"
motor = "api"

[remote]
url = "https://llm.example.com/v1"
api_key = "sk"
model = "gpt"

[ui]
theme = "light"
"#;
        assert!(validate_unknown_keys(toml_str).is_empty());
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("motor", "motor"), 0);
        assert_eq!(levenshtein("moter", "motor"), 1);
        assert_eq!(levenshtein("", "ui"), 2);
    }

    #[test]
    fn test_value_checks() {
        let mut settings = Settings::default();
        assert!(validate_values(&settings).is_empty());

        settings.remote.url = "llm.example.com".to_string();
        settings.server.addr = "localhost".to_string();
        let errors = validate_values(&settings);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("remote.url")));
        assert!(errors.iter().any(|e| e.contains("server.addr")));
    }
}

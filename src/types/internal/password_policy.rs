use regex::Regex;

use crate::errors::InternalError;
use crate::types::db::password_policy;

pub const DEFAULT_SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";
pub const BUILTIN_MIN_LENGTH: usize = 8;

/// Password policy as applied, whichever source it was resolved from
#[derive(Debug, Clone)]
pub struct EffectivePolicy {
    /// `None` for the built-in fallback
    pub policy_id: Option<String>,
    pub name: String,
    pub min_length: usize,
    pub max_length: Option<usize>,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_numbers: bool,
    pub require_special_chars: bool,
    pub special_chars: String,
    pub special_pattern: Regex,
    pub history_count: u64,
    pub max_failed_attempts: i32,
    pub lockout_duration_minutes: i32,
    pub min_age_days: i32,
    /// Lowercased
    pub blacklist: Vec<String>,
}

impl EffectivePolicy {
    /// Fallback when no stored policy applies: minimum length only
    pub fn builtin() -> Result<Self, InternalError> {
        Ok(Self {
            policy_id: None,
            name: "builtin".to_string(),
            min_length: BUILTIN_MIN_LENGTH,
            max_length: None,
            require_uppercase: false,
            require_lowercase: false,
            require_numbers: false,
            require_special_chars: false,
            special_chars: DEFAULT_SPECIAL_CHARS.to_string(),
            special_pattern: special_char_pattern(DEFAULT_SPECIAL_CHARS)?,
            history_count: 0,
            max_failed_attempts: 5,
            lockout_duration_minutes: 15,
            min_age_days: 0,
            blacklist: Vec::new(),
        })
    }

    pub fn from_model(model: &password_policy::Model) -> Result<Self, InternalError> {
        let special_chars = match model.allowed_special_chars.as_deref() {
            Some(chars) if !chars.is_empty() => chars.to_string(),
            _ => DEFAULT_SPECIAL_CHARS.to_string(),
        };

        Ok(Self {
            policy_id: Some(model.id.clone()),
            name: model.name.clone(),
            min_length: usize::try_from(model.min_length).unwrap_or(0),
            max_length: usize::try_from(model.max_length).ok().filter(|max| *max > 0),
            require_uppercase: model.require_uppercase,
            require_lowercase: model.require_lowercase,
            require_numbers: model.require_numbers,
            require_special_chars: model.require_special_chars,
            special_pattern: special_char_pattern(&special_chars)?,
            special_chars,
            history_count: u64::try_from(model.password_history_count).unwrap_or(0),
            max_failed_attempts: model.max_failed_attempts,
            lockout_duration_minutes: model.lockout_duration_minutes,
            min_age_days: model.min_age_days,
            blacklist: parse_blacklist(&model.id, model.common_passwords_blacklist.as_deref()),
        })
    }
}

/// Character class matching any one of `chars`, each escaped
pub fn special_char_pattern(chars: &str) -> Result<Regex, InternalError> {
    let escaped: String = chars
        .chars()
        .map(|c| regex::escape(c.encode_utf8(&mut [0; 4])))
        .collect();

    Regex::new(&format!("[{}]", escaped))
        .map_err(|e| InternalError::parse("special_char_pattern", e.to_string()))
}

fn parse_blacklist(policy_id: &str, raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(entries) => entries.into_iter().map(|entry| entry.to_lowercase()).collect(),
        Err(e) => {
            tracing::warn!(
                "Ignoring malformed blacklist on password policy {}: {}",
                policy_id,
                e
            );
            Vec::new()
        }
    }
}

use std::collections::HashMap;

/// Source of raw configuration values
///
/// Settings and secrets read through this trait so tests can supply their own
/// values without touching the process environment. Blank values count as
/// unset, which keeps a `.env` line like `PASSWORD_PEPPER=` from shadowing a
/// default.
pub trait EnvironmentProvider: Send + Sync {
    fn raw_var(&self, key: &str) -> Option<String>;

    fn get_var(&self, key: &str) -> Option<String> {
        self.raw_var(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// Reads the process environment (after `dotenv` has loaded `.env`)
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn raw_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// In-memory environment for tests
#[derive(Debug, Default, Clone)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_vars(self, vars: &[(&str, &str)]) -> Self {
        vars.iter()
            .fold(self, |env, (key, value)| env.with_var(key, value))
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn raw_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

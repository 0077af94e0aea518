// 📜 Loan Policy - Rules as Data
// Policy constants live in a JSON file so the desk can change them without a rebuild

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

pub const DEFAULT_FINE_PER_DAY: u64 = 10;
pub const DEFAULT_LOAN_PERIOD_DAYS: u32 = 7;
pub const DEFAULT_MAX_LOANS: u32 = 3;
pub const DEFAULT_DUE_SOON_DAYS: i64 = 2;

pub const ENV_FINE_PER_DAY: &str = "LOAN_FINE_PER_DAY";
pub const ENV_LOAN_PERIOD_DAYS: &str = "LOAN_PERIOD_DAYS";
pub const ENV_MAX_LOANS: &str = "LOAN_MAX_LOANS";
pub const ENV_DUE_SOON_DAYS: &str = "LOAN_DUE_SOON_DAYS";

// ============================================================================
// POLICY DEFINITION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanPolicy {
    /// Fine charged per full overdue day, in whole currency units
    pub fine_per_day: u64,

    /// Days between borrow and due date
    pub loan_period_days: u32,

    /// Maximum simultaneously open loans per student
    pub max_loans: u32,

    /// Loans due within this many days are flagged "due-soon"
    pub due_soon_days: i64,

    pub currency_symbol: String,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        LoanPolicy {
            fine_per_day: DEFAULT_FINE_PER_DAY,
            loan_period_days: DEFAULT_LOAN_PERIOD_DAYS,
            max_loans: DEFAULT_MAX_LOANS,
            due_soon_days: DEFAULT_DUE_SOON_DAYS,
            currency_symbol: "₹".to_string(),
        }
    }
}

impl LoanPolicy {
    /// Load policy from JSON file; missing fields keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read policy file: {:?}", path.as_ref()))?;

        let policy: LoanPolicy = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse policy JSON: {:?}", path.as_ref()))?;

        info!(path = ?path.as_ref(), ?policy, "loaded loan policy");
        Ok(policy)
    }

    /// Apply `LOAN_*` environment overrides on top of this policy
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Same as [`with_env_overrides`](Self::with_env_overrides) but with an explicit lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_FINE_PER_DAY) {
            self.fine_per_day = parse_override(ENV_FINE_PER_DAY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LOAN_PERIOD_DAYS) {
            self.loan_period_days = parse_override(ENV_LOAN_PERIOD_DAYS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_LOANS) {
            self.max_loans = parse_override(ENV_MAX_LOANS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DUE_SOON_DAYS) {
            self.due_soon_days = parse_override(ENV_DUE_SOON_DAYS, &raw)?;
        }
        Ok(self)
    }

    /// Resolve policy: file (if given) or defaults, then environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(p) => LoanPolicy::from_file(p)?,
            None => LoanPolicy::default(),
        };
        base.with_env_overrides()
    }

    pub fn format_amount(&self, amount: u64) -> String {
        format!("{}{}", self.currency_symbol, amount)
    }
}

fn parse_override<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("Invalid value for {}: {:?}", key, raw))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_policy() {
        let policy = LoanPolicy::default();

        assert_eq!(policy.fine_per_day, 10);
        assert_eq!(policy.loan_period_days, 7);
        assert_eq!(policy.max_loans, 3);
        assert_eq!(policy.due_soon_days, 2);
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "fine_per_day": 5, "max_loans": 4 }}"#).unwrap();

        let policy = LoanPolicy::from_file(file.path()).unwrap();

        assert_eq!(policy.fine_per_day, 5);
        assert_eq!(policy.max_loans, 4);
        assert_eq!(policy.loan_period_days, 7);
    }

    #[test]
    fn test_from_file_rejects_negative_period() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "loan_period_days": -7 }}"#).unwrap();

        assert!(LoanPolicy::from_file(file.path()).is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let err = LoanPolicy::from_file("/nonexistent/policy.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read policy file"));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [(ENV_FINE_PER_DAY, "25"), (ENV_DUE_SOON_DAYS, "3")]
            .into_iter()
            .collect();

        let policy = LoanPolicy::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(policy.fine_per_day, 25);
        assert_eq!(policy.due_soon_days, 3);
        assert_eq!(policy.max_loans, 3);
    }

    #[test]
    fn test_override_rejects_garbage() {
        let result = LoanPolicy::default().with_overrides(|key| {
            (key == ENV_MAX_LOANS).then(|| "three".to_string())
        });

        assert!(result.is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(LoanPolicy::default().format_amount(20), "₹20");
    }
}

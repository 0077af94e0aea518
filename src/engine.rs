// ⚖️ Loan Policy Engine - due dates, fines, eligibility
//
// Stateless: every answer is a function of the inputs, the policy and the
// clock's "now". Nothing is cached between calls.

use crate::clock::{Clock, SystemClock};
use crate::error::ValidationError;
use crate::policy::LoanPolicy;
use crate::timestamp::parse_optional_timestamp;
use chrono::{Days, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

// ============================================================================
// URGENCY
// ============================================================================

/// Visual urgency of an open loan. Has no effect on fines or eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    Overdue,
    DueSoon,
    Ok,
}

impl Urgency {
    /// Classify with an explicit due-soon window (inclusive)
    pub fn from_days_remaining(days_remaining: i64, due_soon_days: i64) -> Self {
        if days_remaining < 0 {
            Urgency::Overdue
        } else if days_remaining <= due_soon_days {
            Urgency::DueSoon
        } else {
            Urgency::Ok
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Overdue => "overdue",
            Urgency::DueSoon => "due-soon",
            Urgency::Ok => "ok",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FREE FUNCTIONS
// ============================================================================

/// Whole days from `now` until `due_date`, rounded up.
///
/// Positive: time left. Zero: due today. Negative: overdue by `abs` days.
pub fn days_between(now: NaiveDateTime, due_date: NaiveDateTime) -> i64 {
    let millis = due_date.signed_duration_since(now).num_milliseconds();
    let days = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) == 0 {
        days
    } else {
        days + 1
    }
}

pub fn can_borrow(active_loan_count: u32, max_loans: u32) -> bool {
    active_loan_count < max_loans
}

/// `borrow_date` plus `loan_period_days` calendar days
pub fn projected_due_date(
    borrow_date: NaiveDateTime,
    loan_period_days: u32,
) -> Result<NaiveDateTime, ValidationError> {
    borrow_date
        .checked_add_days(Days::new(u64::from(loan_period_days)))
        .ok_or_else(|| ValidationError::DateOutOfRange {
            field: "due_date".to_string(),
        })
}

// ============================================================================
// ENGINE
// ============================================================================

#[derive(Debug)]
pub struct LoanPolicyEngine<C: Clock = SystemClock> {
    policy: LoanPolicy,
    clock: C,
}

impl LoanPolicyEngine<SystemClock> {
    /// Engine on the default policy and the host clock
    pub fn system() -> Self {
        LoanPolicyEngine::new(LoanPolicy::default(), SystemClock)
    }
}

impl<C: Clock> LoanPolicyEngine<C> {
    pub fn new(policy: LoanPolicy, clock: C) -> Self {
        LoanPolicyEngine { policy, clock }
    }

    pub fn policy(&self) -> &LoanPolicy {
        &self.policy
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Days until `due_date`; an absent due date counts as `0` (not applicable)
    pub fn days_remaining(&self, due_date: Option<NaiveDateTime>) -> i64 {
        match due_date {
            Some(due) => days_between(self.clock.now(), due),
            None => 0,
        }
    }

    pub fn is_overdue(&self, due_date: Option<NaiveDateTime>) -> bool {
        self.days_remaining(due_date) < 0
    }

    pub fn classify_urgency(&self, days_remaining: i64) -> Urgency {
        Urgency::from_days_remaining(days_remaining, self.policy.due_soon_days)
    }

    /// Fine at the policy rate
    pub fn compute_fine(&self, due_date: Option<NaiveDateTime>) -> u64 {
        self.compute_fine_at_rate(due_date, self.policy.fine_per_day)
    }

    pub fn compute_fine_at_rate(&self, due_date: Option<NaiveDateTime>, fine_per_day: u64) -> u64 {
        let overdue_days = (-self.days_remaining(due_date)).max(0) as u64;
        let fine = overdue_days.saturating_mul(fine_per_day);
        debug!(?due_date, overdue_days, fine, "computed fine");
        fine
    }

    /// Due date for a loan starting at `borrow_date` under the policy's loan period
    pub fn due_date_for(&self, borrow_date: NaiveDateTime) -> Result<NaiveDateTime, ValidationError> {
        projected_due_date(borrow_date, self.policy.loan_period_days)
    }

    pub fn can_borrow(&self, active_loan_count: u32) -> bool {
        can_borrow(active_loan_count, self.policy.max_loans)
    }

    // ------------------------------------------------------------------------
    // Raw-string variants: blank means "absent", garbage is an error
    // ------------------------------------------------------------------------

    pub fn days_remaining_str(&self, due_date: Option<&str>) -> Result<i64, ValidationError> {
        let due = parse_optional_timestamp("due_date", due_date)?;
        Ok(self.days_remaining(due))
    }

    pub fn is_overdue_str(&self, due_date: Option<&str>) -> Result<bool, ValidationError> {
        Ok(self.days_remaining_str(due_date)? < 0)
    }

    pub fn compute_fine_str(&self, due_date: Option<&str>) -> Result<u64, ValidationError> {
        let due = parse_optional_timestamp("due_date", due_date)?;
        Ok(self.compute_fine(due))
    }
}

// ============================================================================
// TESTS
// ============================================================================

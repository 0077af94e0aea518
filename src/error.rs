// 🚫 Error Taxonomy
// Input errors surface to the caller; nothing here is retried or swallowed

use thiserror::Error;

// ============================================================================
// VALIDATION ERRORS
// ============================================================================

/// Malformed or missing input where a value is required
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: timestamp is required")]
    MissingTimestamp { field: String },

    #[error("{field}: cannot parse timestamp {value:?}")]
    MalformedTimestamp { field: String, value: String },

    #[error("{field}: date is outside the supported calendar range")]
    DateOutOfRange { field: String },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingTimestamp { field }
            | ValidationError::MalformedTimestamp { field, .. }
            | ValidationError::DateOutOfRange { field } => field,
        }
    }
}

// ============================================================================
// POLICY VIOLATIONS
// ============================================================================

/// Borrow/return requests the front end should block before they reach the backend.
///
/// These are caller-level outcomes: the engine only answers yes/no questions,
/// the pre-checks in `standing` translate a "no" into one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("Borrow limit reached. You have {active}/{max} books. Please return a book first.")]
    BorrowLimitReached { active: u32, max: u32 },

    #[error("'{title}' is not available. Total copies: {quantity}, Available: {available}")]
    BookUnavailable {
        title: String,
        quantity: u32,
        available: u32,
    },

    #[error("Cannot borrow. You have {count} overdue book(s). Please return them first.")]
    HasOverdueLoans { count: u32 },

    #[error("Cannot borrow. Please pay pending fine of {currency_symbol}{amount}")]
    PendingFine { amount: u64, currency_symbol: String },

    #[error("You have already borrowed '{title}'. Please return it before borrowing another copy.")]
    AlreadyBorrowed { title: String },

    #[error("Transaction {transaction_id} is not currently borrowed")]
    NotBorrowed { transaction_id: i64 },
}

// ============================================================================
// LOAN ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Policy(#[from] PolicyViolation),
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::MalformedTimestamp {
            field: "due_date".to_string(),
            value: "yesterday".to_string(),
        };

        assert_eq!(err.to_string(), "due_date: cannot parse timestamp \"yesterday\"");
        assert_eq!(err.field(), "due_date");
    }

    #[test]
    fn test_borrow_limit_message() {
        let err = PolicyViolation::BorrowLimitReached { active: 3, max: 3 };

        assert_eq!(
            err.to_string(),
            "Borrow limit reached. You have 3/3 books. Please return a book first."
        );
    }

    #[test]
    fn test_pending_fine_message() {
        let err = PolicyViolation::PendingFine {
            amount: 120,
            currency_symbol: "₹".to_string(),
        };

        assert_eq!(err.to_string(), "Cannot borrow. Please pay pending fine of ₹120");
    }

    #[test]
    fn test_loan_error_is_transparent() {
        let err: LoanError = PolicyViolation::NotBorrowed { transaction_id: 7 }.into();
        assert_eq!(err.to_string(), "Transaction 7 is not currently borrowed");
    }
}

// 🎓 Borrower Standing - optimistic pre-checks before a borrow/return request
//
// The backend re-checks everything under its own lock; these checks only
// keep obviously doomed requests off the wire and give the user a message.

use crate::clock::Clock;
use crate::engine::LoanPolicyEngine;
use crate::error::{LoanError, PolicyViolation};
use crate::loan::LoanTransaction;
use crate::timestamp::to_iso;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ============================================================================
// BORROWER STANDING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BorrowerStanding {
    pub active_loan_count: u32,

    /// Open loans past their due date
    pub overdue_loan_count: u32,

    /// Live fines on open loans plus recorded fines on returned ones
    pub pending_fine_total: u64,

    /// Books currently held, for the duplicate-borrow check
    pub held_book_ids: Vec<i64>,
}

impl BorrowerStanding {
    /// Derive standing from a borrower's loans (caller filters by student)
    pub fn from_loans<'a, C, I>(engine: &LoanPolicyEngine<C>, loans: I) -> Self
    where
        C: Clock,
        I: IntoIterator<Item = &'a LoanTransaction>,
    {
        let mut standing = BorrowerStanding {
            active_loan_count: 0,
            overdue_loan_count: 0,
            pending_fine_total: 0,
            held_book_ids: Vec::new(),
        };

        for loan in loans {
            if loan.is_open() {
                standing.active_loan_count += 1;
                if engine.is_overdue(loan.due_date) {
                    standing.overdue_loan_count += 1;
                }
                standing.pending_fine_total += engine.compute_fine(loan.due_date);
                if let Some(book_id) = loan.book_id {
                    standing.held_book_ids.push(book_id);
                }
            } else {
                standing.pending_fine_total += loan.recorded_fine();
            }
        }

        debug!(?standing, "derived borrower standing");
        standing
    }

    /// Standing of one student taken from a mixed list of loans
    pub fn for_student<C: Clock>(
        engine: &LoanPolicyEngine<C>,
        loans: &[LoanTransaction],
        student_id: i64,
    ) -> Self {
        BorrowerStanding::from_loans(
            engine,
            loans.iter().filter(|l| l.student_id == Some(student_id)),
        )
    }

    pub fn holds_book(&self, book_id: i64) -> bool {
        self.held_book_ids.contains(&book_id)
    }
}

// ============================================================================
// BORROW PRE-CHECK
// ============================================================================

/// What the student is asking to borrow, as last seen in the catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookAvailability {
    pub book_id: i64,
    pub title: String,
    pub quantity: u32,
    pub available: u32,
}

/// Checked in the order the desk reports them:
/// cap, stock, overdue loans, unpaid fines, duplicate borrow
pub fn check_borrow<C: Clock>(
    engine: &LoanPolicyEngine<C>,
    standing: &BorrowerStanding,
    book: &BookAvailability,
) -> Result<(), PolicyViolation> {
    let violation = if !engine.can_borrow(standing.active_loan_count) {
        Some(PolicyViolation::BorrowLimitReached {
            active: standing.active_loan_count,
            max: engine.policy().max_loans,
        })
    } else if book.available == 0 {
        Some(PolicyViolation::BookUnavailable {
            title: book.title.clone(),
            quantity: book.quantity,
            available: book.available,
        })
    } else if standing.overdue_loan_count > 0 {
        Some(PolicyViolation::HasOverdueLoans {
            count: standing.overdue_loan_count,
        })
    } else if standing.pending_fine_total > 0 {
        Some(PolicyViolation::PendingFine {
            amount: standing.pending_fine_total,
            currency_symbol: engine.policy().currency_symbol.clone(),
        })
    } else if standing.holds_book(book.book_id) {
        Some(PolicyViolation::AlreadyBorrowed {
            title: book.title.clone(),
        })
    } else {
        None
    };

    match violation {
        Some(v) => {
            warn!(book_id = book.book_id, reason = %v, "borrow pre-check rejected");
            Err(v)
        }
        None => Ok(()),
    }
}

// ============================================================================
// RETURN SETTLEMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnSettlement {
    pub loan_id: i64,
    #[serde(serialize_with = "serialize_iso")]
    pub return_date: NaiveDateTime,
    pub days_overdue: u64,
    pub fine: u64,
    pub message: String,
}

fn serialize_iso<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&to_iso(*value))
}

/// Fine owed if `loan` is returned now
pub fn settle_return<C: Clock>(
    engine: &LoanPolicyEngine<C>,
    loan: &LoanTransaction,
) -> Result<ReturnSettlement, LoanError> {
    if !loan.is_open() {
        return Err(PolicyViolation::NotBorrowed {
            transaction_id: loan.id,
        }
        .into());
    }

    let days_overdue = (-engine.days_remaining(loan.due_date)).max(0) as u64;
    let fine = engine.compute_fine(loan.due_date);
    let message = if fine > 0 {
        format!("Book returned. Fine: {}", engine.policy().format_amount(fine))
    } else {
        "Book returned successfully".to_string()
    };

    Ok(ReturnSettlement {
        loan_id: loan.id,
        return_date: engine.now(),
        days_overdue,
        fine,
        message,
    })
}

// ============================================================================
// TESTS
// ============================================================================

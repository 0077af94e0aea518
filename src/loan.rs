// 📚 Loans - backend transaction records and their evaluated views
//
// Records are read-only snapshots from the backend. Evaluating a record never
// mutates it; it produces a separate `LoanView` for display.

use crate::clock::Clock;
use crate::engine::{LoanPolicyEngine, Urgency};
use crate::timestamp::{self, format_date};
use anyhow::{Context as AnyhowContext, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// LOAN STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Borrowed,
    Returned,
}

// ============================================================================
// LOAN TRANSACTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSummary {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
}

/// One book borrowed by one student, as the backend reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LoanRecord")]
pub struct LoanTransaction {
    /// Row id - the key used for return requests
    pub id: i64,

    /// Transaction number as sent by the backend; the student endpoint
    /// sends only this one and it carries the row id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_title: Option<String>,

    /// Nested book summary (student "my books" endpoint)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book: Option<BookSummary>,

    #[serde(with = "timestamp::required")]
    pub borrow_date: NaiveDateTime,

    #[serde(default, with = "timestamp::optional")]
    pub due_date: Option<NaiveDateTime>,

    /// Absent while the loan is open
    #[serde(default, with = "timestamp::optional")]
    pub return_date: Option<NaiveDateTime>,

    /// Fine recorded by the backend at its last evaluation
    #[serde(default, alias = "fine")]
    pub fine_amount: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LoanStatus>,
}

/// Wire shape: either `id` or `transaction_id` must be present
#[derive(Deserialize)]
struct LoanRecord {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    transaction_id: Option<i64>,
    #[serde(default)]
    student_id: Option<i64>,
    #[serde(default)]
    student_name: Option<String>,
    #[serde(default)]
    book_id: Option<i64>,
    #[serde(default)]
    book_title: Option<String>,
    #[serde(default)]
    book: Option<BookSummary>,
    #[serde(with = "timestamp::required")]
    borrow_date: NaiveDateTime,
    #[serde(default, with = "timestamp::optional")]
    due_date: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp::optional")]
    return_date: Option<NaiveDateTime>,
    #[serde(default, alias = "fine")]
    fine_amount: f64,
    #[serde(default)]
    status: Option<LoanStatus>,
}

impl TryFrom<LoanRecord> for LoanTransaction {
    type Error = String;

    fn try_from(record: LoanRecord) -> std::result::Result<Self, Self::Error> {
        let id = record
            .id
            .or(record.transaction_id)
            .ok_or_else(|| "missing field `id` or `transaction_id`".to_string())?;

        Ok(LoanTransaction {
            id,
            transaction_id: record.transaction_id,
            student_id: record.student_id,
            student_name: record.student_name,
            book_id: record.book_id,
            book_title: record.book_title,
            book: record.book,
            borrow_date: record.borrow_date,
            due_date: record.due_date,
            return_date: record.return_date,
            fine_amount: record.fine_amount,
            status: record.status,
        })
    }
}

impl LoanTransaction {
    /// Minimal open loan; used by callers that build records by hand
    pub fn open(id: i64, borrow_date: NaiveDateTime, due_date: NaiveDateTime) -> Self {
        LoanTransaction {
            id,
            transaction_id: None,
            student_id: None,
            student_name: None,
            book_id: None,
            book_title: None,
            book: None,
            borrow_date,
            due_date: Some(due_date),
            return_date: None,
            fine_amount: 0.0,
            status: Some(LoanStatus::Borrowed),
        }
    }

    pub fn for_student(mut self, student_id: i64) -> Self {
        self.student_id = Some(student_id);
        self
    }

    pub fn for_book(mut self, book_id: i64, title: &str) -> Self {
        self.book_id = Some(book_id);
        self.book_title = Some(title.to_string());
        self
    }

    pub fn returned(mut self, return_date: NaiveDateTime, fine_amount: f64) -> Self {
        self.return_date = Some(return_date);
        self.fine_amount = fine_amount;
        self.status = Some(LoanStatus::Returned);
        self
    }

    /// Open = not returned. An explicit status wins over the return date.
    pub fn is_open(&self) -> bool {
        match self.status {
            Some(LoanStatus::Returned) => false,
            Some(LoanStatus::Borrowed) => true,
            None => self.return_date.is_none(),
        }
    }

    pub fn title(&self) -> &str {
        self.book_title
            .as_deref()
            .or_else(|| self.book.as_ref().map(|b| b.title.as_str()))
            .unwrap_or("Unknown")
    }

    /// Recorded fine in whole currency units; negative or NaN values count as zero
    pub fn recorded_fine(&self) -> u64 {
        if self.fine_amount.is_finite() && self.fine_amount > 0.0 {
            self.fine_amount.round() as u64
        } else {
            0
        }
    }
}

/// Load a JSON array of loan records (the shape of the backend's list endpoints)
pub fn load_loans<P: AsRef<Path>>(path: P) -> Result<Vec<LoanTransaction>> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read loans file: {:?}", path.as_ref()))?;

    parse_loans(&content).with_context(|| format!("Failed to parse loans JSON: {:?}", path.as_ref()))
}

pub fn parse_loans(json: &str) -> Result<Vec<LoanTransaction>> {
    let loans: Vec<LoanTransaction> = serde_json::from_str(json)?;
    Ok(loans)
}

// ============================================================================
// LOAN VIEW
// ============================================================================

/// Display values derived from one loan at the engine's "now"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanView {
    pub id: i64,
    pub title: String,
    pub borrow_date: String,
    pub due_date: String,
    pub open: bool,
    pub days_remaining: i64,
    /// `None` for returned loans
    pub urgency: Option<Urgency>,
    pub fine: u64,
    pub status_line: String,
}

impl LoanView {
    pub fn evaluate<C: Clock>(engine: &LoanPolicyEngine<C>, loan: &LoanTransaction) -> Self {
        let open = loan.is_open();

        let (days_remaining, urgency, fine, status_line) = if open {
            let days = engine.days_remaining(loan.due_date);
            let status_line = if days >= 0 {
                format!("✅ {} days remaining", days)
            } else {
                format!("⚠️ {} days overdue", days.abs())
            };
            (
                days,
                Some(engine.classify_urgency(days)),
                engine.compute_fine(loan.due_date),
                status_line,
            )
        } else {
            (
                0,
                None,
                loan.recorded_fine(),
                format!("Returned on {}", format_date(loan.return_date)),
            )
        };

        LoanView {
            id: loan.id,
            title: loan.title().to_string(),
            borrow_date: format_date(Some(loan.borrow_date)),
            due_date: format_date(loan.due_date),
            open,
            days_remaining,
            urgency,
            fine,
            status_line,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::policy::LoanPolicy;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn engine_at(now: NaiveDateTime) -> LoanPolicyEngine<FixedClock> {
        LoanPolicyEngine::new(LoanPolicy::default(), FixedClock(now))
    }

    #[test]
    fn test_parse_admin_transaction() {
        let json = r#"[{
            "id": 4,
            "transaction_id": 1004,
            "student_id": 2,
            "student_name": "Asha",
            "registration_no": "STU002",
            "book_id": 9,
            "book_title": "Dune",
            "borrow_date": "2024-01-01T10:00:00.000001",
            "due_date": "2024-01-08T10:00:00.000001",
            "return_date": null,
            "fine_amount": 0.0,
            "status": "borrowed"
        }]"#;

        let loans = parse_loans(json).unwrap();

        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].transaction_id, Some(1004));
        assert_eq!(loans[0].title(), "Dune");
        assert!(loans[0].is_open());
    }

    #[test]
    fn test_parse_my_books_shape() {
        let json = r#"[{
            "transaction_id": 4,
            "book": {
                "id": 9,
                "title": "Dune",
                "author": "Frank Herbert",
                "isbn": "9780441172719",
                "category": "Fiction",
                "pages": 412,
                "price": 499.5
            },
            "borrow_date": "2024-01-01T10:00:00.123456",
            "due_date": "2024-01-08T10:00:00.123456",
            "days_remaining": -3,
            "is_overdue": true,
            "fine": 20
        }]"#;

        let loans = parse_loans(json).unwrap();

        assert_eq!(loans[0].id, 4);
        assert_eq!(loans[0].transaction_id, Some(4));
        assert_eq!(loans[0].title(), "Dune");
        assert_eq!(loans[0].recorded_fine(), 20);
        assert!(loans[0].is_open());
    }

    #[test]
    fn test_parse_prefers_row_id() {
        let json = r#"[{ "id": 4, "transaction_id": 1004, "borrow_date": "2024-01-01" }]"#;

        let loans = parse_loans(json).unwrap();

        assert_eq!(loans[0].id, 4);
        assert_eq!(loans[0].transaction_id, Some(1004));
    }

    #[test]
    fn test_parse_requires_some_id() {
        let json = r#"[{ "borrow_date": "2024-01-01", "due_date": "2024-01-08" }]"#;

        let err = parse_loans(json).unwrap_err();
        assert!(err.to_string().contains("transaction_id"));
    }

    #[test]
    fn test_parse_rejects_malformed_date() {
        let json = r#"[{ "id": 1, "borrow_date": "2024-01-01", "due_date": "soon" }]"#;
        assert!(parse_loans(json).is_err());
    }

    #[test]
    fn test_is_open() {
        let loan = LoanTransaction::open(1, day(2024, 1, 1), day(2024, 1, 8));
        assert!(loan.is_open());

        let returned = loan.clone().returned(day(2024, 1, 5), 0.0);
        assert!(!returned.is_open());

        let mut inferred = loan;
        inferred.status = None;
        inferred.return_date = Some(day(2024, 1, 5));
        assert!(!inferred.is_open());
    }

    #[test]
    fn test_recorded_fine_ignores_junk() {
        let mut loan = LoanTransaction::open(1, day(2024, 1, 1), day(2024, 1, 8));

        loan.fine_amount = f64::NAN;
        assert_eq!(loan.recorded_fine(), 0);

        loan.fine_amount = -5.0;
        assert_eq!(loan.recorded_fine(), 0);

        loan.fine_amount = 29.6;
        assert_eq!(loan.recorded_fine(), 30);
    }

    #[test]
    fn test_view_overdue_loan() {
        let engine = engine_at(day(2024, 1, 10));
        let loan = LoanTransaction::open(1, day(2024, 1, 1), day(2024, 1, 8)).for_book(9, "Dune");

        let view = LoanView::evaluate(&engine, &loan);

        assert_eq!(view.days_remaining, -2);
        assert_eq!(view.urgency, Some(Urgency::Overdue));
        assert_eq!(view.fine, 20);
        assert_eq!(view.status_line, "⚠️ 2 days overdue");
        assert_eq!(view.due_date, "8 Jan 2024");
    }

    #[test]
    fn test_view_due_soon_loan() {
        let engine = engine_at(day(2024, 1, 7));
        let loan = LoanTransaction::open(1, day(2024, 1, 1), day(2024, 1, 8));

        let view = LoanView::evaluate(&engine, &loan);

        assert_eq!(view.urgency, Some(Urgency::DueSoon));
        assert_eq!(view.fine, 0);
        assert_eq!(view.status_line, "✅ 1 days remaining");
    }

    #[test]
    fn test_view_returned_loan_uses_recorded_fine() {
        let engine = engine_at(day(2024, 2, 1));
        let loan = LoanTransaction::open(1, day(2024, 1, 1), day(2024, 1, 8))
            .returned(day(2024, 1, 9), 10.0);

        let view = LoanView::evaluate(&engine, &loan);

        assert!(!view.open);
        assert_eq!(view.urgency, None);
        assert_eq!(view.fine, 10);
        assert_eq!(view.status_line, "Returned on 9 Jan 2024");
    }

    #[test]
    fn test_load_loans_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loans.json");
        std::fs::write(&path, r#"[{ "id": 1, "borrow_date": "2024-01-01", "due_date": "2024-01-08" }]"#)
            .unwrap();

        let loans = load_loans(&path).unwrap();
        assert_eq!(loans[0].due_date, Some(day(2024, 1, 8)));
    }
}

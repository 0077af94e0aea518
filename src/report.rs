// 📊 Reports - overdue list and dashboard counters for the admin console
//
// Both are recomputed from a loan snapshot on every call. Fines on open loans
// come from the engine; fines on returned loans are the recorded ones.

use crate::clock::Clock;
use crate::engine::LoanPolicyEngine;
use crate::loan::LoanTransaction;
use crate::timestamp::format_date;
use anyhow::{Context as AnyhowContext, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::io::Write;

// ============================================================================
// OVERDUE REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverdueEntry {
    pub loan_id: i64,
    pub student_id: Option<i64>,
    pub student_name: String,
    pub book_title: String,
    pub due_date: String,
    pub days_overdue: u64,
    pub fine: u64,
    #[serde(skip)]
    due_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverdueReport {
    pub entries: Vec<OverdueEntry>,
    pub total_fine: u64,
}

impl OverdueReport {
    /// Open, overdue loans, oldest due date first
    pub fn build<C: Clock>(engine: &LoanPolicyEngine<C>, loans: &[LoanTransaction]) -> Self {
        let mut entries: Vec<OverdueEntry> = loans
            .iter()
            .filter(|loan| loan.is_open() && engine.is_overdue(loan.due_date))
            .map(|loan| OverdueEntry {
                loan_id: loan.id,
                student_id: loan.student_id,
                student_name: loan.student_name.clone().unwrap_or_default(),
                book_title: loan.title().to_string(),
                due_date: format_date(loan.due_date),
                days_overdue: (-engine.days_remaining(loan.due_date)).max(0) as u64,
                fine: engine.compute_fine(loan.due_date),
                due_at: loan.due_date,
            })
            .collect();

        entries.sort_by(|a, b| a.due_at.cmp(&b.due_at).then(a.loan_id.cmp(&b.loan_id)));

        let total_fine = entries.iter().map(|e| e.fine).sum();

        OverdueReport { entries, total_fine }
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the report as CSV (header row included)
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        for entry in &self.entries {
            wtr.serialize(entry).context("Failed to write overdue row")?;
        }

        wtr.flush().context("Failed to flush overdue CSV")?;
        Ok(())
    }
}

// ============================================================================
// DASHBOARD STATS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_transactions: usize,
    pub active_borrows: usize,
    pub overdue_books: usize,
    pub total_fines: u64,
}

impl DashboardStats {
    pub fn build<C: Clock>(engine: &LoanPolicyEngine<C>, loans: &[LoanTransaction]) -> Self {
        let mut stats = DashboardStats {
            total_transactions: loans.len(),
            active_borrows: 0,
            overdue_books: 0,
            total_fines: 0,
        };

        for loan in loans {
            if loan.is_open() {
                stats.active_borrows += 1;
                if engine.is_overdue(loan.due_date) {
                    stats.overdue_books += 1;
                }
                stats.total_fines += engine.compute_fine(loan.due_date);
            } else {
                stats.total_fines += loan.recorded_fine();
            }
        }

        stats
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

    fn snapshot() -> Vec<LoanTransaction> {
        let mut late = LoanTransaction::open(2, day(2024, 1, 3), day(2024, 1, 5))
            .for_student(8)
            .for_book(11, "Emma");
        late.student_name = Some("Ravi".to_string());

        vec![
            LoanTransaction::open(1, day(2024, 1, 1), day(2024, 1, 8))
                .for_student(7)
                .for_book(10, "Dune"),
            late,
            LoanTransaction::open(3, day(2024, 1, 9), day(2024, 1, 16)).for_book(12, "Ulysses"),
            LoanTransaction::open(4, day(2023, 12, 1), day(2023, 12, 8))
                .for_book(13, "Beloved")
                .returned(day(2023, 12, 11), 30.0),
        ]
    }

    #[test]
    fn test_overdue_report_order_and_fines() {
        let engine = engine_at(day(2024, 1, 10));
        let report = OverdueReport::build(&engine, &snapshot());

        assert_eq!(report.count(), 2);
        assert_eq!(report.entries[0].loan_id, 2);
        assert_eq!(report.entries[0].days_overdue, 5);
        assert_eq!(report.entries[0].fine, 50);
        assert_eq!(report.entries[0].student_name, "Ravi");
        assert_eq!(report.entries[1].loan_id, 1);
        assert_eq!(report.entries[1].fine, 20);
        assert_eq!(report.total_fine, 70);
    }

    #[test]
    fn test_overdue_report_empty() {
        let engine = engine_at(day(2024, 1, 2));
        let report = OverdueReport::build(&engine, &snapshot());

        assert!(report.is_empty());
        assert_eq!(report.total_fine, 0);
    }

    #[test]
    fn test_overdue_csv() {
        let engine = engine_at(day(2024, 1, 10));
        let report = OverdueReport::build(&engine, &snapshot());

        let mut buf = Vec::new();
        report.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "loan_id,student_id,student_name,book_title,due_date,days_overdue,fine"
        );
        assert_eq!(lines.next().unwrap(), "2,8,Ravi,Emma,5 Jan 2024,5,50");
        assert_eq!(lines.next().unwrap(), "1,7,,Dune,8 Jan 2024,2,20");
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_dashboard_stats() {
        let engine = engine_at(day(2024, 1, 10));
        let stats = DashboardStats::build(&engine, &snapshot());

        assert_eq!(stats.total_transactions, 4);
        assert_eq!(stats.active_borrows, 3);
        assert_eq!(stats.overdue_books, 2);
        assert_eq!(stats.total_fines, 100);
    }
}

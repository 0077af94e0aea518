use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use loan_policy::{
    parse_timestamp, projected_due_date, timestamp::to_iso, BorrowerStanding, Clock,
    DashboardStats, FixedClock, LoanPolicy, LoanPolicyEngine, LoanView, OverdueReport,
    SystemClock,
};

#[derive(Parser)]
#[command(name = "loan-policy", version, about = "Due dates, fines and borrow eligibility")]
struct Cli {
    /// Policy JSON file (defaults apply when omitted)
    #[arg(long, global = true, env = "LOAN_POLICY_FILE", value_name = "FILE")]
    policy: Option<PathBuf>,

    /// Evaluate as of this timestamp instead of the current time
    #[arg(long, global = true, value_name = "TIMESTAMP")]
    now: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Due date for a loan starting at BORROW_DATE
    DueDate {
        borrow_date: String,
        /// Loan period in days (policy default when omitted)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Fine owed on a loan due at DUE_DATE
    Fine {
        due_date: String,
        /// Fine per overdue day (policy default when omitted)
        #[arg(long)]
        rate: Option<u64>,
    },
    /// Whether a borrower holding ACTIVE open loans may borrow another
    CanBorrow { active: u32 },
    /// Evaluate every loan in a JSON snapshot
    Status {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Open loans past their due date, oldest first
    Overdue {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        csv: bool,
    },
    /// Dashboard counters for a JSON snapshot
    Stats {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Active loans, pending fines and eligibility for one student
    Standing {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        student: i64,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to encode output")?);
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let policy = LoanPolicy::load(cli.policy.as_deref())?;
    // One "now" for the whole command so every row is evaluated at the same instant
    let now = match cli.now.as_deref() {
        Some(raw) => parse_timestamp("--now", raw)?,
        None => SystemClock.now(),
    };
    let engine = LoanPolicyEngine::new(policy, FixedClock(now));

    match cli.cmd {
        Commands::DueDate { borrow_date, days } => {
            let borrow = parse_timestamp("borrow_date", &borrow_date)?;
            let period = days.unwrap_or(engine.policy().loan_period_days);
            let due = projected_due_date(borrow, period)?;

            if cli.json {
                print_json(&serde_json::json!({ "due_date": to_iso(due), "loan_period_days": period }))?;
            } else {
                println!("📅 Due date: {} ({} days)", loan_policy::format_date(Some(due)), period);
            }
        }
        Commands::Fine { due_date, rate } => {
            let due = parse_timestamp("due_date", &due_date)?;
            let rate = rate.unwrap_or(engine.policy().fine_per_day);
            let days = engine.days_remaining(Some(due));
            let fine = engine.compute_fine_at_rate(Some(due), rate);
            let urgency = engine.classify_urgency(days);

            if cli.json {
                print_json(&serde_json::json!({
                    "days_remaining": days,
                    "urgency": urgency,
                    "fine": fine,
                }))?;
            } else {
                println!("⏳ Days remaining: {} ({})", days, urgency);
                println!("💰 Fine: {}", engine.policy().format_amount(fine));
            }
        }
        Commands::CanBorrow { active } => {
            let allowed = engine.can_borrow(active);

            if cli.json {
                print_json(&serde_json::json!({ "can_borrow": allowed }))?;
            } else if allowed {
                println!("✅ May borrow ({}/{} books)", active, engine.policy().max_loans);
            } else {
                println!("🚫 Borrow limit reached ({}/{} books)", active, engine.policy().max_loans);
            }
        }
        Commands::Status { file } => {
            let loans = loan_policy::load_loans(&file)?;
            let views: Vec<LoanView> = loans.iter().map(|l| LoanView::evaluate(&engine, l)).collect();

            if cli.json {
                print_json(&views)?;
            } else {
                for view in &views {
                    println!("📖 #{} {} (due {})", view.id, view.title, view.due_date);
                    println!("   {}", view.status_line);
                    if view.fine > 0 {
                        println!("   💰 Fine: {}", engine.policy().format_amount(view.fine));
                    }
                }
                println!("\n✓ {} loans evaluated", views.len());
            }
        }
        Commands::Overdue { file, csv } => {
            let loans = loan_policy::load_loans(&file)?;
            let report = OverdueReport::build(&engine, &loans);

            if csv {
                report.write_csv(std::io::stdout().lock())?;
            } else if cli.json {
                print_json(&report)?;
            } else if report.is_empty() {
                println!("🎉 No overdue books! All books returned on time.");
            } else {
                for entry in &report.entries {
                    println!(
                        "⚠️  #{} {} - {} ({} days overdue, {})",
                        entry.loan_id,
                        entry.book_title,
                        entry.student_name,
                        entry.days_overdue,
                        engine.policy().format_amount(entry.fine),
                    );
                }
                println!(
                    "\n{} overdue, {} in fines",
                    report.count(),
                    engine.policy().format_amount(report.total_fine)
                );
            }
        }
        Commands::Stats { file } => {
            let loans = loan_policy::load_loans(&file)?;
            let stats = DashboardStats::build(&engine, &loans);

            if cli.json {
                print_json(&stats)?;
            } else {
                println!("📊 Transactions: {}", stats.total_transactions);
                println!("📚 Active borrows: {}", stats.active_borrows);
                println!("⚠️  Overdue: {}", stats.overdue_books);
                println!("💰 Total fines: {}", engine.policy().format_amount(stats.total_fines));
            }
        }
        Commands::Standing { file, student } => {
            let loans = loan_policy::load_loans(&file)?;
            let standing = BorrowerStanding::for_student(&engine, &loans, student);
            let allowed = engine.can_borrow(standing.active_loan_count);

            if cli.json {
                print_json(&serde_json::json!({
                    "standing": standing,
                    "can_borrow": allowed,
                }))?;
            } else {
                println!(
                    "🎓 Student {}: {}/{} books ({} overdue), pending fines {}",
                    student,
                    standing.active_loan_count,
                    engine.policy().max_loans,
                    standing.overdue_loan_count,
                    engine.policy().format_amount(standing.pending_fine_total),
                );
                println!("   {}", if allowed { "✅ May borrow" } else { "🚫 Borrow limit reached" });
            }
        }
    }

    Ok(())
}

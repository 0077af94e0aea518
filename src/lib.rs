// Loan Policy - Core Library
// Due dates, fines and borrow eligibility for the library desk, plus the
// session and form plumbing the consoles share

pub mod clock;
pub mod engine;
pub mod error;
pub mod forms;
pub mod loan;
pub mod policy;
pub mod report;
pub mod session;
pub mod standing;
pub mod timestamp;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{
    can_borrow, days_between, projected_due_date,
    LoanPolicyEngine, Urgency,
};
pub use error::{LoanError, PolicyViolation, ValidationError};
pub use forms::{
    BookForm, Credentials, FieldErrors, FormOutcome, LoginForm, NewBook,
    Registration, RegistrationForm,
};
pub use loan::{load_loans, parse_loans, LoanStatus, LoanTransaction, LoanView};
pub use policy::LoanPolicy;
pub use report::{DashboardStats, OverdueEntry, OverdueReport};
pub use session::{Role, Session, SessionStore, SessionUser};
pub use standing::{
    check_borrow, settle_return,
    BookAvailability, BorrowerStanding, ReturnSettlement,
};
pub use timestamp::{format_date, parse_timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

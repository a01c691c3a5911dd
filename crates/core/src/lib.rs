pub mod analytics;
pub mod config;
pub mod domain;
pub mod errors;
pub mod intake;

pub use analytics::{summarize, ObjectionTrend, ShiftSummary, StageCount, OBJECTION_TRENDS};
pub use domain::host::{Host, HostRole};
pub use domain::inventory::InventoryModel;
pub use domain::visit::{NewVisit, Visit, VisitId, VisitPhoto, VisitStage, VisitWithVisitor};
pub use domain::visitor::{NewVisitor, Visitor, VisitorId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use intake::{parse_budget_bucket, BudgetRange, IntakeForm, ValidatedIntake};

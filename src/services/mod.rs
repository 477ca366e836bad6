pub mod checkpoint_store;
pub mod failure_classifier;
pub mod personnel_allocator;
pub mod report_writer;

pub use checkpoint_store::{CheckpointStore, CompletionLedger};
pub use failure_classifier::{classify_error, classify_rejection, FailureKind, FailureReason};
pub use personnel_allocator::{Assignment, NotAvailable, PersonnelAllocator, RoleStats};
pub use report_writer::ReportWriter;

// Models module - domain entity representations

pub mod pass;

pub use pass::{IssuePassRequest, VisitorPass};

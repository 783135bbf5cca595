//! Project-scoped issues.
//!
//! Issues are created, listed, updated and deleted through a single resource,
//! `/api/issues/{project}`. The project always comes from the path.

pub mod error;
pub mod models;
pub mod repository;
pub mod urls;
pub mod views;

pub use error::{IssueError, IssueResult};
pub use models::{Issue, IssueFilter, IssueResponse, IssueUpdate, NewIssue};
pub use repository::{DeleteOutcome, IssueRepository, UpdateOutcome};
pub use urls::url_patterns;
pub use views::IssueHandler;

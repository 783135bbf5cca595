use std::sync::Arc;

use super::repository::IssueRepository;
use super::views::IssueHandler;
use crate::urls::Router;

/// Mount point of the issues resource.
pub const ISSUES_PATTERN: &str = "/api/issues/{project}";

/// Router serving the issues resource from `repository`.
pub fn url_patterns(repository: IssueRepository) -> Result<Router, String> {
	Router::new().route(ISSUES_PATTERN, Arc::new(IssueHandler::new(repository)))
}

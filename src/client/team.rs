//! Team roster used for mention resolution.

use super::{ApiClient, ApiError};
use crate::models::TeamMember;

/// Preferred roster endpoint
const MENTIONS_ROSTER_PATH: &str = "/api/team/mentions";

/// Older deployments only expose the chat roster
const CHAT_ROSTER_PATH: &str = "/api/chat/team-members";

impl ApiClient {
    /// Fetch the team roster, falling back to the chat roster when the
    /// mentions endpoint does not exist.
    pub async fn team_members(&self) -> Result<Vec<TeamMember>, ApiError> {
        match self.get_json(MENTIONS_ROSTER_PATH).await {
            Err(e) if e.is_not_found() => {
                tracing::debug!("mentions roster missing, using chat roster");
                self.get_json(CHAT_ROSTER_PATH).await
            }
            other => other,
        }
    }
}

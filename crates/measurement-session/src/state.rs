use crate::{SessionStatus, VisitorStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Persisted snapshot of a [`SessionManager`](crate::SessionManager).
///
/// Restoring a manager from a snapshot and taking a new snapshot yields an
/// identical value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub visitor_id: Uuid,
    pub first_visit_at: DateTime<Utc>,
    pub session_started_at: DateTime<Utc>,
    pub session_number: u32,
    pub session_hit_count: u64,
    #[serde(default)]
    pub previous_session_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_activity_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub referrer: Option<Url>,
    pub session_status: SessionStatus,
    pub visitor_status: VisitorStatus,
}

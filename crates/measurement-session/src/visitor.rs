use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single application install.
///
/// Identity and first-visit time are fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visitor {
    id: Uuid,
    first_visit_at: DateTime<Utc>,
}

impl Visitor {
    /// Create a visitor with a fresh random id, first seen now.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4(), Utc::now())
    }

    /// Rebuild a visitor from persisted values.
    pub fn with_id(id: Uuid, first_visit_at: DateTime<Utc>) -> Self {
        Self { id, first_visit_at }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn first_visit_at(&self) -> DateTime<Utc> {
        self.first_visit_at
    }
}

impl Default for Visitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether hits from this visitor are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitorStatus {
    Active,
    /// The user asked not to be tracked.
    OptedOut,
    /// Excluded by the sampling draw. Permanent for this visitor.
    SampledOut,
}

impl VisitorStatus {
    pub fn is_active(self) -> bool {
        self == VisitorStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_visitors_get_distinct_ids() {
        let a = Visitor::new();
        let b = Visitor::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn with_id_preserves_values() {
        let id = Uuid::new_v4();
        let first = Utc::now() - chrono::Duration::days(3);
        let visitor = Visitor::with_id(id, first);
        assert_eq!(visitor.id(), id);
        assert_eq!(visitor.first_visit_at(), first);
    }

    #[test]
    fn visitor_status_serializes_snake_case() {
        let json = serde_json::to_string(&VisitorStatus::SampledOut).unwrap();
        assert_eq!(json, "\"sampled_out\"");
        assert!(VisitorStatus::Active.is_active());
        assert!(!VisitorStatus::OptedOut.is_active());
    }
}

//! Append-only audit trail of resource mutations.

use std::sync::Arc;

use automation_sdk::models::ActivityRecord;
use chrono::Utc;
use conductor_security::SecurityContext;
use uuid::Uuid;

use super::fields::Fields;
use super::repo::{Collection, Filter};

#[derive(Clone)]
pub struct ActivityRecorder {
    activity: Arc<dyn Collection<ActivityRecord>>,
}

impl ActivityRecorder {
    #[must_use]
    pub fn new(activity: Arc<dyn Collection<ActivityRecord>>) -> Self {
        Self { activity }
    }

    /// Append one record. A storage failure is logged and swallowed.
    pub async fn record(
        &self,
        ctx: &SecurityContext,
        object_id: Uuid,
        object_type: &str,
        description: impl Into<String>,
    ) {
        let entry = ActivityRecord {
            id: Uuid::new_v4(),
            actor_id: ctx.subject_id(),
            object_id,
            object_type: object_type.to_owned(),
            description: description.into(),
            created: Utc::now(),
        };
        if let Err(e) = self.activity.insert(entry).await {
            tracing::error!(%object_id, object_type, error = %e, "failed to record activity");
        }
    }

    /// Filter selecting the stream of one object.
    #[must_use]
    pub fn for_object(object_id: Uuid, object_type: &'static str) -> Filter {
        Filter::new()
            .equals(Fields::OBJECT_ID, object_id)
            .equals(Fields::OBJECT_TYPE, object_type)
    }
}

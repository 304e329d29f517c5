//! Wire types for the labs endpoints.
//!
//! Stored records map to wire shapes through plain functions; download URLs
//! and timestamps are computed here and nowhere else.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::storage::{LabTaskRecord, TopicRecord};

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct TopicOut {
    pub id: i64,
    pub name: String,
    pub description: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct LabTaskOut {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub topic_id: i64,
    pub file_url: Option<String>,
    pub solution_file_url: Option<String>,
    pub created_at: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CreateLabTaskRequest {
    pub title: String,
    pub description: String,
    pub topic_id: i64,
}

/// Map a stored topic to its wire shape.
pub(super) fn topic_out(record: &TopicRecord) -> TopicOut {
    TopicOut {
        id: record.id,
        name: record.name.clone(),
        description: record.description.clone(),
    }
}

/// Map a stored task to its wire shape.
///
/// Attachment URLs point back at this service's download routes; clients
/// never see storage paths.
pub(super) fn task_out(record: &LabTaskRecord) -> LabTaskOut {
    LabTaskOut {
        id: record.id,
        title: record.title.clone(),
        description: record.description.clone(),
        topic_id: record.topic_id,
        file_url: record
            .file_path
            .as_ref()
            .map(|_| format!("/tasks/{}/download", record.id)),
        solution_file_url: record
            .solution_file_path
            .as_ref()
            .map(|_| format!("/tasks/{}/download-solution", record.id)),
        created_at: rfc3339(record.created_at),
    }
}

fn rfc3339(unix_seconds: i64) -> String {
    DateTime::from_timestamp(unix_seconds, 0)
        .map(|datetime| datetime.to_rfc3339())
        .unwrap_or_default()
}

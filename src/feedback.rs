use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::Database;

pub const FEEDBACK_COLLECTION: &str = "feedback";

/// Free-text user feedback. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub feedback: String,
}

pub async fn record_feedback(db: &Database, feedback: &str) -> Result<()> {
    db.insert_one(
        FEEDBACK_COLLECTION,
        &FeedbackRecord {
            feedback: feedback.to_string(),
        },
    )
    .await
}

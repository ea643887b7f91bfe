//! Comment model
//!
//! Table: comments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tb_core::traits::{CompanyScoped, Entity, Id, Identifiable, Timestamped};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Comment {
    pub id: Id,

    /// Comment body; the column is named `comment`
    #[serde(rename = "comment")]
    #[validate(length(min = 1))]
    pub text: String,

    pub created_at: DateTime<Utc>,

    /// Author user id; the column is named `commentor`
    #[serde(rename = "commentor")]
    pub author_id: Id,

    pub task_id: Id,

    pub company_id: Id,
}

impl Identifiable for Comment {
    fn id(&self) -> Id {
        self.id
    }
}

impl Timestamped for Comment {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }
}

impl CompanyScoped for Comment {
    fn company_id(&self) -> Id {
        self.company_id
    }
}

impl Entity for Comment {
    const TABLE_NAME: &'static str = "comments";
    const TYPE_NAME: &'static str = "Comment";
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_backend_column_names() {
        let json = serde_json::json!({
            "id": Uuid::from_u128(7),
            "comment": "Looks good",
            "created_at": "2024-04-02T09:00:00Z",
            "commentor": Uuid::from_u128(3),
            "task_id": Uuid::from_u128(1),
            "company_id": Uuid::from_u128(9),
        });
        let comment: Comment = serde_json::from_value(json).unwrap();
        assert_eq!(comment.text, "Looks good");
        assert_eq!(comment.author_id, Uuid::from_u128(3));

        let back = serde_json::to_value(&comment).unwrap();
        assert_eq!(back["comment"], "Looks good");
    }
}

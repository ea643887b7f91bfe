//! Comment service

use std::sync::Arc;

use tb_contracts::{Contract, CreateCommentContract};
use tb_db::TaskWriter;
use tb_models::{Comment, NewComment};

use crate::error::WriteError;
use crate::realtime::{ChangeEvent, ChangeFeed, ChangeKind, ChangeTable};

pub struct CommentService<W: TaskWriter + ?Sized> {
    writer: Arc<W>,
    feed: Option<ChangeFeed>,
}

impl<W: TaskWriter + ?Sized> CommentService<W> {
    pub fn new(writer: Arc<W>) -> Self {
        Self { writer, feed: None }
    }

    pub fn with_feed(mut self, feed: ChangeFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Validate and insert a comment
    pub async fn add_comment(&self, comment: NewComment) -> Result<Comment, WriteError> {
        CreateCommentContract::new().validate(&comment)?;

        let saved = self
            .writer
            .insert_comment(&comment)
            .await
            .map_err(WriteError::backend("add comment"))?;

        tracing::info!(comment_id = %saved.id, task_id = %saved.task_id, "Comment added");

        if let Some(feed) = &self.feed {
            feed.publish(
                ChangeEvent::new(ChangeTable::Comments, ChangeKind::Insert, saved.company_id)
                    .with_record(&saved),
            );
        }
        Ok(saved)
    }
}

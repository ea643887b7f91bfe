//! Tag management service
//!
//! Creates, renames and deletes a company's tags. Deleting a tag also drops
//! its task links, so listeners strip it from their tag index.

use std::sync::Arc;

use tb_contracts::{Contract, SaveTagContract};
use tb_core::traits::Id;
use tb_db::TaskWriter;
use tb_models::{Tag, TagDraft};

use crate::error::WriteError;
use crate::realtime::{ChangeEvent, ChangeFeed, ChangeKind, ChangeTable};

pub struct TagService<W: TaskWriter + ?Sized> {
    writer: Arc<W>,
    feed: Option<ChangeFeed>,
}

impl<W: TaskWriter + ?Sized> TagService<W> {
    pub fn new(writer: Arc<W>) -> Self {
        Self { writer, feed: None }
    }

    pub fn with_feed(mut self, feed: ChangeFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Validate and create or update a tag
    pub async fn save(&self, draft: TagDraft) -> Result<Tag, WriteError> {
        SaveTagContract::new().validate(&draft)?;

        let created = draft.id.is_none();
        let tag = self
            .writer
            .save_tag(&draft)
            .await
            .map_err(WriteError::backend("save tag"))?;

        tracing::info!(tag_id = %tag.id, company_id = %tag.company_id, created, "Tag saved");

        let kind = if created {
            ChangeKind::Insert
        } else {
            ChangeKind::Update
        };
        self.publish(ChangeEvent::new(ChangeTable::Tags, kind, tag.company_id).with_record(&tag));
        Ok(tag)
    }

    pub async fn delete(&self, company_id: Id, tag_id: Id) -> Result<(), WriteError> {
        self.writer
            .delete_tag(company_id, tag_id)
            .await
            .map_err(WriteError::backend("delete tag"))?;

        tracing::info!(%tag_id, %company_id, "Tag deleted");

        self.publish(
            ChangeEvent::new(ChangeTable::Tags, ChangeKind::Delete, company_id)
                .with_record(&serde_json::json!({ "id": tag_id })),
        );
        Ok(())
    }

    fn publish(&self, event: ChangeEvent) {
        if let Some(feed) = &self.feed {
            feed.publish(event);
        }
    }
}

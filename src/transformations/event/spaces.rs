use async_trait::async_trait;

use crate::decoding::events::{SpaceCreatedData, SpaceUpdatedData};
use crate::decoding::{EventData, LogicalEvent, ParsedEvent};
use crate::transformations::activity::ActivityParams;
use crate::transformations::content::{ContentSection, SpaceContent};
use crate::transformations::fanout::FanOut;
use crate::transformations::registry::TransformationRegistry;
use crate::transformations::traits::TransformationHandler;
use crate::transformations::util::effects::emit;
use crate::transformations::util::entities::{ensure_account, require_space};
use crate::transformations::util::follows::follow_space;
use crate::transformations::{TransformationContext, TransformationError};
use crate::types::entities::Space;
use crate::types::EventName;

pub struct SpacesHandler;

fn apply_content(space: &mut Space, content: SpaceContent) {
    space.summary = content.summary();
    space.name = content.name;
    space.about = content.about;
    space.image = content.image;
    space.email = content.email;
    space.tags = content.tags;
    space.links = content.links;
}

fn clear_content(space: &mut Space) {
    apply_content(space, SpaceContent::default());
    space.content = None;
}

impl SpacesHandler {
    async fn created(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
        data: &SpaceCreatedData,
    ) -> Result<(), TransformationError> {
        let meta = &event.metadata;
        ensure_account(ctx, &data.account_id, meta).await?;
        let owner_id = data.owner_id.as_deref().unwrap_or(&data.account_id);
        let mut owner = ensure_account(ctx, owner_id, meta).await?;

        let mut space = Space {
            id: data.space_id.clone(),
            created_by_account_id: data.account_id.clone(),
            owned_by_account_id: owner.id.clone(),
            created_at_block: meta.block_number,
            created_at_time: Some(meta.timestamp),
            hidden: data.hidden,
            content: data.content_cid.clone(),
            permissions: data.permissions.clone(),
            ..Default::default()
        };
        if let Some(cid) = &data.content_cid {
            if let Some(content) = ctx.content::<SpaceContent>(ContentSection::Space, cid, meta).await? {
                apply_content(&mut space, content);
            }
        }

        follow_space(ctx, &mut owner, &mut space).await?;
        ctx.store.save(&owner).await?;
        ctx.store.save(&space).await?;
        ctx.indexing.add_space(&space);

        let params = ActivityParams {
            space_id: Some(space.id.clone()),
            ..ActivityParams::new(EventName::SpaceCreated, meta, &data.account_id)
        };
        emit(
            ctx,
            params,
            FanOut {
                space: Some(&space),
                ..Default::default()
            },
        )
        .await?;
        Ok(())
    }

    async fn updated(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
        data: &SpaceUpdatedData,
    ) -> Result<(), TransformationError> {
        let meta = &event.metadata;
        let mut space = require_space(ctx, &data.space_id, "SpaceUpdated").await?;

        match &data.content_cid {
            Some(Some(cid)) => {
                space.content = Some(cid.clone());
                if let Some(content) = ctx.content::<SpaceContent>(ContentSection::Space, cid, meta).await? {
                    apply_content(&mut space, content);
                }
            }
            Some(None) => clear_content(&mut space),
            None => {}
        }
        if let Some(hidden) = data.hidden {
            space.hidden = hidden;
        }
        if let Some(permissions) = &data.permissions {
            space.permissions = permissions.clone().unwrap_or_default();
        }
        space.updated_at_time = Some(meta.timestamp);

        ctx.store.save(&space).await?;
        ctx.indexing.add_space(&space);

        let params = ActivityParams {
            space_id: Some(space.id.clone()),
            ..ActivityParams::new(EventName::SpaceUpdated, meta, &data.account_id)
        };
        emit(
            ctx,
            params,
            FanOut {
                space: Some(&space),
                ..Default::default()
            },
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TransformationHandler for SpacesHandler {
    fn name(&self) -> &'static str {
        "Spaces"
    }

    fn triggers(&self) -> &'static [LogicalEvent] {
        &[LogicalEvent::SpaceCreated, LogicalEvent::SpaceUpdated]
    }

    async fn handle(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
    ) -> Result<(), TransformationError> {
        match &event.data {
            EventData::SpaceCreated(data) => self.created(ctx, event, data).await,
            EventData::SpaceUpdated(data) => self.updated(ctx, event, data).await,
            _ => Err(TransformationError::unexpected(self.name(), event)),
        }
    }
}

pub fn register_handlers(registry: &mut TransformationRegistry) {
    registry.register_handler(SpacesHandler);
}

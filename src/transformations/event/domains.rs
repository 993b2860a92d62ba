use async_trait::async_trait;

use crate::db::Filter;
use crate::decoding::{EventData, InnerValue, LogicalEvent, ParsedEvent};
use crate::transformations::activity::ActivityParams;
use crate::transformations::fanout::FanOut;
use crate::transformations::registry::TransformationRegistry;
use crate::transformations::traits::TransformationHandler;
use crate::transformations::util::effects::emit;
use crate::transformations::util::entities::ensure_account;
use crate::transformations::{TransformationContext, TransformationError};
use crate::types::entities::Space;
use crate::types::EventName;

pub struct DomainsHandler;

impl DomainsHandler {
    /// Point `domain` at `space_id`, detaching it from any space that
    /// carried it before.
    async fn bind_space(
        &self,
        ctx: &TransformationContext<'_>,
        domain: &str,
        space_id: Option<&str>,
    ) -> Result<(), TransformationError> {
        let holders = ctx.store.find::<Space>(&Filter::eq("username", domain)).await?;
        for mut space in holders {
            if Some(space.id.as_str()) == space_id {
                continue;
            }
            space.username = None;
            ctx.store.save(&space).await?;
            ctx.indexing.add_space(&space);
        }

        let Some(space_id) = space_id else {
            return Ok(());
        };
        match ctx.store.get::<Space>(space_id).await? {
            Some(mut space) => {
                if space.username.as_deref() != Some(domain) {
                    space.username = Some(domain.to_string());
                    ctx.store.save(&space).await?;
                    ctx.indexing.add_space(&space);
                }
            }
            None => tracing::warn!("Domain {} points at unknown space {}", domain, space_id),
        }
        Ok(())
    }
}

#[async_trait]
impl TransformationHandler for DomainsHandler {
    fn name(&self) -> &'static str {
        "Domains"
    }

    fn triggers(&self) -> &'static [LogicalEvent] {
        &[LogicalEvent::DomainRegistered, LogicalEvent::DomainMetaUpdated]
    }

    async fn handle(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
    ) -> Result<(), TransformationError> {
        let meta = &event.metadata;
        let (name, account_id, domain) = match &event.data {
            EventData::DomainRegistered(data) => {
                let stored = ctx.storage.domain_meta(ctx.chain, &meta.block_hash, &data.domain);
                let owner_id = stored
                    .as_ref()
                    .map(|m| m.owner.clone())
                    .unwrap_or_else(|| data.owner().to_string());

                let mut owner = ensure_account(ctx, &owner_id, meta).await?;
                if owner.add_username(&data.domain) {
                    owner.updated_at_time = Some(meta.timestamp);
                    ctx.store.save(&owner).await?;
                }
                if let Some(InnerValue::Space(space_id)) = stored.and_then(|m| m.inner_value) {
                    self.bind_space(ctx, &data.domain, Some(&space_id)).await?;
                }
                (EventName::DomainRegistered, owner_id, &data.domain)
            }
            EventData::DomainMetaUpdated(data) => {
                let Some(stored) = ctx.storage.domain_meta(ctx.chain, &meta.block_hash, &data.domain)
                else {
                    tracing::warn!(
                        "No domain meta for {} at block {}",
                        data.domain,
                        meta.block_number
                    );
                    return Ok(());
                };
                let space_id = match &stored.inner_value {
                    Some(InnerValue::Space(id)) => Some(id.as_str()),
                    _ => None,
                };
                self.bind_space(ctx, &data.domain, space_id).await?;
                ensure_account(ctx, &data.who, meta).await?;
                (EventName::DomainMetaUpdated, data.who.clone(), &data.domain)
            }
            _ => return Err(TransformationError::unexpected(self.name(), event)),
        };

        let params = ActivityParams {
            username: Some(domain.clone()),
            ..ActivityParams::new(name, meta, &account_id)
        };
        emit(ctx, params, FanOut::default()).await?;
        Ok(())
    }
}

pub fn register_handlers(registry: &mut TransformationRegistry) {
    registry.register_handler(DomainsHandler);
}

//! Two-phase ownership transfers of spaces, posts and domains. Only the
//! accept phase changes ownership; create and reject record intent.

use async_trait::async_trait;

use crate::db::Filter;
use crate::decoding::events::OwnershipData;
use crate::decoding::{EventData, LogicalEvent, OwnableEntity, ParsedEvent};
use crate::transformations::activity::ActivityParams;
use crate::transformations::fanout::FanOut;
use crate::transformations::registry::TransformationRegistry;
use crate::transformations::traits::TransformationHandler;
use crate::transformations::util::effects::emit;
use crate::transformations::util::entities::{ensure_account, require_post, require_space};
use crate::transformations::util::{decrement, increment};
use crate::transformations::{TransformationContext, TransformationError};
use crate::types::entities::{Account, Post, Space};
use crate::types::EventName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Accepted,
    Rejected,
}

fn event_name(entity: OwnableEntity, phase: Phase) -> EventName {
    use EventName::*;

    match (entity, phase) {
        (OwnableEntity::Space, Phase::Created) => SpaceOwnershipTransferCreated,
        (OwnableEntity::Space, Phase::Accepted) => SpaceOwnershipTransferAccepted,
        (OwnableEntity::Space, Phase::Rejected) => SpaceOwnershipTransferRejected,
        (OwnableEntity::Post, Phase::Created) => PostOwnershipTransferCreated,
        (OwnableEntity::Post, Phase::Accepted) => PostOwnershipTransferAccepted,
        (OwnableEntity::Post, Phase::Rejected) => PostOwnershipTransferRejected,
        (OwnableEntity::Domain, Phase::Created) => DomainOwnershipTransferCreated,
        (OwnableEntity::Domain, Phase::Accepted) => DomainOwnershipTransferAccepted,
        (OwnableEntity::Domain, Phase::Rejected) => DomainOwnershipTransferRejected,
    }
}

/// Entity being transferred, loaded before any change.
enum Subject {
    Space(Space),
    Post(Post),
    Domain { owner: Option<Account> },
}

impl Subject {
    fn owner_id(&self) -> Option<&str> {
        match self {
            Subject::Space(space) => Some(&space.owned_by_account_id),
            Subject::Post(post) => Some(&post.owned_by_account_id),
            Subject::Domain { owner } => owner.as_ref().map(|a| a.id.as_str()),
        }
    }
}

pub struct OwnershipHandler;

impl OwnershipHandler {
    async fn load(
        &self,
        ctx: &TransformationContext<'_>,
        data: &OwnershipData,
        context: &str,
    ) -> Result<Subject, TransformationError> {
        Ok(match data.entity {
            OwnableEntity::Space => Subject::Space(require_space(ctx, &data.entity_id, context).await?),
            OwnableEntity::Post => Subject::Post(require_post(ctx, &data.entity_id, context).await?),
            OwnableEntity::Domain => {
                let owners = ctx
                    .store
                    .find::<Account>(&Filter::contains("usernames", data.entity_id.as_str()))
                    .await?;
                Subject::Domain {
                    owner: owners.into_iter().next(),
                }
            }
        })
    }

    /// Hand `subject` over to `new_owner`.
    async fn accept(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
        data: &OwnershipData,
        subject: &mut Subject,
        new_owner: &mut Account,
    ) -> Result<(), TransformationError> {
        let meta = &event.metadata;
        match subject {
            Subject::Space(space) => {
                space.owned_by_account_id = new_owner.id.clone();
                space.updated_at_time = Some(meta.timestamp);
                ctx.store.save(&*space).await?;
                ctx.indexing.add_space(space);
            }
            Subject::Post(post) => {
                if post.owned_by_account_id != new_owner.id {
                    let mut previous = ensure_account(ctx, &post.owned_by_account_id, meta).await?;
                    decrement(&mut previous.owned_posts_count);
                    ctx.store.save(&previous).await?;
                    increment(&mut new_owner.owned_posts_count);
                }
                post.owned_by_account_id = new_owner.id.clone();
                post.updated_at_time = Some(meta.timestamp);
                ctx.store.save(&*post).await?;
                ctx.indexing.add_post(post);
            }
            Subject::Domain { owner } => {
                if let Some(previous) = owner.as_mut().filter(|a| a.id != new_owner.id) {
                    previous.remove_username(&data.entity_id);
                    previous.updated_at_time = Some(meta.timestamp);
                    ctx.store.save(&*previous).await?;
                }
                new_owner.add_username(&data.entity_id);
            }
        }
        new_owner.updated_at_time = Some(meta.timestamp);
        ctx.store.save(&*new_owner).await?;
        Ok(())
    }
}

#[async_trait]
impl TransformationHandler for OwnershipHandler {
    fn name(&self) -> &'static str {
        "Ownership"
    }

    fn triggers(&self) -> &'static [LogicalEvent] {
        &[
            LogicalEvent::OwnershipTransferCreated,
            LogicalEvent::OwnershipTransferAccepted,
            LogicalEvent::OwnershipTransferRejected,
        ]
    }

    async fn handle(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
    ) -> Result<(), TransformationError> {
        let EventData::Ownership(data) = &event.data else {
            return Err(TransformationError::unexpected(self.name(), event));
        };
        let meta = &event.metadata;
        let phase = match meta.name {
            LogicalEvent::OwnershipTransferCreated => Phase::Created,
            LogicalEvent::OwnershipTransferAccepted => Phase::Accepted,
            LogicalEvent::OwnershipTransferRejected => Phase::Rejected,
            _ => return Err(TransformationError::unexpected(self.name(), event)),
        };

        let mut initiator = ensure_account(ctx, &data.account_id, meta).await?;
        let mut subject = self.load(ctx, data, meta.name.as_str()).await?;
        let current_owner = subject.owner_id().map(String::from);

        let (old_owner_id, new_owner_id) = match phase {
            Phase::Created => {
                if let Some(new_owner) = &data.new_owner_id {
                    ensure_account(ctx, new_owner, meta).await?;
                }
                (
                    current_owner.or_else(|| Some(data.account_id.clone())),
                    data.new_owner_id.clone(),
                )
            }
            Phase::Accepted => {
                self.accept(ctx, event, data, &mut subject, &mut initiator).await?;
                (current_owner, Some(data.account_id.clone()))
            }
            Phase::Rejected => {
                let new_owner = Some(data.account_id.clone()).filter(|a| Some(a) != current_owner.as_ref());
                (current_owner, new_owner)
            }
        };

        let name = event_name(data.entity, phase);
        let mut params = ActivityParams {
            old_owner_id: old_owner_id.clone(),
            new_owner_id: new_owner_id.clone(),
            ..ActivityParams::new(name, meta, &data.account_id)
        };
        let (space, post) = match &subject {
            Subject::Space(space) => {
                params.space_id = Some(space.id.clone());
                (Some(space), None)
            }
            Subject::Post(post) => {
                params.post_id = Some(post.id.clone());
                params.space_id = post.space_id.clone();
                (None, Some(post))
            }
            Subject::Domain { .. } => {
                params.username = Some(data.entity_id.clone());
                (None, None)
            }
        };

        emit(
            ctx,
            params,
            FanOut {
                space,
                post,
                old_owner_id: old_owner_id.as_deref(),
                new_owner_id: new_owner_id.as_deref(),
                ..Default::default()
            },
        )
        .await?;
        Ok(())
    }
}

pub fn register_handlers(registry: &mut TransformationRegistry) {
    registry.register_handler(OwnershipHandler);
}

//! Entity lookups used across handlers.

use crate::decoding::EventMetadata;
use crate::transformations::{TransformationContext, TransformationError};
use crate::types::entities::{Account, Post, Space};

/// Load an account, creating it at the event's block if unseen. New
/// accounts are saved before returning.
pub async fn ensure_account(
    ctx: &TransformationContext<'_>,
    id: &str,
    metadata: &EventMetadata,
) -> Result<Account, TransformationError> {
    if let Some(account) = ctx.store.get::<Account>(id).await? {
        return Ok(account);
    }
    let account = Account {
        created_at_block: Some(metadata.block_number),
        created_at_time: Some(metadata.timestamp),
        ..Account::new(id)
    };
    ctx.store.save(&account).await?;
    Ok(account)
}

pub async fn require_post(
    ctx: &TransformationContext<'_>,
    id: &str,
    context: &str,
) -> Result<Post, TransformationError> {
    ctx.require::<Post>("Post", id, context).await
}

pub async fn require_space(
    ctx: &TransformationContext<'_>,
    id: &str,
    context: &str,
) -> Result<Space, TransformationError> {
    ctx.require::<Space>("Space", id, context).await
}

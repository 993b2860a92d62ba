use alloy_primitives::Address;
use async_trait::async_trait;

use crate::decoding::events::EvmLinkData;
use crate::decoding::{EventData, LogicalEvent, ParsedEvent};
use crate::transformations::activity::ActivityParams;
use crate::transformations::fanout::FanOut;
use crate::transformations::registry::TransformationRegistry;
use crate::transformations::traits::TransformationHandler;
use crate::transformations::util::effects::emit;
use crate::transformations::util::entities::ensure_account;
use crate::transformations::{TransformationContext, TransformationError};
use crate::types::entities::{EvmAccount, EvmSubstrateAccountLink};
use crate::types::EventName;

pub struct EvmAccountsHandler;

/// EIP-55 form of an address.
pub fn checksum_address(raw: &str) -> Result<String, TransformationError> {
    let address: Address = raw
        .parse()
        .map_err(|e| TransformationError::handler("EvmAccounts", format!("bad address {}: {}", raw, e)))?;
    Ok(address.to_checksum(None))
}

impl EvmAccountsHandler {
    async fn linked(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
        data: &EvmLinkData,
    ) -> Result<(), TransformationError> {
        let meta = &event.metadata;
        let evm_address = checksum_address(&data.evm_address)?;
        ensure_account(ctx, &data.substrate_account, meta).await?;

        if !ctx.store.exists::<EvmAccount>(&evm_address).await? {
            ctx.store
                .save(&EvmAccount {
                    id: evm_address.clone(),
                    created_at_block: meta.block_number,
                    created_at_time: Some(meta.timestamp),
                })
                .await?;
        }

        let link_id = EvmSubstrateAccountLink::id_for(&evm_address, &data.substrate_account);
        let link = match ctx.store.get::<EvmSubstrateAccountLink>(&link_id).await? {
            Some(existing) => EvmSubstrateAccountLink {
                active: true,
                ..existing
            },
            None => EvmSubstrateAccountLink {
                id: link_id,
                evm_account_id: evm_address,
                substrate_account_id: data.substrate_account.clone(),
                active: true,
                created_at_block: meta.block_number,
                created_at_time: Some(meta.timestamp),
            },
        };
        ctx.store.save(&link).await?;

        let params = ActivityParams::new(EventName::EvmAddressLinkedToAccount, meta, &data.substrate_account);
        emit(ctx, params, FanOut::default()).await?;
        Ok(())
    }

    async fn unlinked(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
        data: &EvmLinkData,
    ) -> Result<(), TransformationError> {
        let meta = &event.metadata;
        let evm_address = checksum_address(&data.evm_address)?;
        let link_id = EvmSubstrateAccountLink::id_for(&evm_address, &data.substrate_account);

        match ctx.store.get::<EvmSubstrateAccountLink>(&link_id).await? {
            Some(mut link) => {
                link.active = false;
                ctx.store.save(&link).await?;
            }
            None => tracing::warn!("Unlink of unknown EVM link {}", link_id),
        }

        let params = ActivityParams::new(EventName::EvmAddressUnlinkedFromAccount, meta, &data.substrate_account);
        emit(ctx, params, FanOut::default()).await?;
        Ok(())
    }
}

#[async_trait]
impl TransformationHandler for EvmAccountsHandler {
    fn name(&self) -> &'static str {
        "EvmAccounts"
    }

    fn triggers(&self) -> &'static [LogicalEvent] {
        &[
            LogicalEvent::EvmAddressLinkedToAccount,
            LogicalEvent::EvmAddressUnlinkedFromAccount,
        ]
    }

    async fn handle(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
    ) -> Result<(), TransformationError> {
        match (&event.metadata.name, &event.data) {
            (LogicalEvent::EvmAddressLinkedToAccount, EventData::EvmLink(data)) => {
                self.linked(ctx, event, data).await
            }
            (LogicalEvent::EvmAddressUnlinkedFromAccount, EventData::EvmLink(data)) => {
                self.unlinked(ctx, event, data).await
            }
            _ => Err(TransformationError::unexpected(self.name(), event)),
        }
    }
}

pub fn register_handlers(registry: &mut TransformationRegistry) {
    registry.register_handler(EvmAccountsHandler);
}

//! Per-batch aggregation of decoded events.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::error::TransformationError;
use crate::decoding::{Chain, EventContext, EventMetadata, LogicalEvent, ParsedEvent};
use crate::raw_data::Block;

pub type Section = HashMap<String, ParsedEvent>;

/// Decoded events of one batch, by logical event and event id.
#[derive(Debug, Default)]
pub struct EventScope {
    sections: HashMap<LogicalEvent, Section>,
}

fn empty_section() -> &'static Section {
    static EMPTY: OnceLock<Section> = OnceLock::new();
    EMPTY.get_or_init(HashMap::new)
}

impl EventScope {
    /// Decode every supported event of `blocks` in file order. Events the
    /// chain does not index are skipped; decode failures abort.
    pub fn build(chain: &Chain, blocks: &[Block]) -> Result<Self, TransformationError> {
        let mut scope = EventScope::default();

        for block in blocks {
            for event in &block.events {
                let ctx = EventContext {
                    header: &block.header,
                    event,
                    call: block.call_of(event),
                };
                let Some(decoded) = chain.parse(&ctx) else {
                    continue;
                };
                let (name, data) = decoded?;

                scope.set(ParsedEvent {
                    id: event.id.clone(),
                    metadata: EventMetadata {
                        name,
                        block_number: block.header.height,
                        block_hash: block.header.hash.clone(),
                        timestamp: block.header.time(),
                        index_in_block: event.index_in_block,
                        spec_version: block.header.spec_version,
                    },
                    data,
                });
            }
        }

        Ok(scope)
    }

    /// Insert or overwrite by event id.
    pub fn set(&mut self, record: ParsedEvent) {
        self.sections
            .entry(record.metadata.name)
            .or_default()
            .insert(record.id.clone(), record);
    }

    pub fn section(&self, name: LogicalEvent) -> &Section {
        self.sections.get(&name).unwrap_or_else(|| empty_section())
    }

    pub fn entries(&self) -> impl Iterator<Item = (LogicalEvent, &Section)> {
        self.sections.iter().map(|(name, section)| (*name, section))
    }

    /// Events of the given sections in chain order.
    pub fn sorted(&self, names: &[LogicalEvent]) -> Vec<&ParsedEvent> {
        let mut events: Vec<&ParsedEvent> = names
            .iter()
            .flat_map(|name| self.section(*name).values())
            .collect();
        events.sort_by_key(|e| (e.metadata.block_number, e.metadata.index_in_block));
        events
    }

    pub fn len(&self) -> usize {
        self.sections.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::transformations::testing::block;
    use crate::types::config::ChainVariant;

    #[test]
    fn test_build_sorts_and_skips_unknown() {
        let blocks = vec![
            block(
                2,
                json!([
                    {"id": "2-1", "indexInBlock": 1, "name": "AccountFollows.AccountFollowed", "args": ["5A", "5C"]},
                    {"id": "2-0", "indexInBlock": 0, "name": "Balances.Transfer", "args": {}}
                ]),
                json!([]),
            ),
            block(
                1,
                json!([{"id": "1-3", "indexInBlock": 3, "name": "AccountFollows.AccountFollowed", "args": ["5A", "5B"]}]),
                json!([]),
            ),
        ];
        let scope = EventScope::build(&Chain::new(ChainVariant::Subsocial), &blocks).unwrap();
        assert_eq!(scope.len(), 1 + 1);
        assert!(scope.section(LogicalEvent::PostCreated).is_empty());

        let ids: Vec<_> = scope
            .sorted(&[LogicalEvent::AccountFollowed, LogicalEvent::AccountUnfollowed])
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1-3", "2-1"]);
    }

    #[test]
    fn test_same_id_overwrites() {
        let blocks = vec![block(
            1,
            json!([
                {"id": "1-0", "indexInBlock": 0, "name": "AccountFollows.AccountFollowed", "args": ["5A", "5B"]},
                {"id": "1-0", "indexInBlock": 0, "name": "AccountFollows.AccountFollowed", "args": ["5A", "5C"]}
            ]),
            json!([]),
        )];
        let scope = EventScope::build(&Chain::new(ChainVariant::Subsocial), &blocks).unwrap();
        assert_eq!(scope.section(LogicalEvent::AccountFollowed).len(), 1);
    }

    #[test]
    fn test_unknown_version_aborts() {
        let blocks = vec![block(
            1,
            json!([{"id": "1-0", "indexInBlock": 0, "name": "AccountFollows.AccountFollowed", "args": {"follower": 1}}]),
            json!([]),
        )];
        let result = EventScope::build(&Chain::new(ChainVariant::Subsocial), &blocks);
        assert!(matches!(result, Err(TransformationError::DecodeError(_))));
    }
}

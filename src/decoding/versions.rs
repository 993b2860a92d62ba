//! Runtime-version dispatch.
//!
//! Every logical event has an ordered list of `(since_spec_version, decode)`
//! pairs. Versions newer than the block's runtime are skipped, the rest are
//! tried newest-first and the first successful decode wins.

use serde_json::Value as JsonValue;

use super::error::DecodeError;
use crate::raw_data::{BlockHeader, Call, Event};

/// Everything a decoder may read for one event.
#[derive(Debug, Clone, Copy)]
pub struct EventContext<'a> {
    pub header: &'a BlockHeader,
    pub event: &'a Event,
    pub call: Option<&'a Call>,
}

impl<'a> EventContext<'a> {
    pub fn args(&self) -> &'a JsonValue {
        &self.event.args
    }

    pub fn require_call(&self) -> Result<&'a Call, DecodeError> {
        self.call.ok_or_else(|| DecodeError::MissingCall {
            name: self.event.name.clone(),
            event_id: self.event.id.clone(),
        })
    }

    /// Args of the emitting call, if any.
    pub fn call_args(&self) -> Option<&'a JsonValue> {
        self.call.map(|call| &call.args)
    }
}

pub type Decoder<T> = fn(&EventContext<'_>) -> Result<T, DecodeError>;

pub struct Version<T> {
    pub since: u32,
    pub decode: Decoder<T>,
}

/// When each wire format became active on a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeSchedule {
    /// First runtime with positional legacy args. `None` when the chain
    /// launched with named args.
    pub legacy_since: Option<u32>,
    pub named_since: u32,
}

impl RuntimeSchedule {
    /// Version table for an event with a legacy and a named format.
    pub fn table<T>(&self, legacy: Decoder<T>, named: Decoder<T>) -> Vec<Version<T>> {
        let mut versions = vec![Version {
            since: self.named_since,
            decode: named,
        }];
        if let Some(since) = self.legacy_since {
            versions.push(Version {
                since,
                decode: legacy,
            });
        }
        versions
    }

    /// Version table for an event that only exists in named form.
    pub fn named_only<T>(&self, named: Decoder<T>) -> Vec<Version<T>> {
        vec![Version {
            since: self.named_since,
            decode: named,
        }]
    }
}

pub fn decode_versioned<T>(ctx: &EventContext<'_>, versions: &[Version<T>]) -> Result<T, DecodeError> {
    let spec_version = ctx.header.spec_version;
    let mut candidates: Vec<&Version<T>> =
        versions.iter().filter(|v| v.since <= spec_version).collect();
    candidates.sort_by(|a, b| b.since.cmp(&a.since));

    for version in candidates {
        match (version.decode)(ctx) {
            Ok(decoded) => return Ok(decoded),
            Err(err @ DecodeError::MissingCall { .. }) => return Err(err),
            Err(err) => {
                tracing::debug!(
                    "{} at spec {} does not match version {}: {}",
                    ctx.event.name,
                    spec_version,
                    version.since,
                    err
                );
            }
        }
    }

    Err(DecodeError::UnknownVersion {
        name: ctx.event.name.clone(),
        spec_version,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::decoding::util;

    fn header(spec_version: u32) -> BlockHeader {
        BlockHeader {
            height: 1,
            hash: "0x01".into(),
            timestamp: 0,
            spec_version,
        }
    }

    fn event(args: JsonValue) -> Event {
        Event {
            id: "1-0".into(),
            index_in_block: 0,
            name: "Test.Thing".into(),
            args,
            call_id: None,
        }
    }

    fn legacy(ctx: &EventContext<'_>) -> Result<String, DecodeError> {
        util::account(util::positional(ctx.args(), 0)?).map(|a| format!("legacy:{}", a))
    }

    fn named(ctx: &EventContext<'_>) -> Result<String, DecodeError> {
        util::account(util::required(ctx.args(), "account")?).map(|a| format!("named:{}", a))
    }

    const SCHEDULE: RuntimeSchedule = RuntimeSchedule {
        legacy_since: Some(13),
        named_since: 27,
    };

    #[test]
    fn test_newest_eligible_version_wins() {
        let versions = SCHEDULE.table(legacy, named);
        let h = header(30);
        let e = event(json!({"account": "a"}));
        let ctx = EventContext { header: &h, event: &e, call: None };
        assert_eq!(decode_versioned(&ctx, &versions).unwrap(), "named:a");

        // Legacy shape still decodes on a newer runtime.
        let e = event(json!(["a"]));
        let ctx = EventContext { header: &h, event: &e, call: None };
        assert_eq!(decode_versioned(&ctx, &versions).unwrap(), "legacy:a");
    }

    #[test]
    fn test_versions_above_runtime_are_skipped() {
        let versions = SCHEDULE.table(legacy, named);
        let h = header(20);
        let e = event(json!({"account": "a"}));
        let ctx = EventContext { header: &h, event: &e, call: None };
        match decode_versioned(&ctx, &versions) {
            Err(DecodeError::UnknownVersion { spec_version, .. }) => assert_eq!(spec_version, 20),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_call_is_not_retried() {
        fn needs_call(ctx: &EventContext<'_>) -> Result<String, DecodeError> {
            ctx.require_call().map(|c| c.name.clone())
        }
        let versions = SCHEDULE.table(legacy, needs_call);
        let h = header(30);
        let e = event(json!(["a"]));
        let ctx = EventContext { header: &h, event: &e, call: None };
        assert!(matches!(
            decode_versioned(&ctx, &versions),
            Err(DecodeError::MissingCall { .. })
        ));
    }
}

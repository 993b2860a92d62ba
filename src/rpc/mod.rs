mod ipfs;
mod retry;
mod search;
mod storage;

pub use ipfs::{ContentError, ContentSource, IpfsClient};
pub use retry::{with_retry, RetryConfig, RpcError, Throttle};
pub use search::{ElasticClient, IndexDocument, IndexKind, SearchIndex};
pub use storage::{ChainStorage, HttpStorageClient};

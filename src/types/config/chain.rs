use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

/// Which social chain the process indexes. Selected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainVariant {
    Subsocial,
    Soonsocial,
    Xsocial,
}

impl ChainVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainVariant::Subsocial => "subsocial",
            ChainVariant::Soonsocial => "soonsocial",
            ChainVariant::Xsocial => "xsocial",
        }
    }
}

impl fmt::Display for ChainVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "subsocial" => Ok(ChainVariant::Subsocial),
            "soonsocial" => Ok(ChainVariant::Soonsocial),
            "xsocial" => Ok(ChainVariant::Xsocial),
            other => Err(format!("unknown chain variant: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    pub variant: ChainVariant,
    /// Directory holding `{from}-{to}.jsonl` block archives.
    pub archive_dir: PathBuf,
    /// Env var holding the chain storage endpoint.
    pub storage_url_env_var: String,
    #[serde(default)]
    pub start_block: Option<u64>,
}

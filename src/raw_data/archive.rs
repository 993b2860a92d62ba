//! JSON-lines block archives: `{archive_dir}/{from}-{to}.jsonl`, one block
//! per line in ascending height.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::Sender;

use super::block::Block;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed block at {file}:{line}: {source}")]
    Parse {
        file: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Channel send error")]
    ChannelSend,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub from: u64,
    pub to: u64,
    pub path: PathBuf,
}

impl ArchiveFile {
    fn parse(path: PathBuf) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let stem = name.strip_suffix(".jsonl")?;
        let (from, to) = stem.split_once('-')?;
        Some(Self {
            from: from.parse().ok()?,
            to: to.parse().ok()?,
            path,
        })
    }
}

/// Archive files ordered by their first block.
pub fn list_archive_files(dir: &Path) -> Result<Vec<ArchiveFile>, ArchiveError> {
    let mut files: Vec<ArchiveFile> = std::fs::read_dir(dir)?
        .flatten()
        .filter_map(|entry| ArchiveFile::parse(entry.path()))
        .collect();
    files.sort_by_key(|f| (f.from, f.to));
    Ok(files)
}

/// Stream blocks above `after_height` to `sender` in batches of
/// `batch_size`. Returns the number of blocks sent.
pub async fn stream_archive(
    dir: &Path,
    after_height: Option<u64>,
    batch_size: usize,
    sender: Sender<Vec<Block>>,
) -> Result<u64, ArchiveError> {
    let files = list_archive_files(dir)?;
    tracing::info!(
        "Found {} archive files in {}, resuming after block {:?}",
        files.len(),
        dir.display(),
        after_height
    );

    let mut batch = Vec::with_capacity(batch_size);
    let mut sent = 0u64;

    for file in files {
        if after_height.is_some_and(|h| file.to <= h) {
            continue;
        }

        let reader = BufReader::new(tokio::fs::File::open(&file.path).await?);
        let mut lines = reader.lines();
        let mut line_no = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let block: Block = serde_json::from_str(&line).map_err(|source| ArchiveError::Parse {
                file: file.path.display().to_string(),
                line: line_no,
                source,
            })?;
            if after_height.is_some_and(|h| block.header.height <= h) {
                continue;
            }

            batch.push(block);
            if batch.len() >= batch_size {
                sent += batch.len() as u64;
                let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
                sender.send(full).await.map_err(|_| ArchiveError::ChannelSend)?;
            }
        }
    }

    if !batch.is_empty() {
        sent += batch.len() as u64;
        sender.send(batch).await.map_err(|_| ArchiveError::ChannelSend)?;
    }

    Ok(sent)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;

    fn block_line(height: u64) -> String {
        json!({"header": {"height": height, "hash": format!("0x{:02x}", height), "timestamp": 0, "specVersion": 13}})
            .to_string()
    }

    #[tokio::test]
    async fn test_stream_skips_checkpointed_blocks() {
        let dir = std::env::temp_dir().join(format!("squid-archive-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let first: Vec<String> = (1..=3).map(block_line).collect();
        let second: Vec<String> = (4..=6).map(block_line).collect();
        std::fs::write(dir.join("1-3.jsonl"), first.join("\n")).unwrap();
        std::fs::write(dir.join("4-6.jsonl"), second.join("\n")).unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let sent = stream_archive(&dir, Some(2), 2, tx).await.unwrap();
        assert_eq!(sent, 4);

        let mut heights = Vec::new();
        while let Some(batch) = rx.recv().await {
            assert!(batch.len() <= 2);
            heights.extend(batch.iter().map(|b| b.header.height));
        }
        assert_eq!(heights, vec![3, 4, 5, 6]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_archive_file_name() {
        let file = ArchiveFile::parse(PathBuf::from("/a/100-199.jsonl")).unwrap();
        assert_eq!((file.from, file.to), (100, 199));
        assert!(ArchiveFile::parse(PathBuf::from("/a/blocks.jsonl")).is_none());
    }
}

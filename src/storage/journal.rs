use std::io::SeekFrom;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::warn;

use crate::error::Result;
use crate::storage::reading::Reading;

/// Append-only newline-delimited JSON log of every stored reading.
pub struct Journal {
    path: PathBuf,
    // last write may have left an unterminated line behind
    torn_tail: AtomicBool,
}

impl Journal {
    /// Open (or create) the journal, terminating any partial last line left by a crash.
    pub async fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .await?;

        if file.metadata().await?.len() > 0 {
            file.seek(SeekFrom::End(-1)).await?;
            let mut last = [0u8; 1];
            file.read_exact(&mut last).await?;
            if last[0] != b'\n' {
                warn!("journal {} ends with a partial line, sealing it", path.display());
                // append mode: always lands at the end of the file
                file.write_all(b"\n").await?;
                file.flush().await?;
            }
        }

        Ok(Self {
            path,
            torn_tail: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub async fn append(&self, reading: &Reading) -> Result<()> {
        let mut line = Vec::new();
        if self.torn_tail.load(Ordering::Acquire) {
            line.push(b'\n');
        }
        serde_json::to_writer(&mut line, reading)?;
        line.push(b'\n');

        let written = self.write_line(&line).await;
        self.torn_tail.store(written.is_err(), Ordering::Release);
        written
    }

    async fn write_line(&self, line: &[u8]) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line).await?;
        file.flush().await?;
        Ok(())
    }

    /// All readings in the order they were written. Torn or foreign lines are skipped.
    pub async fn replay(&self) -> Result<Vec<Reading>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut out = Vec::new();
        for (lineno, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Reading>(line) {
                Ok(reading) => out.push(reading),
                Err(e) => warn!(
                    "skipping malformed journal line {} in {}: {}",
                    lineno + 1,
                    self.path.display(),
                    e
                ),
            }
        }
        Ok(out)
    }
}

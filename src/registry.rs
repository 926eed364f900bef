// src/registry.rs
//! Seen-link registry: links that were already dispatched. Grows only.
//!
//! Owned by the monitor task alone; nothing else reads or writes it, so no locking.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

#[async_trait]
pub trait LinkRegistry: Send + Sync {
    fn contains(&self, link: &str) -> bool;
    /// Record a dispatched link. Re-inserting a known link is a no-op.
    async fn insert(&mut self, link: &str) -> Result<()>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-lifetime registry; dedup state is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryLinkRegistry {
    links: HashSet<String>,
}

impl MemoryLinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkRegistry for MemoryLinkRegistry {
    fn contains(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    async fn insert(&mut self, link: &str) -> Result<()> {
        self.links.insert(link.to_string());
        Ok(())
    }

    fn len(&self) -> usize {
        self.links.len()
    }
}

/// Registry backed by a text file with one link per line. Survives restarts.
#[derive(Debug)]
pub struct FileLinkRegistry {
    path: PathBuf,
    links: HashSet<String>,
}

impl FileLinkRegistry {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let links = match fs::read_to_string(&path) {
            Ok(s) => s
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading seen links from {}", path.display()))
            }
        };
        tracing::info!(path = %path.display(), count = links.len(), "seen-link registry loaded");
        Ok(Self { path, links })
    }
}

#[async_trait]
impl LinkRegistry for FileLinkRegistry {
    fn contains(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    /// The link is kept in memory even when the append fails.
    async fn insert(&mut self, link: &str) -> Result<()> {
        if !self.links.insert(link.to_string()) {
            return Ok(());
        }
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let mut f = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening seen links {}", self.path.display()))?;
        f.write_all(format!("{link}\n").as_bytes())
            .await
            .context("appending seen link")?;
        f.flush().await.context("flushing seen links")?;
        Ok(())
    }

    fn len(&self) -> usize {
        self.links.len()
    }
}

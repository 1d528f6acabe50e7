use crate::error::{Result, TagError};
use crate::tags::block::Block;
use crate::tags::state::TagState;
use crate::tags::structures::{BlockId, DataType, ValueVariant};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap; // Using DashMap for concurrent R/W access
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Identity of a tag: its name is unique within its block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagKey {
    pub block: BlockId,
    pub name: String,
}

impl TagKey {
    pub fn new(block: impl Into<BlockId>, name: impl Into<String>) -> Self {
        TagKey {
            block: block.into(),
            name: name.into(),
        }
    }

    fn of(tag: &TagState) -> Self {
        TagKey::new(tag.block().clone(), tag.name())
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.block, self.name)
    }
}

/// Owns the tags of the underlying system.
///
/// `TagState` has no locking of its own. Every snapshot and update here runs
/// while DashMap holds the entry's shard lock, so a snapshot never observes
/// a value from one update paired with the timestamp of another.
///
/// Operations touching both maps lock the block entry first and hold it while
/// the tag map changes, so a stored tag is always linked from its block.
#[derive(Debug, Clone, Default)] // Clone provides cheap Arc clones
pub struct TagEngine {
    tags: Arc<DashMap<TagKey, TagState>>,
    blocks: Arc<DashMap<BlockId, Block>>,
}

impl TagEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a block definition. Tag links already recorded for the
    /// block are kept.
    pub fn register_block(&self, mut block: Block) {
        debug!("Registering block {}", block.id);
        match self.blocks.entry(block.id.clone()) {
            Entry::Occupied(mut existing) => {
                for name in &existing.get().tag_names {
                    block.link_tag(name);
                }
                existing.insert(block);
            }
            Entry::Vacant(slot) => {
                slot.insert(block);
            }
        }
    }

    pub fn get_block(&self, id: &BlockId) -> Option<Block> {
        self.blocks.get(id).map(|b| b.value().clone())
    }

    pub fn has_block(&self, id: &BlockId) -> bool {
        self.blocks.contains_key(id)
    }

    /// All blocks, ordered by id.
    pub fn get_all_blocks(&self) -> Vec<Block> {
        let mut blocks: Vec<Block> = self.blocks.iter().map(|b| b.value().clone()).collect();
        blocks.sort_by(|a, b| a.id.cmp(&b.id));
        blocks
    }

    /// Add or replace a tag.
    ///
    /// Inconsistent tags are stored as given; problems are only logged.
    pub fn register_tag(&self, tag: TagState) {
        report_shape(&tag);
        let key = TagKey::of(&tag);
        let mut block = self
            .blocks
            .entry(key.block.clone())
            .or_insert_with(|| Block::new(key.block.clone(), key.block.as_str()));
        block.link_tag(&key.name);
        debug!("Registering tag {}", key);
        self.tags.insert(key, tag);
    }

    /// Drop a tag and unlink it from its block.
    pub fn remove_tag(&self, block: &BlockId, name: &str) -> Option<TagState> {
        let mut block_ref = self.blocks.get_mut(block);
        let (_, tag) = self.tags.remove(&TagKey::new(block.clone(), name))?;
        if let Some(entry) = block_ref.as_mut() {
            entry.unlink_tag(name);
        }
        Some(tag)
    }

    /// Snapshot of one tag, taken under the entry lock.
    pub fn snapshot(&self, block: &BlockId, name: &str) -> Option<TagState> {
        self.tags
            .get(&TagKey::new(block.clone(), name))
            .map(|tag_ref| tag_ref.value().create_snapshot())
    }

    /// Snapshots of a block's tags in the block's tag order.
    pub fn snapshot_block(&self, block: &BlockId) -> Result<Vec<TagState>> {
        let names = self
            .blocks
            .get(block)
            .map(|b| b.tag_names.clone())
            .ok_or_else(|| TagError::UnknownBlock(block.to_string()))?;
        Ok(names
            .iter()
            .filter_map(|name| self.snapshot(block, name))
            .collect())
    }

    /// Snapshots of every tag, ordered by key.
    pub fn snapshot_all(&self) -> Vec<TagState> {
        let mut snapshots: Vec<(TagKey, TagState)> = self
            .tags
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().create_snapshot()))
            .collect();
        snapshots.sort_by(|a, b| a.0.cmp(&b.0));
        snapshots.into_iter().map(|(_, tag)| tag).collect()
    }

    /// Store a new value and its timestamp.
    ///
    /// Timestamps must not go backwards; an equal timestamp is accepted.
    pub fn update_value(
        &self,
        block: &BlockId,
        name: &str,
        value: ValueVariant,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        let mut tag = self
            .tags
            .get_mut(&TagKey::new(block.clone(), name))
            .ok_or_else(|| TagError::TagNotFound {
                block: block.to_string(),
                name: name.to_string(),
            })?;

        if timestamp < tag.timestamp() {
            return Err(TagError::StaleTimestamp {
                block: block.to_string(),
                name: name.to_string(),
                current: tag.timestamp(),
                attempted: timestamp,
            });
        }
        if !tag.data_type().accepts(&value) {
            warn!(
                "Tag {}/{} is {:?} but received {:?}",
                block,
                name,
                tag.data_type(),
                value
            );
        }
        tag.set_value(value);
        tag.set_timestamp(timestamp);
        Ok(())
    }

    /// Run `f` against the live tag while holding its entry lock.
    ///
    /// `f` must not call back into this engine: the shard stays write-locked
    /// until it returns, so touching another tag in the same shard deadlocks.
    pub fn with_tag_mut<R>(
        &self,
        block: &BlockId,
        name: &str,
        f: impl FnOnce(&mut TagState) -> R,
    ) -> Option<R> {
        self.tags
            .get_mut(&TagKey::new(block.clone(), name))
            .map(|mut tag_ref| f(tag_ref.value_mut()))
    }

    /// Get a list of all registered tag keys, ordered.
    pub fn get_all_tag_keys(&self) -> Vec<TagKey> {
        let mut keys: Vec<TagKey> = self.tags.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

fn report_shape(tag: &TagState) {
    let key = TagKey::of(tag);
    if !tag.data_type().accepts(tag.value()) {
        warn!(
            "Tag {} is {:?} but holds {:?}",
            key,
            tag.data_type(),
            tag.value()
        );
    }
    if let Some(range) = tag.eu_range() {
        if range.len() != 2 && range.len() != 4 {
            warn!("Tag {} has an EU range of {} values, expected 2 or 4", key, range.len());
        }
    }
    if let (DataType::Digital, Some(labels)) = (tag.data_type(), tag.labels()) {
        if labels.len() != 2 {
            warn!("Digital tag {} has {} labels, expected 2", key, labels.len());
        }
    }
}

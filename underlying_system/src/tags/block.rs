use crate::tags::structures::BlockId;
use serde::{Deserialize, Serialize};

/// A logical group of tags in the underlying system.
///
/// The block only lists the names of its tags; the tags themselves live in
/// the [`TagEngine`](crate::tags::engine::TagEngine).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tag_names: Vec<String>,
}

impl Block {
    pub fn new(id: impl Into<BlockId>, name: impl Into<String>) -> Self {
        Block {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    // Keeps insertion order, ignores duplicates.
    pub(crate) fn link_tag(&mut self, tag_name: &str) {
        if !self.tag_names.iter().any(|n| n == tag_name) {
            self.tag_names.push(tag_name.to_string());
        }
    }

    pub(crate) fn unlink_tag(&mut self, tag_name: &str) {
        self.tag_names.retain(|n| n != tag_name);
    }
}

use crate::error::{Result, TagError};
use crate::tags::block::Block;
use crate::tags::engine::TagEngine;
use crate::tags::state::TagState;
use crate::tags::structures::{BlockId, DataType, EuRange, Labels, TagType, ValueVariant};
use chrono::Utc;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BlockConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TagConfig {
    pub block: String, // Must match a [[blocks]] id
    pub name: String,  // Unique within the block
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub engineering_units: String,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default)]
    pub tag_type: TagType,
    #[serde(default)]
    pub is_writeable: bool,
    // TOML has no null, so an unread value is left out of the file.
    #[serde(default, skip_serializing_if = "value_is_unset")]
    pub initial_value: Option<ValueVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eu_range: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl TagConfig {
    /// Build the live record for this definition, stamped with the current time.
    pub fn to_tag_state(&self) -> TagState {
        let mut tag = TagState::new(self.block.as_str(), self.name.as_str());
        tag.set_description(self.description.as_str());
        tag.set_engineering_units(self.engineering_units.as_str());
        tag.set_data_type(self.data_type);
        tag.set_tag_type(self.tag_type);
        tag.set_writeable(self.is_writeable);
        if let Some(value) = &self.initial_value {
            tag.set_value(interpret_value(self.data_type, value.clone()));
        }
        tag.set_timestamp(Utc::now());
        tag.set_eu_range(self.eu_range.clone().map(EuRange::new));
        tag.set_labels(self.labels.clone().map(Labels::new));
        tag
    }

    /// Read `initial_value` in terms of `data_type`. A `Null` value becomes `None`.
    pub fn normalize(&mut self) {
        let data_type = self.data_type;
        self.initial_value = self
            .initial_value
            .take()
            .filter(|value| !value.is_null())
            .map(|value| interpret_value(data_type, value));
    }
}

fn value_is_unset(value: &Option<ValueVariant>) -> bool {
    value.as_ref().map_or(true, ValueVariant::is_null)
}

// TOML has no enumeration literal, so integers on enumerated tags are label indexes.
fn interpret_value(data_type: DataType, value: ValueVariant) -> ValueVariant {
    match (data_type, value) {
        (DataType::Enumerated, ValueVariant::Int(i)) => u32::try_from(i)
            .map(ValueVariant::Enumeration)
            .unwrap_or(ValueVariant::Int(i)),
        (DataType::Enumerated, ValueVariant::UInt(u)) => u32::try_from(u)
            .map(ValueVariant::Enumeration)
            .unwrap_or(ValueVariant::UInt(u)),
        (DataType::Analog, ValueVariant::Int(i)) => ValueVariant::Float(i as f64),
        (_, value) => value,
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub blocks: Vec<BlockConfig>,
    #[serde(default)] // Make tags optional in the config file
    pub tags: Vec<TagConfig>,
}

impl Settings {
    /// Load from a TOML file. `UNDERLYING__*` environment variables
    /// override file values.
    pub fn load(config_path: &Path) -> Result<Self> {
        let s = Config::builder()
            .add_source(File::from(config_path))
            .add_source(Environment::with_prefix("UNDERLYING").separator("__"))
            .build()?;

        let mut settings: Settings = s.try_deserialize()?;
        for tag in &mut settings.tags {
            tag.normalize();
        }
        Ok(settings)
    }

    pub fn save(&self, config_path: &Path) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(config_path, toml_string)?;
        Ok(())
    }

    /// Register every block, then every tag, into `engine`.
    pub fn populate(&self, engine: &TagEngine) -> Result<()> {
        for block_cfg in &self.blocks {
            let mut block = Block::new(block_cfg.id.as_str(), block_cfg.name.as_str());
            block.description = block_cfg.description.clone();
            engine.register_block(block);
        }
        for tag_cfg in &self.tags {
            let block_id = BlockId::from(tag_cfg.block.as_str());
            if !engine.has_block(&block_id) {
                return Err(TagError::UnknownBlock(tag_cfg.block.clone()));
            }
            info!("Registering tag: {}/{}", tag_cfg.block, tag_cfg.name);
            engine.register_tag(tag_cfg.to_tag_state());
        }
        Ok(())
    }
}

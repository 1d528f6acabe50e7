use crate::tags::structures::{
    BlockId, DataType, EuRange, Labels, SharedList, TagType, ValueVariant,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Last known state of one tag in the underlying system.
///
/// The underlying system has no notion of the OPC UA information model; a
/// node manager translates this record into nodes. Readers must not hold a
/// live `TagState` across time: they take a [`TagState::create_snapshot`].
///
/// Setters never validate. Keeping `value` consistent with `data_type`, and
/// `eu_range`/`labels` well formed, is up to whoever writes the tag.
#[derive(Debug, Default, Serialize)]
pub struct TagState {
    block: BlockId,
    name: String,
    description: String,
    engineering_units: String,
    data_type: DataType,
    tag_type: TagType,
    value: ValueVariant,
    timestamp: DateTime<Utc>,
    is_writeable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    eu_range: Option<EuRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<Labels>,
}

impl TagState {
    pub fn new(block: impl Into<BlockId>, name: impl Into<String>) -> Self {
        TagState {
            block: block.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn block(&self) -> &BlockId {
        &self.block
    }

    pub fn set_block(&mut self, block: impl Into<BlockId>) {
        self.block = block.into();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn engineering_units(&self) -> &str {
        &self.engineering_units
    }

    pub fn set_engineering_units(&mut self, units: impl Into<String>) {
        self.engineering_units = units.into();
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn set_data_type(&mut self, data_type: DataType) {
        self.data_type = data_type;
    }

    pub fn tag_type(&self) -> TagType {
        self.tag_type
    }

    pub fn set_tag_type(&mut self, tag_type: TagType) {
        self.tag_type = tag_type;
    }

    pub fn value(&self) -> &ValueVariant {
        &self.value
    }

    pub fn set_value(&mut self, value: ValueVariant) {
        self.value = value;
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = timestamp;
    }

    pub fn is_writeable(&self) -> bool {
        self.is_writeable
    }

    pub fn set_writeable(&mut self, writeable: bool) {
        self.is_writeable = writeable;
    }

    pub fn eu_range(&self) -> Option<&EuRange> {
        self.eu_range.as_ref()
    }

    /// Replaces the range for this instance only; snapshots keep the old one.
    pub fn set_eu_range(&mut self, eu_range: Option<EuRange>) {
        self.eu_range = eu_range;
    }

    pub fn labels(&self) -> Option<&Labels> {
        self.labels.as_ref()
    }

    pub fn set_labels(&mut self, labels: Option<Labels>) {
        self.labels = labels;
    }

    /// Display label for the current value.
    ///
    /// Digital tags map `true` to the first label and `false` to the second.
    /// Enumerated values index straight into the table.
    pub fn label_for_value(&self) -> Option<String> {
        let labels = self.labels.as_ref()?;
        match (&self.data_type, &self.value) {
            (DataType::Digital, ValueVariant::Bool(true)) => labels.get(0),
            (DataType::Digital, ValueVariant::Bool(false)) => labels.get(1),
            (_, ValueVariant::Enumeration(index)) => labels.get(*index as usize),
            _ => None,
        }
    }

    /// Point-in-time copy of this tag.
    ///
    /// Scalar fields are copied. `eu_range` and `labels` are shared with the
    /// original: writing an element through either instance shows up in
    /// both, while assigning a new sequence to one does not affect the other.
    /// The copy is shallow on purpose; callers needing isolated sequences
    /// call `deep_copy` on them.
    pub fn create_snapshot(&self) -> TagState {
        TagState {
            block: self.block.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            engineering_units: self.engineering_units.clone(),
            data_type: self.data_type,
            tag_type: self.tag_type,
            value: self.value.clone(),
            timestamp: self.timestamp,
            is_writeable: self.is_writeable,
            eu_range: self.eu_range.clone(),
            labels: self.labels.clone(),
        }
    }

    /// True when both instances hold the same `eu_range` and `labels`
    /// allocations (or both lack them).
    pub fn shares_sequences_with(&self, other: &TagState) -> bool {
        fn same<T: Clone>(a: Option<&SharedList<T>>, b: Option<&SharedList<T>>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => a.ptr_eq(b),
                (None, None) => true,
                _ => false,
            }
        }
        same(self.eu_range(), other.eu_range()) && same(self.labels(), other.labels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn temp1() -> TagState {
        let mut tag = TagState::new("Boiler", "Temp1");
        tag.set_description("Boiler outlet temperature");
        tag.set_engineering_units("°C");
        tag.set_data_type(DataType::Analog);
        tag.set_value(ValueVariant::Float(72.5));
        tag.set_timestamp(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
        tag.set_eu_range(Some(EuRange::new(vec![100.0, 0.0])));
        tag
    }

    #[test]
    fn new_tag_has_defaults() {
        let tag = TagState::new("B1", "T1");
        assert_eq!(tag.block().as_str(), "B1");
        assert_eq!(tag.name(), "T1");
        assert!(tag.value().is_null());
        assert_eq!(tag.timestamp(), DateTime::<Utc>::default());
        assert!(!tag.is_writeable());
        assert!(tag.eu_range().is_none());
        assert!(tag.labels().is_none());
    }

    #[test]
    fn set_block_takes_str_or_id() {
        let mut tag = TagState::new("B1", "T1");
        tag.set_block("B2");
        assert_eq!(tag.block(), &BlockId::from("B2"));
        tag.set_block(BlockId::new("B3"));
        assert_eq!(tag.block().as_str(), "B3");
    }

    #[test]
    fn snapshot_copies_scalars_and_shares_sequences() {
        let tag = temp1();
        let snap = tag.create_snapshot();
        assert_eq!(snap.name(), tag.name());
        assert_eq!(snap.value(), tag.value());
        assert_eq!(snap.timestamp(), tag.timestamp());
        assert!(snap.shares_sequences_with(&tag));
    }

    #[test]
    fn replacing_range_unshares_it() {
        let mut tag = temp1();
        let snap = tag.create_snapshot();
        tag.set_eu_range(Some(EuRange::new(vec![200.0, 0.0])));
        assert!(!snap.shares_sequences_with(&tag));
        assert_eq!(snap.eu_range().and_then(|r| r.high_eu()), Some(100.0));
    }

    #[test]
    fn digital_label_lookup() {
        let mut tag = TagState::new("Pump", "Running");
        tag.set_data_type(DataType::Digital);
        tag.set_labels(Some(Labels::new(vec!["On".into(), "Off".into()])));
        tag.set_value(ValueVariant::Bool(false));
        assert_eq!(tag.label_for_value().as_deref(), Some("Off"));
        tag.set_value(ValueVariant::Bool(true));
        assert_eq!(tag.label_for_value().as_deref(), Some("On"));
    }

    #[test]
    fn enumerated_label_lookup() {
        let mut tag = TagState::new("Valve", "Mode");
        tag.set_data_type(DataType::Enumerated);
        tag.set_labels(Some(Labels::new(vec![
            "Manual".into(),
            "Auto".into(),
            "Cascade".into(),
        ])));
        tag.set_value(ValueVariant::Enumeration(2));
        assert_eq!(tag.label_for_value().as_deref(), Some("Cascade"));
        tag.set_value(ValueVariant::Enumeration(7));
        assert_eq!(tag.label_for_value(), None);
    }
}

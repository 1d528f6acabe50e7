use parking_lot::RwLock;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Possible runtime values of a tag.
///
/// Serialized as the bare value. Reading one back yields `Int` for every
/// integer that fits in an `i64`; whether a number is an enumeration index
/// depends on the tag's `DataType`, so the config layer resolves that.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum ValueVariant {
    #[default]
    Null, // No value reported yet
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    /// Index into the tag's label table.
    Enumeration(u32),
}

impl ValueVariant {
    pub fn is_null(&self) -> bool {
        matches!(self, ValueVariant::Null)
    }
}

struct ValueVariantVisitor;

impl<'de> Visitor<'de> for ValueVariantVisitor {
    type Value = ValueVariant;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a boolean, number, string or null")
    }

    fn visit_unit<E: de::Error>(self) -> Result<ValueVariant, E> {
        Ok(ValueVariant::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<ValueVariant, E> {
        Ok(ValueVariant::Null)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<ValueVariant, E> {
        Ok(ValueVariant::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ValueVariant, E> {
        Ok(ValueVariant::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<ValueVariant, E> {
        Ok(i64::try_from(v)
            .map(ValueVariant::Int)
            .unwrap_or(ValueVariant::UInt(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<ValueVariant, E> {
        Ok(ValueVariant::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ValueVariant, E> {
        Ok(ValueVariant::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<ValueVariant, E> {
        Ok(ValueVariant::String(v))
    }
}

impl<'de> Deserialize<'de> for ValueVariant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVariantVisitor)
    }
}

/// Classification of the value a tag carries in the underlying system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Two-state value, labelled by `[true_state, false_state]`.
    Digital,
    /// Scaled numeric value with an EU range.
    #[default]
    Analog,
    Integer,
    String,
    /// Index into a label lookup table.
    Enumerated,
}

impl DataType {
    /// Whether `value` has the representation this data type expects.
    ///
    /// `Null` is accepted by every data type since a freshly configured tag
    /// has not been read yet. Nothing in `TagState` calls this; it is the
    /// check collaborators use before trusting a value.
    pub fn accepts(&self, value: &ValueVariant) -> bool {
        match (self, value) {
            (_, ValueVariant::Null) => true,
            (DataType::Digital, ValueVariant::Bool(_)) => true,
            (
                DataType::Analog,
                ValueVariant::Float(_) | ValueVariant::Int(_) | ValueVariant::UInt(_),
            ) => true,
            (DataType::Integer, ValueVariant::Int(_) | ValueVariant::UInt(_)) => true,
            (DataType::String, ValueVariant::String(_)) => true,
            (DataType::Enumerated, ValueVariant::Enumeration(_)) => true,
            _ => false,
        }
    }
}

/// Role of a tag within its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    #[default]
    Input,
    Output,
    Internal,
}

/// Key of the block a tag belongs to.
///
/// Tags refer to their block through this key instead of holding the block,
/// so a block can list its tags without an ownership cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        BlockId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        BlockId(id.to_string())
    }
}

impl From<String> for BlockId {
    fn from(id: String) -> Self {
        BlockId(id)
    }
}

/// A sequence shared by reference between a tag and its snapshots.
///
/// Cloning shares the allocation: an element written through [`SharedList::set`]
/// is seen by every holder. Holders that need isolation take a
/// [`SharedList::deep_copy`].
pub struct SharedList<T>(Arc<RwLock<Vec<T>>>);

/// `[high_eu, low_eu]` or `[high_eu, low_eu, high_instrument, low_instrument]`.
pub type EuRange = SharedList<f64>;

/// Digital tags: `[true_state, false_state]`. Enumerated tags: lookup table.
pub type Labels = SharedList<String>;

impl<T: Clone> SharedList<T> {
    pub fn new(items: Vec<T>) -> Self {
        SharedList(Arc::new(RwLock::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.0.read().get(index).cloned()
    }

    /// Overwrite one element in place. Returns false if `index` is out of bounds.
    pub fn set(&self, index: usize, item: T) -> bool {
        match self.0.write().get_mut(index) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.0.read().clone()
    }

    /// A copy with its own allocation.
    pub fn deep_copy(&self) -> Self {
        SharedList::new(self.to_vec())
    }

    /// Whether both lists are the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl EuRange {
    pub fn high_eu(&self) -> Option<f64> {
        self.get(0)
    }

    pub fn low_eu(&self) -> Option<f64> {
        self.get(1)
    }

    /// Only present in the four-element form.
    pub fn high_instrument(&self) -> Option<f64> {
        if self.len() == 4 {
            self.get(2)
        } else {
            None
        }
    }

    pub fn low_instrument(&self) -> Option<f64> {
        if self.len() == 4 {
            self.get(3)
        } else {
            None
        }
    }
}

impl<T> Clone for SharedList<T> {
    fn clone(&self) -> Self {
        SharedList(Arc::clone(&self.0))
    }
}

impl<T: Clone> From<Vec<T>> for SharedList<T> {
    fn from(items: Vec<T>) -> Self {
        SharedList::new(items)
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.read().iter()).finish()
    }
}

// Compares contents; use `ptr_eq` for identity.
impl<T: PartialEq> PartialEq for SharedList<T> {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        *self.0.read() == *other.0.read()
    }
}

impl<T: Serialize> Serialize for SharedList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.read().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de> + Clone> Deserialize<'de> for SharedList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(SharedList::new)
    }
}

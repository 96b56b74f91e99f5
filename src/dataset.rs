use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One value with its standard uncertainty. Either may be missing upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub uncert: Option<f64>,
}

/// model -> measurement
pub type ModelMap = BTreeMap<String, Measurement>;

/// element -> model -> measurement, for one (property, structure) pair.
pub type Chunk = BTreeMap<String, ModelMap>;

/// property -> structure -> element -> model -> measurement.
///
/// Serializes to the nested JSON object used by the cache file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset(BTreeMap<String, BTreeMap<String, Chunk>>);

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replaces `[property][structure]` with `chunk`. Entries from an
    /// earlier fetch of the same pair are discarded, not merged.
    pub fn merge(&mut self, property: &str, structure: &str, chunk: Chunk) {
        self.0
            .entry(property.to_string())
            .or_default()
            .insert(structure.to_string(), chunk);
    }

    pub fn chunk(&self, property: &str, structure: &str) -> Option<&Chunk> {
        self.0.get(property).and_then(|structures| structures.get(structure))
    }

    pub fn get(
        &self,
        property: &str,
        structure: &str,
        element: &str,
        model: &str,
    ) -> Option<&Measurement> {
        self.chunk(property, structure)
            .and_then(|chunk| chunk.get(element))
            .and_then(|models| models.get(model))
    }

    pub fn properties(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, Chunk>)> {
        self.0.iter()
    }

    pub(crate) fn retain_properties(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|property, _| keep(property));
    }

    pub(crate) fn structures_mut(&mut self) -> impl Iterator<Item = &mut BTreeMap<String, Chunk>> {
        self.0.values_mut()
    }
}

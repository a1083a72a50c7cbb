//! Structural deduplication of discovered items and override bookkeeping.
//!
//! Items and metadata are keyed by the blake3 hash of their canonical JSON.
//! A key hit is confirmed with a value comparison before it counts.

use std::collections::HashMap;

use serde::Serialize;

use super::canonical::canonical_key;
use super::export::ToolCatalog;
use super::spec::GenerateSpec;
use crate::error::Result;
use crate::models::{TaggedToolSpec, ToolDefinitionOverride, ToolSpec};

type EntryKey = (blake3::Hash, blake3::Hash);

struct Entry<T, M> {
    item: T,
    spec: ToolSpec<M>,
}

struct PendingOverride<M> {
    metadata: M,
    overrides: ToolDefinitionOverride,
}

/// Append-only store of tool specs, one per distinct (item, metadata) pair.
pub struct ToolRepository<T, G: GenerateSpec<T>> {
    tool_type: String,
    generator: G,
    entries: Vec<Entry<T, G::Metadata>>,
    index: HashMap<EntryKey, usize>,
    pending: Vec<PendingOverride<G::Metadata>>,
    pending_index: HashMap<blake3::Hash, usize>,
}

impl<T, G> ToolRepository<T, G>
where
    T: Serialize + Clone + PartialEq,
    G: GenerateSpec<T>,
    G::Metadata: Serialize + Clone + PartialEq,
{
    pub fn new(tool_type: impl Into<String>, generator: G) -> Self {
        Self {
            tool_type: tool_type.into(),
            generator,
            entries: Vec::new(),
            index: HashMap::new(),
            pending: Vec::new(),
            pending_index: HashMap::new(),
        }
    }

    /// Generate the spec for `item` and insert it.
    ///
    /// Returns `Ok(false)` when an equal item with equal metadata is already
    /// stored. A pending override registered for equal metadata is merged
    /// into the new spec before insertion.
    pub fn add(&mut self, item: T) -> Result<bool> {
        let mut spec = self.generator.generate(&item)?;
        let metadata_key = canonical_key(&spec.metadata)?;
        let key = (canonical_key(&item)?, metadata_key);

        if let Some(&i) = self.index.get(&key) {
            let existing = &self.entries[i];
            if existing.item == item && existing.spec.metadata == spec.metadata {
                return Ok(false);
            }
        }

        if let Some(pending) = self.pending_for(&metadata_key, &spec.metadata) {
            tracing::debug!("Applying override to {}", spec.definition.name);
            spec.merge_override(&pending.overrides);
        }

        self.index.insert(key, self.entries.len());
        self.entries.push(Entry { item, spec });
        Ok(true)
    }

    /// Register an override for specs whose metadata equals `metadata`.
    ///
    /// Only specs added afterwards pick it up. Repeated registrations for
    /// equal metadata merge, later fields winning.
    pub fn add_override(&mut self, metadata: G::Metadata, overrides: ToolDefinitionOverride) -> Result<()> {
        let key = canonical_key(&metadata)?;
        if let Some(&i) = self.pending_index.get(&key) {
            if self.pending[i].metadata == metadata {
                self.pending[i].overrides.merge(&overrides);
                return Ok(());
            }
        }

        self.pending_index.insert(key, self.pending.len());
        self.pending.push(PendingOverride { metadata, overrides });
        Ok(())
    }

    /// Register an override addressed by the item whose metadata it targets.
    pub fn add_override_for(&mut self, item: &T, overrides: ToolDefinitionOverride) -> Result<()> {
        let metadata = self.generator.generate(item)?.metadata;
        self.add_override(metadata, overrides)
    }

    fn pending_for(&self, key: &blake3::Hash, metadata: &G::Metadata) -> Option<&PendingOverride<G::Metadata>> {
        let pending = &self.pending[*self.pending_index.get(key)?];
        (pending.metadata == *metadata).then_some(pending)
    }

    /// The override currently registered for `metadata`, if any.
    #[cfg(test)]
    pub fn pending_override(&self, metadata: &G::Metadata) -> Result<Option<&ToolDefinitionOverride>> {
        let key = canonical_key(metadata)?;
        Ok(self.pending_for(&key, metadata).map(|p| &p.overrides))
    }

    fn tag(&self, spec: &ToolSpec<G::Metadata>) -> TaggedToolSpec<G::Metadata> {
        TaggedToolSpec {
            tool_type: self.tool_type.clone(),
            spec: spec.clone(),
        }
    }

    /// Tagged snapshot of every spec, in insertion order.
    pub fn list(&self) -> Vec<TaggedToolSpec<G::Metadata>> {
        self.entries.iter().map(|e| self.tag(&e.spec)).collect()
    }

    /// Like [`list`](Self::list), paired with the item each spec came from.
    pub fn list_with_keys(&self) -> Vec<(T, TaggedToolSpec<G::Metadata>)> {
        self.entries
            .iter()
            .map(|e| (e.item.clone(), self.tag(&e.spec)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the repository into an exported catalog.
    pub fn into_catalog(self) -> ToolCatalog<G::Metadata> {
        let tool_type = self.tool_type;
        ToolCatalog::new(
            self.entries
                .into_iter()
                .map(|e| TaggedToolSpec {
                    tool_type: tool_type.clone(),
                    spec: e.spec,
                })
                .collect(),
        )
    }
}

//! The dunder-name trie: resolved group-by names and their descriptors.
//!
//! Names are stored segment by segment (`listing__country` is the path
//! `listing` then `country`), so the layer above can walk prefixes for
//! suggestions. Children live in sorted order; every iteration over a trie is
//! deterministic.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use semgraph_core::filtering::GroupByItemProperty;
use semgraph_core::recipe::{AttributeRecipe, DUNDER};
use semgraph_manifest::{DatePart, ExpandedTimeGranularity, ModelReference};

/// A resolved group-by name as ordered dunder segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DunderName {
    segments: Vec<String>,
}

impl DunderName {
    pub fn new(segments: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { segments: segments.into_iter().map(Into::into).collect() }
    }

    /// Splits a rendered name on the dunder separator.
    pub fn parse(name: &str) -> Self {
        Self { segments: name.split(DUNDER).map(str::to_owned).collect() }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for DunderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join(DUNDER))
    }
}

impl From<&str> for DunderName {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

/// What kind of element a resolved name ultimately selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupByElementType {
    Dimension,
    TimeDimension,
    Entity,
    Metric,
}

/// Everything the layer above needs to validate or render one resolved name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DunderNameDescriptor {
    pub element_type: GroupByElementType,
    /// The grain the name reads at, when it is a time access.
    pub time_grain: Option<ExpandedTimeGranularity>,
    /// The extracted calendar part, when it is a date-part access.
    pub date_part: Option<DatePart>,
    pub properties: BTreeSet<GroupByItemProperty>,
    /// Models defining the selected element.
    pub owning_model_ids: Vec<ModelReference>,
    /// The full model trail the recipe reads and joins, source first.
    pub derived_from_model_ids: Vec<ModelReference>,
}

impl DunderNameDescriptor {
    /// Folds another descriptor for the same name into this one: provenance
    /// concatenates (first occurrence kept), properties union. The element
    /// type and time access of the first operand win.
    pub fn merge(&mut self, other: &DunderNameDescriptor) {
        for model in &other.owning_model_ids {
            if !self.owning_model_ids.contains(model) {
                self.owning_model_ids.push(model.clone());
            }
        }
        for model in &other.derived_from_model_ids {
            if !self.derived_from_model_ids.contains(model) {
                self.derived_from_model_ids.push(model.clone());
            }
        }
        self.properties.extend(other.properties.iter().copied());
    }
}

/// One fully resolved group-by item: the descriptor plus the recipe that
/// computes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedGroupByItem {
    pub descriptor: DunderNameDescriptor,
    pub recipe: AttributeRecipe,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct TrieNode {
    children: BTreeMap<String, TrieNode>,
    entry: Option<ResolvedGroupByItem>,
}

/// Maps dunder names to resolved group-by items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DunderNameTrie {
    root: TrieNode,
    len: usize,
}

impl DunderNameTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resolved names in the trie.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts an item, returning the item it displaced if the name was
    /// already present.
    pub fn insert(
        &mut self,
        name: DunderName,
        item: ResolvedGroupByItem,
    ) -> Option<ResolvedGroupByItem> {
        let mut node = &mut self.root;
        for segment in name.segments() {
            node = node.children.entry(segment.clone()).or_default();
        }
        let displaced = node.entry.replace(item);
        if displaced.is_none() {
            self.len += 1;
        }
        displaced
    }

    pub fn get(&self, name: &DunderName) -> Option<&ResolvedGroupByItem> {
        let mut node = &self.root;
        for segment in name.segments() {
            node = node.children.get(segment)?;
        }
        node.entry.as_ref()
    }

    pub fn contains(&self, name: &DunderName) -> bool {
        self.get(name).is_some()
    }

    /// Every resolved name with its item, in sorted segment order.
    pub fn entries(&self) -> Vec<(DunderName, &ResolvedGroupByItem)> {
        let mut out = Vec::with_capacity(self.len);
        let mut segments = Vec::new();
        Self::collect(&self.root, &mut segments, &mut out);
        out
    }

    /// Every resolved name, in sorted segment order.
    pub fn names(&self) -> Vec<DunderName> {
        self.entries().into_iter().map(|(name, _)| name).collect()
    }

    fn collect<'t>(
        node: &'t TrieNode,
        segments: &mut Vec<String>,
        out: &mut Vec<(DunderName, &'t ResolvedGroupByItem)>,
    ) {
        if let Some(entry) = &node.entry {
            out.push((DunderName::new(segments.iter().cloned()), entry));
        }
        for (segment, child) in &node.children {
            segments.push(segment.clone());
            Self::collect(child, segments, out);
            segments.pop();
        }
    }

    /// Combines tries so that every kept name has exactly one origin. A name
    /// appearing in more than one operand is ambiguous and is dropped.
    pub fn union(operands: impl IntoIterator<Item = Self>) -> Self {
        let mut candidates: BTreeMap<DunderName, Option<ResolvedGroupByItem>> = BTreeMap::new();
        for operand in operands {
            for (name, item) in operand.entries() {
                match candidates.entry(name) {
                    Entry::Vacant(slot) => {
                        slot.insert(Some(item.clone()));
                    }
                    Entry::Occupied(mut slot) => {
                        slot.get_mut().take();
                    }
                }
            }
        }

        let mut trie = Self::new();
        for (name, item) in candidates {
            if let Some(item) = item {
                trie.insert(name, item);
            }
        }
        trie
    }

    /// Keeps only names present in every operand, merging their descriptors.
    /// The first operand's recipe survives for each kept name.
    pub fn intersect_merge(operands: impl IntoIterator<Item = Self>) -> Self {
        let mut operands = operands.into_iter();
        let Some(first) = operands.next() else {
            return Self::new();
        };

        let mut merged: BTreeMap<DunderName, ResolvedGroupByItem> = first
            .entries()
            .into_iter()
            .map(|(name, item)| (name, item.clone()))
            .collect();
        for operand in operands {
            merged.retain(|name, item| match operand.get(name) {
                Some(theirs) => {
                    item.descriptor.merge(&theirs.descriptor);
                    true
                }
                None => false,
            });
        }

        let mut trie = Self::new();
        for (name, item) in merged {
            trie.insert(name, item);
        }
        trie
    }
}

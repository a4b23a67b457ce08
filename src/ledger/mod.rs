//! Pre-edit snapshots of every container the engine has rewritten.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Named sub-fields of a structured widget, e.g. `whole` and `fraction`.
pub type FieldMap = BTreeMap<String, String>;

/// Which rewrite strategy a container needs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// A single run of free text.
    Generic,
    /// A widget whose price is spread over several display fields.
    MultiFieldStructured,
}

/// Displayed content of a container, either as handed to the engine or as
/// recorded before the first edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerState {
    Plain(String),
    Structured(FieldMap),
}

impl ContainerState {
    pub fn kind(&self) -> WidgetKind {
        match self {
            ContainerState::Plain(_) => WidgetKind::Generic,
            ContainerState::Structured(_) => WidgetKind::MultiFieldStructured,
        }
    }

    pub fn as_plain(&self) -> Option<&str> {
        match self {
            ContainerState::Plain(text) => Some(text),
            ContainerState::Structured(_) => None,
        }
    }

    pub fn as_fields(&self) -> Option<&FieldMap> {
        match self {
            ContainerState::Plain(_) => None,
            ContainerState::Structured(fields) => Some(fields),
        }
    }
}

/// Maps container identities to their original content.
///
/// A container moves from unseen to edited on its first recorded rewrite and
/// back to unseen when [`RevertLedger::restore_all`] drains it. Later records
/// for an edited container are ignored, so the stored text is always the
/// true original no matter how many passes touched it.
#[derive(Debug, Clone)]
pub struct RevertLedger<Id> {
    originals: HashMap<Id, ContainerState>,
    order: Vec<Id>,
}

impl<Id> Default for RevertLedger<Id> {
    fn default() -> Self {
        Self {
            originals: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<Id: Clone + Eq + Hash + Debug> RevertLedger<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `original` unless `id` is already recorded. Returns whether it
    /// was stored.
    pub fn record_if_absent(&mut self, id: Id, original: ContainerState) -> bool {
        if self.originals.contains_key(&id) {
            trace!(?id, "container already recorded");
            return false;
        }
        trace!(?id, kind = ?original.kind(), "recording original content");
        self.order.push(id.clone());
        self.originals.insert(id, original);
        true
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.originals.contains_key(id)
    }

    pub fn original(&self, id: &Id) -> Option<&ContainerState> {
        self.originals.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drains every recorded original in the order it was first recorded.
    pub fn restore_all(&mut self) -> Vec<(Id, ContainerState)> {
        let originals = &mut self.originals;
        self.order
            .drain(..)
            .filter_map(|id| originals.remove(&id).map(|state| (id, state)))
            .collect()
    }
}

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;

use price_rounder::{
    ledger::{ContainerState, FieldMap},
    ContentHost, RounderError, Settings,
};

/// In-memory page: numbered containers, optionally nested under a parent.
#[derive(Debug, Default)]
pub struct FakeHost {
    pub settings: Settings,
    pub containers: BTreeMap<u32, ContainerState>,
    pub parents: HashMap<u32, u32>,
    pub restored: Vec<u32>,
    /// Containers whose restore fails with an I/O error.
    pub locked: HashSet<u32>,
}

impl FakeHost {
    pub fn with_text(spans: &[(u32, &str)]) -> Self {
        let mut host = Self::default();
        for (id, text) in spans {
            host.insert_text(*id, text);
        }
        host
    }

    pub fn insert_text(&mut self, id: u32, text: &str) {
        self.containers
            .insert(id, ContainerState::Plain(text.to_string()));
    }

    pub fn insert_widget(&mut self, id: u32, fields: &[(&str, &str)]) {
        self.containers
            .insert(id, ContainerState::Structured(fields_of(fields)));
    }

    pub fn insert_child(&mut self, parent: u32, id: u32, text: &str) {
        self.parents.insert(id, parent);
        self.insert_text(id, text);
    }

    pub fn remove(&mut self, id: u32) {
        self.containers.remove(&id);
    }

    pub fn text(&self, id: u32) -> &str {
        self.containers
            .get(&id)
            .and_then(ContainerState::as_plain)
            .unwrap_or_default()
    }

    pub fn fields(&self, id: u32) -> FieldMap {
        self.containers
            .get(&id)
            .and_then(ContainerState::as_fields)
            .cloned()
            .unwrap_or_default()
    }

    fn in_scope(&self, id: u32, scope: Option<&u32>) -> bool {
        let Some(scope) = scope else {
            return true;
        };
        let mut current = Some(id);
        while let Some(node) = current {
            if node == *scope {
                return true;
            }
            current = self.parents.get(&node).copied();
        }
        false
    }
}

impl ContentHost<u32> for FakeHost {
    fn settings(&self) -> Settings {
        self.settings
    }

    fn for_each_content_span(
        &mut self,
        scope: Option<&u32>,
        visit: &mut dyn FnMut(&u32, &ContainerState) -> Option<ContainerState>,
    ) {
        let ids: Vec<u32> = self
            .containers
            .keys()
            .copied()
            .filter(|id| self.in_scope(*id, scope))
            .collect();
        for id in ids {
            let Some(current) = self.containers.get(&id).cloned() else {
                continue;
            };
            if let Some(updated) = visit(&id, &current) {
                self.containers.insert(id, updated);
            }
        }
    }

    fn restore(&mut self, id: &u32, original: &ContainerState) -> price_rounder::Result<()> {
        if self.locked.contains(id) {
            return Err(RounderError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("container {id} is read-only"),
            )));
        }
        match self.containers.get_mut(id) {
            Some(slot) => {
                *slot = original.clone();
                self.restored.push(*id);
                Ok(())
            }
            None => Err(RounderError::StaleContainer(format!("container {id} detached"))),
        }
    }
}

pub fn fields_of(pairs: &[(&str, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

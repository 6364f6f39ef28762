//! Registry of known bus channels
//!
//! Built once from the static channel table and never mutated afterwards,
//! so it can be shared between threads behind a plain `Arc` without locking.

use crate::defaults::reference_table;
use crate::error::RegistryError;
use can_dash_types::{ChannelDescriptor, ChannelId, ChannelTableEntry};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Lookup from bus identifier to channel metadata
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    /// Descriptors in table order; `descriptor.index` is its position here
    channels: Vec<ChannelDescriptor>,
    by_id: HashMap<ChannelId, usize>,
}

impl ChannelRegistry {
    /// Build a registry from a channel table
    pub fn from_table(table: &[ChannelTableEntry]) -> Result<Self, RegistryError> {
        if table.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut channels = Vec::with_capacity(table.len());
        let mut by_id = HashMap::with_capacity(table.len());
        let mut names = HashSet::with_capacity(table.len());

        for (index, entry) in table.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(RegistryError::EmptyName(entry.id));
            }
            if by_id.insert(entry.id, index).is_some() {
                return Err(RegistryError::DuplicateId(entry.id));
            }
            if !names.insert(entry.name.as_str()) {
                return Err(RegistryError::DuplicateName(entry.name.clone()));
            }
            channels.push(ChannelDescriptor {
                id: entry.id,
                name: entry.name.clone(),
                precision: entry.precision,
                index,
            });
        }

        Ok(Self { channels, by_id })
    }

    /// Registry for the reference 18-channel dash
    pub fn reference() -> Self {
        REFERENCE_REGISTRY.clone()
    }

    /// Find the channel for a bus identifier.
    ///
    /// `None` means the frame belongs to traffic this dash does not show.
    pub fn lookup(&self, id: ChannelId) -> Option<&ChannelDescriptor> {
        self.by_id.get(&id).map(|&index| &self.channels[index])
    }

    /// Channel by slot index
    pub fn get(&self, index: usize) -> Option<&ChannelDescriptor> {
        self.channels.get(index)
    }

    pub fn by_name(&self, name: &str) -> Option<&ChannelDescriptor> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Channels in table order
    pub fn iter(&self) -> impl Iterator<Item = &ChannelDescriptor> {
        self.channels.iter()
    }

    /// Convert back into table form (used by `--save-config`)
    pub fn to_table(&self) -> Vec<ChannelTableEntry> {
        self.channels
            .iter()
            .map(|c| ChannelTableEntry {
                id: c.id,
                name: c.name.clone(),
                precision: c.precision,
            })
            .collect()
    }
}

static REFERENCE_REGISTRY: Lazy<ChannelRegistry> = Lazy::new(|| {
    match ChannelRegistry::from_table(&reference_table()) {
        Ok(registry) => registry,
        // The reference table is a literal; a failure here is a typo in defaults.rs
        Err(e) => panic!("reference channel table is invalid: {}", e),
    }
});

//! Live per-channel values shared between the ingestion and presentation sides
//!
//! Each channel owns one slot holding the bits of its last quantized f32 in an
//! `AtomicU32`. The ingestion thread is the only writer; any number of readers
//! may load a slot at any time and always get a whole value (the initial 0.0,
//! or something the writer stored), never a mix of two.

use crate::error::StateError;
use crate::quantize::{round_to_precision, same_reading};
use crate::registry::ChannelRegistry;
use can_dash_types::{ChannelId, Precision};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Result of feeding one reading into the table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOutcome {
    /// The quantized value differs from the stored one and was stored
    Changed(f32),
    /// The quantized value matches what is already stored
    Unchanged,
}

struct ChannelSlot {
    id: ChannelId,
    precision: Precision,
    bits: AtomicU32,
}

impl ChannelSlot {
    fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }

    fn apply(&self, raw: f32) -> UpdateOutcome {
        let quantized = round_to_precision(raw, self.precision);
        if same_reading(quantized, self.load()) {
            return UpdateOutcome::Unchanged;
        }
        self.bits.store(quantized.to_bits(), Ordering::Release);
        UpdateOutcome::Changed(quantized)
    }
}

/// Latest quantized value of every known channel
pub struct ChannelStateTable {
    registry: Arc<ChannelRegistry>,
    slots: Box<[ChannelSlot]>,
}

impl ChannelStateTable {
    /// One slot per registry channel, all starting at 0.0
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        let slots = registry
            .iter()
            .map(|c| ChannelSlot {
                id: c.id,
                precision: c.precision,
                bits: AtomicU32::new(0.0f32.to_bits()),
            })
            .collect();
        Self { registry, slots }
    }

    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.registry
    }

    /// Quantize `raw` for channel `id` and store it if it changed.
    ///
    /// Writers must be serialized (one ingestion thread); readers need not be.
    pub fn update(&self, id: ChannelId, raw: f32) -> Result<UpdateOutcome, StateError> {
        let desc = self
            .registry
            .lookup(id)
            .ok_or(StateError::UnknownChannel(id))?;
        Ok(self.slots[desc.index].apply(raw))
    }

    /// Same as [`update`](Self::update) for a channel already resolved by the registry.
    ///
    /// Panics if `index` is out of range; indices come from this table's registry.
    pub fn update_slot(&self, index: usize, raw: f32) -> UpdateOutcome {
        self.slots[index].apply(raw)
    }

    /// Current value of a channel, `None` for unknown ids
    pub fn get(&self, id: ChannelId) -> Option<f32> {
        self.registry
            .lookup(id)
            .map(|desc| self.slots[desc.index].load())
    }

    pub fn value_at(&self, index: usize) -> Option<f32> {
        self.slots.get(index).map(ChannelSlot::load)
    }

    /// Every channel's current value in table order.
    ///
    /// Each value is read independently; there is no cross-channel consistency.
    pub fn snapshot(&self) -> Vec<(ChannelId, f32)> {
        self.slots.iter().map(|s| (s.id, s.load())).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl std::fmt::Debug for ChannelStateTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|s| (s.id, s.load())))
            .finish()
    }
}

//! # Batch Registry
//!
//! Owns the flat per-frame buffers. Every active instance occupies one slot
//! of `capacity` particles; slot `s` starts at particle `s * capacity`.
//! Admission and release requests can be queued from any thread through
//! `&self` and are applied together by [`BatchRegistry::apply_pending`] at
//! the start of a frame, so the buffers never change while passes run.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::builder::BuiltChain;
use crate::error::BuildError;
use crate::host::{TransformHandle, TransformWrite};
use crate::steps::write_back;
use crate::types::{ColliderId, HeadInfo, InstanceId, Particle, DEFAULT_PARTICLE_CAPACITY};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum PendingOp {
    Admit(InstanceId),
    Release(InstanceId),
}

#[derive(Debug)]
pub struct BatchRegistry {
    capacity: usize,
    heads: Vec<HeadInfo>,
    particles: Vec<Particle>,
    bindings: Vec<Option<TransformHandle>>,
    /// Explicit collider list per active slot.
    collider_lists: Vec<Vec<ColliderId>>,
    slots: HashMap<InstanceId, usize>,
    chains: HashMap<InstanceId, BuiltChain>,
    pending: Mutex<Vec<PendingOp>>,
    next_id: u32,
}

impl Default for BatchRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_PARTICLE_CAPACITY)
    }
}

impl BatchRegistry {
    /// Creates an empty registry with `capacity` particle slots per instance
    /// (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            heads: Vec::new(),
            particles: Vec::new(),
            bindings: Vec::new(),
            collider_lists: Vec::new(),
            slots: HashMap::new(),
            chains: HashMap::new(),
            pending: Mutex::new(Vec::new()),
            next_id: 0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of active instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heads.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    /// Number of registered chains, active or not.
    #[must_use]
    pub fn registered(&self) -> usize {
        self.chains.len()
    }

    #[must_use]
    pub fn is_registered(&self, id: InstanceId) -> bool {
        self.chains.contains_key(&id)
    }

    #[must_use]
    pub fn is_active(&self, id: InstanceId) -> bool {
        self.slots.contains_key(&id)
    }

    #[must_use]
    pub fn slot_of(&self, id: InstanceId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    /// Stores a built chain and hands out its id. The chain is inactive until
    /// admitted.
    ///
    /// # Errors
    ///
    /// [`BuildError::CapacityExceeded`] if the chain has more particles than
    /// one slot holds; nothing is stored in that case.
    pub fn register(&mut self, mut chain: BuiltChain) -> Result<InstanceId, BuildError> {
        let count = chain.particles.len().max(chain.head.particle_count as usize);
        if count > self.capacity {
            return Err(BuildError::CapacityExceeded { count, capacity: self.capacity });
        }
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        chain.head.instance = id;
        self.chains.insert(id, chain);
        Ok(id)
    }

    /// Releases `id` immediately and forgets its chain.
    pub fn unregister(&mut self, id: InstanceId) -> Option<BuiltChain> {
        self.release(id);
        self.chains.remove(&id)
    }

    pub fn queue_admit(&self, id: InstanceId) {
        self.pending.lock().push(PendingOp::Admit(id));
    }

    pub fn queue_release(&self, id: InstanceId) {
        self.pending.lock().push(PendingOp::Release(id));
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Applies every queued request in submission order. Returns how many
    /// requests changed the active set.
    pub fn apply_pending(&mut self) -> usize {
        let ops = std::mem::take(&mut *self.pending.lock());
        ops.into_iter()
            .filter(|op| match *op {
                PendingOp::Admit(id) => self.admit(id),
                PendingOp::Release(id) => self.release(id),
            })
            .count()
    }

    /// Places a registered chain in the next free slot, starting from its
    /// build-time state. Returns `false` if it is unknown or already active.
    pub fn admit(&mut self, id: InstanceId) -> bool {
        if self.slots.contains_key(&id) {
            tracing::debug!(?id, "admit ignored: already active");
            return false;
        }
        let Some(chain) = self.chains.get(&id) else {
            tracing::debug!(?id, "admit ignored: unknown instance");
            return false;
        };

        let slot = self.heads.len();
        let offset = slot * self.capacity;
        let mut head = chain.head;
        head.offset = offset as u32;
        head.reset_pending = true;

        self.heads.push(head);
        self.particles.extend_from_slice(&chain.particles);
        self.particles.resize(offset + self.capacity, Particle::default());
        self.bindings.extend_from_slice(&chain.bindings);
        self.bindings.resize(offset + self.capacity, None);
        self.collider_lists.push(chain.colliders.clone());
        self.slots.insert(id, slot);

        tracing::debug!(?id, slot, particles = head.particle_count, "instance admitted");
        true
    }

    /// Removes `id` from the active set. The last slot's block moves into the
    /// freed slot; only that instance's offset changes.
    pub fn release(&mut self, id: InstanceId) -> bool {
        let Some(slot) = self.slots.remove(&id) else {
            tracing::debug!(?id, "release ignored: not active");
            return false;
        };
        let cap = self.capacity;
        let last = self.heads.len() - 1;

        self.heads.swap_remove(slot);
        self.collider_lists.swap_remove(slot);
        if slot != last {
            self.particles.copy_within(last * cap..(last + 1) * cap, slot * cap);
            self.bindings.copy_within(last * cap..(last + 1) * cap, slot * cap);
            let moved = &mut self.heads[slot];
            moved.offset = (slot * cap) as u32;
            self.slots.insert(moved.instance, slot);
        }
        self.particles.truncate(last * cap);
        self.bindings.truncate(last * cap);

        tracing::debug!(?id, slot, "instance released");
        true
    }

    #[must_use]
    pub fn heads(&self) -> &[HeadInfo] {
        &self.heads
    }

    /// The whole particle buffer, padding included.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[must_use]
    pub fn bindings(&self) -> &[Option<TransformHandle>] {
        &self.bindings
    }

    #[must_use]
    pub fn collider_lists(&self) -> &[Vec<ColliderId>] {
        &self.collider_lists
    }

    #[must_use]
    pub fn head(&self, id: InstanceId) -> Option<&HeadInfo> {
        self.slot_of(id).map(|slot| &self.heads[slot])
    }

    /// Live particles of an active instance.
    #[must_use]
    pub fn particles_of(&self, id: InstanceId) -> Option<&[Particle]> {
        let slot = self.slot_of(id)?;
        let start = slot * self.capacity;
        let count = self.heads[slot].particle_count as usize;
        Some(&self.particles[start..start + count])
    }

    #[must_use]
    pub fn chain(&self, id: InstanceId) -> Option<&BuiltChain> {
        self.chains.get(&id)
    }

    /// Applies `f` to the stored head of a registered chain and, when it is
    /// active, to its live head as well.
    pub fn update_head(&mut self, id: InstanceId, f: impl Fn(&mut HeadInfo)) -> bool {
        let Some(chain) = self.chains.get_mut(&id) else {
            return false;
        };
        f(&mut chain.head);
        if let Some(&slot) = self.slots.get(&id) {
            f(&mut self.heads[slot]);
        }
        true
    }

    /// Mutable head array and particle buffer, split for dispatch.
    pub fn active_buffers_mut(&mut self) -> (&mut [HeadInfo], &mut [Particle]) {
        (&mut self.heads, &mut self.particles)
    }

    /// Pushes every real particle's pose to the host, slot by slot. Returns
    /// the number of transforms written.
    pub fn write_back<W: TransformWrite + ?Sized>(&self, host: &mut W) -> usize {
        self.heads
            .iter()
            .map(|head| {
                let start = head.offset as usize;
                let end = start + head.particle_count as usize;
                write_back(host, &self.particles[start..end], &self.bindings[start..end])
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Pose;

    fn chain(particles: usize) -> BuiltChain {
        let mut head = HeadInfo::new(InstanceId(0), TransformHandle(0), Pose::IDENTITY);
        head.particle_count = particles as u32;
        BuiltChain {
            head,
            particles: (0..particles)
                .map(|i| Particle {
                    index: i as u32,
                    parent: i as i32 - 1,
                    ..Particle::default()
                })
                .collect(),
            bindings: (0..particles).map(|i| Some(TransformHandle(i as u32 + 1))).collect(),
            colliders: Vec::new(),
            total_length: 0.0,
        }
    }

    #[test]
    fn admit_fills_fixed_stride_slots() {
        let mut reg = BatchRegistry::new(4);
        let a = reg.register(chain(2)).unwrap();
        let b = reg.register(chain(3)).unwrap();
        assert!(reg.admit(a));
        assert!(reg.admit(b));
        assert!(!reg.admit(a));

        assert_eq!(reg.len(), 2);
        assert_eq!(reg.particles().len(), 8);
        assert_eq!(reg.bindings().len(), 8);
        assert_eq!(reg.head(b).unwrap().offset, 4);
        assert_eq!(reg.particles_of(b).unwrap().len(), 3);
        assert_eq!(reg.bindings()[3], None);
    }

    #[test]
    fn oversized_chain_is_refused() {
        let mut reg = BatchRegistry::new(4);
        let err = reg.register(chain(10)).unwrap_err();
        assert_eq!(err, BuildError::CapacityExceeded { count: 10, capacity: 4 });
        assert_eq!(reg.registered(), 0);
        assert!(!reg.admit(InstanceId(0)));
        assert!(reg.particles().is_empty());
    }

    #[test]
    fn releasing_unknown_or_inactive_is_noop() {
        let mut reg = BatchRegistry::new(4);
        let a = reg.register(chain(2)).unwrap();
        assert!(!reg.release(a));
        assert!(!reg.release(InstanceId(77)));
        assert!(!reg.admit(InstanceId(77)));
        assert!(reg.is_empty());
    }

    #[test]
    fn queued_ops_apply_in_order() {
        let mut reg = BatchRegistry::new(4);
        let a = reg.register(chain(2)).unwrap();
        reg.queue_admit(a);
        reg.queue_release(a);
        reg.queue_admit(a);
        assert_eq!(reg.pending_len(), 3);
        assert_eq!(reg.apply_pending(), 3);
        assert!(reg.is_active(a));
        assert_eq!(reg.pending_len(), 0);
    }

    #[test]
    fn update_head_reaches_live_and_stored_copies() {
        let mut reg = BatchRegistry::new(4);
        let a = reg.register(chain(2)).unwrap();
        reg.admit(a);
        assert!(reg.update_head(a, |h| h.weight = 0.25));
        assert_eq!(reg.head(a).unwrap().weight, 0.25);
        reg.release(a);
        reg.admit(a);
        assert_eq!(reg.head(a).unwrap().weight, 0.25);
        assert!(!reg.update_head(InstanceId(9), |h| h.weight = 0.0));
    }
}

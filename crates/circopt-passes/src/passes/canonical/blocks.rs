//! Qubit block collection.
//!
//! Unitary operations are grouped into blocks acting on at most
//! `max_block_size` qubits. Blocks are tracked with a disjoint-set union
//! over qubits; each root owns the block's member list, its accumulated
//! compound body and its anchor, the slot where the block will be written
//! back once it is finalized.
//!
//! Operations are moved out of their slots as they join a block, leaving
//! tombstones that are compacted at the end.

use std::collections::{BTreeMap, BTreeSet};

use circopt_ir::{Circuit, CompoundOperation, Operation, QubitId};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::passes::dynamic::defer_measurements;
use crate::passes::simplify::remove_identities;
use crate::property::PropertySet;

use super::reorder::reorder_operations;

type Slots = Vec<Option<Operation>>;

#[derive(Debug, Default)]
struct BlockTracker {
    max_block_size: usize,
    parent: BTreeMap<QubitId, QubitId>,
    members: FxHashMap<QubitId, Vec<QubitId>>,
    bodies: FxHashMap<QubitId, CompoundOperation>,
    anchors: FxHashMap<QubitId, usize>,
    /// Latest slot holding an operation on the qubit that will not move.
    last_fixed: FxHashMap<QubitId, usize>,
    finalized: usize,
}

impl BlockTracker {
    fn new(max_block_size: usize) -> Self {
        Self {
            max_block_size,
            ..Self::default()
        }
    }

    fn find(&mut self, qubit: QubitId) -> QubitId {
        if !self.parent.contains_key(&qubit) {
            self.parent.insert(qubit, qubit);
            self.members.insert(qubit, vec![qubit]);
            return qubit;
        }

        let mut root = qubit;
        while let Some(&next) = self.parent.get(&root) {
            if next == root {
                break;
            }
            root = next;
        }

        let mut current = qubit;
        while current != root {
            current = self.parent.insert(current, root).unwrap_or(root);
        }
        root
    }

    fn size(&self, root: QubitId) -> usize {
        self.members.get(&root).map_or(1, Vec::len)
    }

    fn body_len(&self, root: QubitId) -> usize {
        self.bodies.get(&root).map_or(0, CompoundOperation::len)
    }

    fn is_empty_block(&mut self, qubit: QubitId) -> bool {
        let root = self.find(qubit);
        !self.anchors.contains_key(&root)
    }

    /// Merge the blocks of `a` and `b`. The block with the larger body
    /// becomes the root; the merged block is anchored at the later anchor.
    fn union(&mut self, a: QubitId, b: QubitId) {
        let (mut keep, mut merged) = (self.find(a), self.find(b));
        if keep == merged {
            return;
        }
        if self.body_len(keep) < self.body_len(merged) {
            std::mem::swap(&mut keep, &mut merged);
        }

        self.parent.insert(merged, keep);
        if let Some(body) = self.bodies.remove(&merged) {
            self.bodies.entry(keep).or_default().merge(body);
        }
        let moved = self.members.remove(&merged).unwrap_or_default();
        self.members.entry(keep).or_default().extend(moved);

        let anchor = match (self.anchors.remove(&keep), self.anchors.remove(&merged)) {
            (Some(x), Some(y)) => Some(x.max(y)),
            (x, y) => x.or(y),
        };
        if let Some(anchor) = anchor {
            self.anchors.insert(keep, anchor);
        }
    }

    /// Write the block of `qubit` back to its anchor and dissolve it.
    fn finalize(&mut self, qubit: QubitId, slots: &mut Slots) {
        let root = self.find(qubit);
        let Some(anchor) = self.anchors.remove(&root) else {
            return;
        };
        let body = self.bodies.remove(&root).unwrap_or_default();
        slots[anchor] = Some(body.collapse_to_single_operation());
        self.finalized += 1;

        let members = self.members.remove(&root).unwrap_or_default();
        for member in members {
            self.parent.insert(member, member);
            self.members.insert(member, vec![member]);
            self.mark_fixed(member, anchor);
        }
    }

    fn mark_fixed(&mut self, qubit: QubitId, slot: usize) {
        let entry = self.last_fixed.entry(qubit).or_insert(slot);
        *entry = (*entry).max(slot);
    }

    /// The operation alone exceeds the block size: pack the open blocks it
    /// touches largest first and finalize them all.
    fn pack_and_finalize(&mut self, used: &[QubitId], slots: &mut Slots) {
        let mut blocks: Vec<(QubitId, usize)> = Vec::new();
        for &qubit in used {
            let root = self.find(qubit);
            if self.is_empty_block(root) || blocks.iter().any(|&(r, _)| r == root) {
                continue;
            }
            blocks.push((root, self.size(root)));
        }
        blocks.sort_by(|a, b| b.1.cmp(&a.1));

        let mut i = 0;
        while i < blocks.len() {
            let (block, mut size) = blocks[i];
            if size < self.max_block_size {
                let mut j = i + 1;
                while j < blocks.len() && size < self.max_block_size {
                    let (next, next_size) = blocks[j];
                    if size + next_size <= self.max_block_size {
                        self.union(block, next);
                        size += next_size;
                        blocks.remove(j);
                    } else {
                        j += 1;
                    }
                }
            }
            self.finalize(block, slots);
            i += 1;
        }
    }

    /// Finalize the touched blocks that free the most room until the
    /// operation fits.
    fn finalize_by_savings(&mut self, used: &[QubitId], slots: &mut Slots) {
        let mut savings: Vec<(QubitId, usize)> = Vec::new();
        let mut total = 0usize;
        for &qubit in used {
            let root = self.find(qubit);
            if let Some(entry) = savings.iter_mut().find(|(r, _)| *r == root) {
                entry.1 = entry.1.saturating_sub(1);
            } else {
                let size = self.size(root);
                savings.push((root, size - 1));
                total += size;
            }
        }
        savings.sort_by(|a, b| b.1.cmp(&a.1));

        let mut need = total.saturating_sub(self.max_block_size);
        for (root, saving) in savings {
            if need == 0 {
                break;
            }
            need = need.saturating_sub(saving);
            self.finalize(root, slots);
        }
    }

    /// Finalize open blocks anchored before an operation that is already
    /// fixed on one of the fresh qubits in `used`; joining them would move
    /// the new operation in front of it.
    fn release_stale(&mut self, used: &[QubitId], slots: &mut Slots) {
        let mut max_fixed = None;
        for &qubit in used {
            if self.is_empty_block(qubit) {
                max_fixed = max_fixed.max(self.last_fixed.get(&qubit).copied());
            }
        }
        let Some(max_fixed) = max_fixed else {
            return;
        };

        let roots: BTreeSet<QubitId> = used.iter().map(|&q| self.find(q)).collect();
        for root in roots {
            if self.anchors.get(&root).is_some_and(|&anchor| anchor < max_fixed) {
                self.finalize(root, slots);
            }
        }
    }

    /// Move the operation in `slot` into the block of `used`.
    fn absorb(&mut self, used: &[QubitId], slot: usize, slots: &mut Slots) {
        for pair in used.windows(2) {
            self.union(pair[0], pair[1]);
        }
        let Some(&first) = used.first() else {
            return;
        };
        let root = self.find(first);
        if let Some(op) = slots[slot].take() {
            self.bodies.entry(root).or_default().push(op);
        }
        self.anchors.entry(root).or_insert(slot);
    }

    fn finalize_all(&mut self, slots: &mut Slots) {
        let qubits: Vec<QubitId> = self.parent.keys().copied().collect();
        for qubit in qubits {
            self.finalize(qubit, slots);
        }
    }
}

/// Group unitary operations into compound blocks of at most
/// `max_block_size` qubits.
///
/// The circuit is first brought into canonical order and its measurements
/// are deferred. Non-unitary operations close the blocks of the qubits they
/// touch. When an operation would grow a block beyond the limit, open
/// blocks are closed first: if the operation alone is too wide, the blocks
/// it touches are packed largest first and closed; otherwise the blocks
/// freeing the most room are closed until it fits. Single-operation blocks
/// are written back as the plain operation.
///
/// # Errors
///
/// [`CompileError::InvalidConfiguration`] for a block size of zero, and any
/// error raised by measurement deferral.
pub fn collect_blocks(circuit: &mut Circuit, max_block_size: usize) -> CompileResult<()> {
    if circuit.num_ops() <= 1 {
        return Ok(());
    }
    if max_block_size == 0 {
        return Err(CompileError::InvalidConfiguration(
            "max_block_size must be at least 1".to_string(),
        ));
    }

    reorder_operations(circuit)?;
    defer_measurements(circuit)?;

    let mut slots: Slots = circuit.take_ops().into_iter().map(Some).collect();
    let mut tracker = BlockTracker::new(max_block_size);

    for slot in 0..slots.len() {
        let Some(op) = slots[slot].as_ref() else {
            continue;
        };
        let used: Vec<QubitId> = op.used_qubits().into_iter().collect();
        if used.is_empty() {
            continue;
        }

        if !op.is_unitary() {
            for &qubit in &used {
                tracker.finalize(qubit, &mut slots);
                tracker.mark_fixed(qubit, slot);
            }
            continue;
        }

        let roots: BTreeSet<QubitId> = used.iter().map(|&q| tracker.find(q)).collect();
        let combined: usize = roots.iter().map(|&r| tracker.size(r)).sum();
        if combined > max_block_size {
            if used.len() > max_block_size {
                tracker.pack_and_finalize(&used, &mut slots);
            } else {
                tracker.finalize_by_savings(&used, &mut slots);
            }
        }

        if used.len() > max_block_size {
            for &qubit in &used {
                tracker.mark_fixed(qubit, slot);
            }
            continue;
        }

        tracker.release_stale(&used, &mut slots);
        tracker.absorb(&used, slot, &mut slots);
    }

    tracker.finalize_all(&mut slots);
    circuit.set_ops(slots.into_iter().flatten().collect());
    remove_identities(circuit);

    debug!(
        blocks = tracker.finalized,
        ops = circuit.num_ops(),
        max_block_size,
        "collected blocks"
    );
    Ok(())
}

/// Pass wrapper for [`collect_blocks`].
#[derive(Debug, Clone, Copy)]
pub struct CollectBlocks {
    max_block_size: usize,
}

impl CollectBlocks {
    /// Create a new block collection pass.
    pub fn new(max_block_size: usize) -> Self {
        Self { max_block_size }
    }

    /// Maximum number of qubits per block.
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }
}

impl Pass for CollectBlocks {
    fn name(&self) -> &'static str {
        "collect_blocks"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, _properties: &mut PropertySet) -> CompileResult<()> {
        collect_blocks(circuit, self.max_block_size)
    }
}

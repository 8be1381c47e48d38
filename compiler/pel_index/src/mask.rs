//! Mask enumeration and canonicalization.
//!
//! Raw masks are enumerated in ascending numeric order and slots assigned
//! on first sighting of each effective mask, so slot 0 is always the
//! all-absent specialization and the layout is reproducible across runs.

use pel_ir::ExprId;
use rustc_hash::FxHashMap;

use crate::field_trie::FieldFrequency;

/// The canonical specialization layout for one selected-fields list.
pub(crate) struct MaskPlan {
    /// Slot for every raw mask in `[0, 2^N)`, indexed by the mask itself.
    pub(crate) mask_to_slot: Vec<usize>,
    /// The distinct effective masks, in slot order.
    pub(crate) effective_masks: Vec<u8>,
}

/// Enumerate all raw masks over `fields` and deduplicate by effective mask.
pub(crate) fn plan(fields: &[FieldFrequency]) -> MaskPlan {
    debug_assert!(fields.len() <= 8, "mask must fit in one byte");
    let count = 1usize << fields.len();
    let mut mask_to_slot = Vec::with_capacity(count);
    let mut effective_masks: Vec<u8> = Vec::new();
    let mut slot_by_effective: FxHashMap<u8, usize> = FxHashMap::default();
    for mask in 0..count {
        let effective = effective_mask(mask as u8, fields);
        let slot = match slot_by_effective.get(&effective).copied() {
            Some(slot) => slot,
            None => {
                let slot = effective_masks.len();
                effective_masks.push(effective);
                slot_by_effective.insert(effective, slot);
                slot
            }
        };
        mask_to_slot.push(slot);
    }
    MaskPlan { mask_to_slot, effective_masks }
}

/// Clear every bit whose field has an absent parent in the list.
///
/// A single forward pass suffices: parents have strictly higher
/// frequencies than their children (the trie bumps a parent's count on
/// every child test), so a parent always sits at a lower index.
pub(crate) fn effective_mask(mask: u8, fields: &[FieldFrequency]) -> u8 {
    let mut effective = 0u8;
    let mut decided: FxHashMap<ExprId, bool> = FxHashMap::default();
    for (i, field) in fields.iter().enumerate() {
        let bit = 1u8 << i;
        if field.parent_id().is_valid() && decided.get(&field.parent_id()) == Some(&false) {
            decided.insert(field.id(), false);
            continue;
        }
        if mask & bit == bit {
            decided.insert(field.id(), true);
            effective |= bit;
        } else {
            decided.insert(field.id(), false);
        }
    }
    effective
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_trie::FieldTrie;
    use proptest::prelude::*;

    /// Build a selected-fields list from (path, id) pairs the way the
    /// indexer does: through the trie.
    fn fields_of(paths: &[(&str, u32)]) -> Vec<FieldFrequency> {
        let mut trie = FieldTrie::new();
        for &(path, id) in paths {
            trie.add(path, ExprId::new(id));
        }
        trie.sorted_presence_fields()
    }

    #[test]
    fn independent_fields_pass_through() {
        let fields = fields_of(&[("a.b", 1), ("b.c", 2)]);
        for mask in 0..4u8 {
            assert_eq!(effective_mask(mask, &fields), mask);
        }
        let plan = plan(&fields);
        assert_eq!(plan.mask_to_slot, vec![0, 1, 2, 3]);
        assert_eq!(plan.effective_masks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn absent_parent_forces_child_absent() {
        // Order: a.b (freq 2, bit 0), a.b.c (freq 1, bit 1).
        let fields = fields_of(&[("a.b", 1), ("a.b.c", 2)]);
        assert_eq!(effective_mask(0b10, &fields), 0b00);
        assert_eq!(effective_mask(0b11, &fields), 0b11);
        assert_eq!(effective_mask(0b01, &fields), 0b01);
    }

    #[test]
    fn nested_plan_dedups_impossible_masks() {
        // Nested pair plus an independent field: a.b, a.b.c, b.c.
        let fields = fields_of(&[("a.b", 1), ("a.b.c", 2), ("b.c", 3)]);
        let plan = plan(&fields);
        assert_eq!(plan.mask_to_slot, vec![0, 1, 0, 2, 3, 4, 3, 5]);
        assert_eq!(plan.effective_masks, vec![0b000, 0b001, 0b011, 0b100, 0b101, 0b111]);
    }

    #[test]
    fn grandparent_gap_still_forces_absent() {
        // a.b tested, a.b.c not, a.b.c.d tested: the parent link skips the
        // untested middle node.
        let fields = fields_of(&[("a.b", 1), ("a.b.c.d", 2)]);
        assert_eq!(effective_mask(0b10, &fields), 0b00);
    }

    #[test]
    fn slot_zero_is_all_absent() {
        let fields = fields_of(&[("a.b", 1), ("a.b.c", 2), ("b.c", 3), ("c.d", 4)]);
        let plan = plan(&fields);
        assert_eq!(plan.mask_to_slot[0], 0);
        assert_eq!(plan.effective_masks[0], 0);
    }

    proptest! {
        /// Coverage: every raw mask has a slot, and every slot is valid.
        #[test]
        fn plan_covers_every_mask(paths in proptest::sample::subsequence(
            vec!["a.b", "a.b.c", "a.b.c.d", "b.c", "b.c.d", "c.d"], 1..5)
        ) {
            let pairs: Vec<(&str, u32)> =
                paths.iter().enumerate().map(|(i, &p)| (p, i as u32 + 1)).collect();
            let fields = fields_of(&pairs);
            let plan = plan(&fields);
            prop_assert_eq!(plan.mask_to_slot.len(), 1 << fields.len());
            for &slot in &plan.mask_to_slot {
                prop_assert!(slot < plan.effective_masks.len());
            }
        }

        /// Equivalence: masks with equal effective masks share a slot, and
        /// the effective mask is idempotent.
        #[test]
        fn effective_equivalence_and_idempotence(paths in proptest::sample::subsequence(
            vec!["a.b", "a.b.c", "a.b.c.d", "b.c", "b.c.d", "c.d"], 1..5)
        ) {
            let pairs: Vec<(&str, u32)> =
                paths.iter().enumerate().map(|(i, &p)| (p, i as u32 + 1)).collect();
            let fields = fields_of(&pairs);
            let plan = plan(&fields);
            let count = 1u16 << fields.len();
            for m1 in 0..count {
                let e1 = effective_mask(m1 as u8, &fields);
                prop_assert_eq!(effective_mask(e1, &fields), e1);
                for m2 in 0..count {
                    let e2 = effective_mask(m2 as u8, &fields);
                    if e1 == e2 {
                        prop_assert_eq!(
                            plan.mask_to_slot[m1 as usize],
                            plan.mask_to_slot[m2 as usize]
                        );
                    }
                }
            }
        }

        /// Parent dominance: every field's parent, when selected, sits at a
        /// lower index.
        #[test]
        fn parents_precede_children(paths in proptest::sample::subsequence(
            vec!["a.b", "a.b.c", "a.b.c.d", "b.c", "b.c.d", "c.d"], 1..6)
        ) {
            let pairs: Vec<(&str, u32)> =
                paths.iter().enumerate().map(|(i, &p)| (p, i as u32 + 1)).collect();
            let fields = fields_of(&pairs);
            for (i, field) in fields.iter().enumerate() {
                if field.parent_id().is_valid() {
                    let parent_index = fields
                        .iter()
                        .position(|f| f.id() == field.parent_id())
                        .expect("parent is in the list");
                    prop_assert!(parent_index < i);
                }
            }
        }
    }
}

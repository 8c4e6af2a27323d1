use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::defect::{Defect, Orientation};

/// Whether `cand` should replace `held` for the same line.
///
/// Global beats Part regardless of magnitude; within a class the larger diff
/// wins. Exact ties go to the lower channel, then the lower block, so the
/// winner never depends on candidate order.
pub fn outranks(cand: &Defect, held: &Defect) -> bool {
    match (cand.mode.is_global(), held.mode.is_global()) {
        (true, false) => true,
        (false, true) => false,
        _ => match cand.diff.total_cmp(&held.diff) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => (cand.channel, cand.mode) < (held.channel, held.mode),
        },
    }
}

/// Reduces raw candidates to one defect per `(orientation, index)`.
///
/// Output order: Global defects by ascending index, then Part defects by
/// ascending index; Horizontal precedes Vertical on equal index.
pub fn merge_candidates<I>(candidates: I) -> Vec<Defect>
where
    I: IntoIterator<Item = Defect>,
{
    let mut best: BTreeMap<(Orientation, usize), Defect> = BTreeMap::new();
    for cand in candidates {
        match best.entry(cand.key()) {
            Entry::Vacant(slot) => {
                slot.insert(cand);
            }
            Entry::Occupied(mut slot) => {
                if outranks(&cand, slot.get()) {
                    slot.insert(cand);
                }
            }
        }
    }

    let mut out: Vec<Defect> = best.into_values().collect();
    out.sort_by_key(|d| (d.mode.rank(), d.index, d.orientation));
    out
}

#[cfg(test)]
mod tests {
    use super::merge_candidates;
    use crate::defect::{Defect, DetectMode, Orientation};

    fn cand(orientation: Orientation, index: usize, mode: DetectMode, diff: f32) -> Defect {
        Defect {
            channel: 0,
            orientation,
            mode,
            index,
            diff,
        }
    }

    const PART: DetectMode = DetectMode::Part { by: 0, bx: 0 };

    #[test]
    fn global_beats_stronger_part() {
        let merged = merge_candidates(vec![
            cand(Orientation::Horizontal, 10, DetectMode::Global, 5.0),
            cand(Orientation::Horizontal, 10, PART, 50.0),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].mode, DetectMode::Global);
        assert_eq!(merged[0].diff, 5.0);

        let reversed = merge_candidates(vec![
            cand(Orientation::Horizontal, 10, PART, 50.0),
            cand(Orientation::Horizontal, 10, DetectMode::Global, 5.0),
        ]);
        assert_eq!(reversed, merged);
    }

    #[test]
    fn larger_diff_wins_within_class() {
        let merged = merge_candidates(vec![
            cand(Orientation::Horizontal, 4, DetectMode::Global, 5.0),
            cand(Orientation::Horizontal, 4, DetectMode::Global, 8.0),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].diff, 8.0);

        let parts = merge_candidates(vec![
            cand(Orientation::Vertical, 4, DetectMode::Part { by: 1, bx: 1 }, 30.0),
            cand(Orientation::Vertical, 4, DetectMode::Part { by: 0, bx: 2 }, 12.0),
        ]);
        assert_eq!(parts[0].mode, DetectMode::Part { by: 1, bx: 1 });
    }

    #[test]
    fn orientations_are_separate_keys() {
        let merged = merge_candidates(vec![
            cand(Orientation::Horizontal, 7, DetectMode::Global, 1.0),
            cand(Orientation::Vertical, 7, DetectMode::Global, 2.0),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].orientation, Orientation::Horizontal);
        assert_eq!(merged[1].orientation, Orientation::Vertical);
    }

    #[test]
    fn output_lists_global_then_part_by_index() {
        let merged = merge_candidates(vec![
            cand(Orientation::Horizontal, 90, PART, 11.0),
            cand(Orientation::Vertical, 50, DetectMode::Global, 21.0),
            cand(Orientation::Horizontal, 3, PART, 11.0),
            cand(Orientation::Horizontal, 60, DetectMode::Global, 25.0),
            cand(Orientation::Vertical, 8, PART, 15.0),
        ]);

        let order: Vec<_> = merged.iter().map(|d| (d.mode.rank(), d.index)).collect();
        assert_eq!(order, vec![(0, 50), (0, 60), (1, 3), (1, 8), (1, 90)]);
    }

    #[test]
    fn equal_diffs_resolve_independently_of_order() {
        let a = Defect {
            channel: 2,
            ..cand(Orientation::Horizontal, 12, DetectMode::Global, 9.0)
        };
        let b = Defect {
            channel: 1,
            ..cand(Orientation::Horizontal, 12, DetectMode::Global, 9.0)
        };

        let ab = merge_candidates(vec![a.clone(), b.clone()]);
        let ba = merge_candidates(vec![b, a]);
        assert_eq!(ab, ba);
        assert_eq!(ab[0].channel, 1);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(merge_candidates(Vec::new()).is_empty());
    }
}

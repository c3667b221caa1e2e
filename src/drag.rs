// ↕️ Drag Reorder Engine
//
// Idle -> Dragging on begin, Dragging -> Idle on drop or cancel.
//
// While dragging, every pointer move picks an insertion point among the
// other rows: a row qualifies when the pointer is strictly above its
// vertical midpoint, and the qualifying row whose midpoint is nearest wins.
// With no qualifying row the dragged row goes to the end. The list is
// reordered immediately so the preview is live.

use crate::build::BuildList;

/// Vertical extent of one rendered row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowBounds {
    pub top: f64,
    pub height: f64,
}

impl RowBounds {
    pub fn new(top: f64, height: f64) -> Self {
        RowBounds { top, height }
    }

    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        /// Where the dragged row currently sits
        position: usize,
        /// Where it started, for cancel
        origin: usize,
    },
}

/// Row to insert the dragged row before; `None` means "append to the end".
///
/// `bounds[i]` describes the row at position `i`; the dragged row is skipped.
/// Runs in a single pass over the rows.
pub fn insertion_target(bounds: &[RowBounds], dragged: usize, pointer_y: f64) -> Option<usize> {
    let mut closest: Option<(usize, f64)> = None;

    for (index, row) in bounds.iter().enumerate() {
        if index == dragged {
            continue;
        }
        let offset = pointer_y - row.midpoint();
        if offset < 0.0 && closest.map_or(true, |(_, best)| offset > best) {
            closest = Some((index, offset));
        }
    }

    closest.map(|(index, _)| index)
}

/// Final index of the dragged row after inserting it before `target`
/// (or at the end for `None`) in a list of `len` rows.
pub fn resolve_position(dragged: usize, target: Option<usize>, len: usize) -> usize {
    match target {
        Some(t) if t > dragged => t - 1,
        Some(t) => t,
        None => len.saturating_sub(1),
    }
}

#[derive(Debug, Clone, Default)]
pub struct DragReorder {
    state: DragState,
}

impl DragReorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Row currently being dragged
    pub fn dragged(&self) -> Option<usize> {
        match self.state {
            DragState::Dragging { position, .. } => Some(position),
            DragState::Idle => None,
        }
    }

    /// Start dragging the row at `position`; ignored when out of range
    pub fn begin(&mut self, position: usize, len: usize) -> bool {
        if position >= len {
            return false;
        }
        self.state = DragState::Dragging {
            position,
            origin: position,
        };
        true
    }

    /// Apply one pointer move to `list`.
    ///
    /// Returns the dragged row's new position when the order changed. Bounds
    /// that don't cover the whole list are ignored.
    pub fn pointer_moved(
        &mut self,
        list: &mut BuildList,
        bounds: &[RowBounds],
        pointer_y: f64,
    ) -> Option<usize> {
        let DragState::Dragging { position, origin } = self.state else {
            return None;
        };
        if bounds.len() != list.len() || position >= list.len() {
            return None;
        }

        let target = insertion_target(bounds, position, pointer_y);
        let new_position = resolve_position(position, target, list.len());
        if !list.move_row(position, new_position) {
            return None;
        }

        self.state = DragState::Dragging {
            position: new_position,
            origin,
        };
        Some(new_position)
    }

    /// Finish the drag; the live order becomes final.
    /// Returns `(origin, final_position)`.
    pub fn drop(&mut self) -> Option<(usize, usize)> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging { position, origin } => Some((origin, position)),
            DragState::Idle => None,
        }
    }

    /// Abandon the drag, moving the row back to where it started
    pub fn cancel(&mut self, list: &mut BuildList) -> bool {
        match std::mem::take(&mut self.state) {
            DragState::Dragging { position, origin } => list.move_row(position, origin),
            DragState::Idle => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::BuildRow;
    use proptest::prelude::*;

    fn rows(n: usize) -> BuildList {
        BuildList::from_rows(
            (0..n)
                .map(|i| BuildRow::default().with_product(&format!("row{}", i)))
                .collect(),
        )
    }

    fn bounds(n: usize) -> Vec<RowBounds> {
        (0..n).map(|i| RowBounds::new(i as f64 * 10.0, 10.0)).collect()
    }

    fn products(list: &BuildList) -> Vec<&str> {
        list.rows().iter().map(|r| r.product.as_str()).collect()
    }

    #[test]
    fn test_insertion_target_nearest_midpoint_above_pointer() {
        let b = bounds(4); // midpoints 5, 15, 25, 35

        assert_eq!(insertion_target(&b, 0, 12.0), Some(1));
        assert_eq!(insertion_target(&b, 0, 16.0), Some(2));
        assert_eq!(insertion_target(&b, 3, 0.0), Some(0));
        assert_eq!(insertion_target(&b, 0, 40.0), None);
    }

    #[test]
    fn test_insertion_target_requires_strictly_above_midpoint() {
        let b = bounds(3);
        // Exactly on row 1's midpoint: row 1 doesn't qualify
        assert_eq!(insertion_target(&b, 0, 15.0), Some(2));
    }

    #[test]
    fn test_insertion_target_skips_dragged_row() {
        let b = bounds(3);
        assert_eq!(insertion_target(&b, 1, 12.0), Some(2));
    }

    #[test]
    fn test_drag_first_row_below_last() {
        let mut list = rows(3);
        let mut drag = DragReorder::new();

        assert!(drag.begin(0, list.len()));
        assert_eq!(drag.pointer_moved(&mut list, &bounds(3), 28.0), Some(2));
        assert_eq!(drag.drop(), Some((0, 2)));

        assert_eq!(products(&list), vec!["row1", "row2", "row0"]);
        let positions: Vec<_> = list.iter_positioned().map(|(p, _)| p).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(drag.state(), DragState::Idle);
    }

    #[test]
    fn test_drag_upwards_live_preview() {
        let mut list = rows(4);
        let mut drag = DragReorder::new();
        drag.begin(3, list.len());

        assert_eq!(drag.pointer_moved(&mut list, &bounds(4), 14.0), Some(1));
        assert_eq!(products(&list), vec!["row0", "row3", "row1", "row2"]);
        assert_eq!(drag.dragged(), Some(1));

        // Hovering over itself changes nothing
        assert_eq!(drag.pointer_moved(&mut list, &bounds(4), 14.0), None);
    }

    #[test]
    fn test_cancel_restores_origin() {
        let mut list = rows(3);
        let mut drag = DragReorder::new();
        drag.begin(0, list.len());
        drag.pointer_moved(&mut list, &bounds(3), 28.0);

        assert!(drag.cancel(&mut list));
        assert_eq!(list, rows(3));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_moves_ignored_while_idle() {
        let mut list = rows(3);
        let mut drag = DragReorder::new();

        assert_eq!(drag.pointer_moved(&mut list, &bounds(3), 0.0), None);
        assert!(!drag.begin(3, list.len()));
        assert_eq!(drag.drop(), None);
    }

    proptest! {
        #[test]
        fn prop_drag_preserves_rows(
            n in 1usize..12,
            start_seed in any::<usize>(),
            moves in proptest::collection::vec(-20.0f64..140.0, 0..20),
        ) {
            let mut list = rows(n);
            let mut before = list.rows().to_vec();
            let mut drag = DragReorder::new();
            drag.begin(start_seed % n, n);

            for y in moves {
                drag.pointer_moved(&mut list, &bounds(n), y);
                prop_assert_eq!(list.len(), n);
            }
            drag.drop();

            let mut after = list.rows().to_vec();
            before.sort();
            after.sort();
            prop_assert_eq!(before, after);
        }
    }
}

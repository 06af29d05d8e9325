//=========================================================================
// Puzzle Mechanic
//=========================================================================
//
// Sliding-piece grid. Clicking a piece swaps it with a random orthogonal
// neighbour; dragging drops it onto the neighbour cell nearest to the
// release point. Solved when every cell holds its own piece.
//
// `arrangement[cell] = piece`. Every mutation is a swap, so the
// arrangement is a permutation of `0..rows*cols` at all times, and the
// initial shuffle (also neighbour swaps) always leaves a solvable grid.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::rc::Rc;

use log::{debug, trace};
use serde::Deserialize;

//=== Internal Dependencies ===============================================

use super::{HitTarget, Mechanic, MechanicCore, MechanicId, MechanicKind, PartId};
use crate::core::effects::{Animator, Easing};
use crate::core::event_bus::{EventBus, TriggerDetail};
use crate::core::math::{BoundingSphere, Vec3};
use crate::core::scene::{NodeFlags, NodeId, Transform, VisualNode};

//=== Options =============================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PuzzleOptions {
    /// Centre of the grid.
    pub position: Vec3,
    pub rows: usize,
    pub cols: usize,
    pub piece_size: f32,
    pub shuffle_steps: u32,
    /// Fixed seed for reproducible shuffles and moves.
    pub seed: Option<u64>,
    pub slide_duration: f32,
}

impl Default for PuzzleOptions {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rows: 3,
            cols: 3,
            piece_size: 60.0,
            shuffle_steps: 30,
            seed: None,
            slide_duration: 0.15,
        }
    }
}

//=== PuzzleMechanic ======================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slide(usize);

struct DragState {
    cell: usize,
    position: Vec3,
}

pub struct PuzzleMechanic {
    core: MechanicCore,
    options: PuzzleOptions,
    rng: fastrand::Rng,
    solution: Vec<usize>,
    initial: Vec<usize>,
    arrangement: Vec<usize>,
    moves: u32,
    /// Displayed position of each piece, indexed by piece.
    display: Vec<Vec3>,
    slide_from: Vec<Vec3>,
    animator: Animator<Slide>,
    drag: Option<DragState>,
}

impl PuzzleMechanic {
    pub fn new(id: MechanicId, name: impl Into<String>, options: PuzzleOptions, bus: Rc<EventBus>) -> Self {
        let options = PuzzleOptions {
            rows: options.rows.max(1),
            cols: options.cols.max(1),
            ..options
        };
        let rng = match options.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let cells = options.rows * options.cols;
        let solution: Vec<usize> = (0..cells).collect();

        let mut puzzle = Self {
            core: MechanicCore::new(id, name, MechanicKind::Puzzle, options.position, bus),
            options,
            rng,
            initial: solution.clone(),
            arrangement: solution.clone(),
            solution,
            moves: 0,
            display: Vec::new(),
            slide_from: Vec::new(),
            animator: Animator::new(),
            drag: None,
        };

        puzzle.shuffle();
        puzzle.initial = puzzle.arrangement.clone();
        puzzle.snap_display();
        puzzle
    }

    //--- Grid Geometry ----------------------------------------------------

    pub fn cell_count(&self) -> usize {
        self.solution.len()
    }

    /// Orthogonal neighbours of `cell`, in up/down/left/right order.
    pub fn neighbors(&self, cell: usize) -> Vec<usize> {
        let (rows, cols) = (self.options.rows, self.options.cols);
        let (row, col) = (cell / cols, cell % cols);
        let mut out = Vec::with_capacity(4);

        if row > 0 {
            out.push(cell - cols);
        }
        if row + 1 < rows {
            out.push(cell + cols);
        }
        if col > 0 {
            out.push(cell - 1);
        }
        if col + 1 < cols {
            out.push(cell + 1);
        }
        out
    }

    fn slot_position(&self, cell: usize) -> Vec3 {
        let (rows, cols) = (self.options.rows as f32, self.options.cols as f32);
        let row = (cell / self.options.cols) as f32;
        let col = (cell % self.options.cols) as f32;
        let size = self.options.piece_size;

        self.options.position
            + Vec3::new(
                (col - (cols - 1.0) / 2.0) * size,
                -(row - (rows - 1.0) / 2.0) * size,
                0.0,
            )
    }

    fn cell_of(&self, piece: usize) -> usize {
        self.arrangement.iter().position(|p| *p == piece).unwrap_or(piece)
    }

    //--- Operations -------------------------------------------------------

    /// Swaps `piece`, wherever it currently sits, with a random neighbour.
    pub fn move_piece(&mut self, piece: usize) -> bool {
        if piece >= self.cell_count() {
            return false;
        }
        self.move_cell(self.cell_of(piece))
    }

    pub fn is_solved(&self) -> bool {
        self.arrangement == self.solution
    }

    pub fn current_arrangement(&self) -> &[usize] {
        &self.arrangement
    }

    pub fn solution(&self) -> &[usize] {
        &self.solution
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    //--- Internals --------------------------------------------------------

    fn move_cell(&mut self, cell: usize) -> bool {
        if self.core.is_triggered() || cell >= self.cell_count() {
            return false;
        }

        let neighbors = self.neighbors(cell);
        if neighbors.is_empty() {
            return false;
        }

        let other = neighbors[self.rng.usize(..neighbors.len())];
        self.apply_move(cell, other);
        true
    }

    fn shuffle(&mut self) {
        let cells = self.cell_count();
        if cells < 2 {
            return;
        }

        for _ in 0..self.options.shuffle_steps {
            self.random_swap();
        }
        // A swap away from the solved grid always unsolves it.
        if self.options.shuffle_steps > 0 && self.is_solved() {
            self.random_swap();
        }

        trace!("Puzzle '{}' shuffled to {:?}", self.core.name(), self.arrangement);
    }

    fn random_swap(&mut self) {
        let cell = self.rng.usize(..self.cell_count());
        let neighbors = self.neighbors(cell);
        let other = neighbors[self.rng.usize(..neighbors.len())];
        self.arrangement.swap(cell, other);
    }

    fn apply_move(&mut self, a: usize, b: usize) {
        self.arrangement.swap(a, b);
        self.moves += 1;
        debug!("Puzzle '{}' swapped cells {} and {}", self.core.name(), a, b);

        for cell in [a, b] {
            let piece = self.arrangement[cell];
            self.slide_from[piece] = self.display[piece];
            self.animator
                .animate(Slide(piece), 0.0, 1.0, self.options.slide_duration, Easing::QuadOut);
        }

        if self.is_solved() {
            self.core.trigger(TriggerDetail::Solved { moves: self.moves });
        }
    }

    fn snap_display(&mut self) {
        self.display = (0..self.cell_count())
            .map(|piece| self.slot_position(self.cell_of(piece)))
            .collect();
        self.slide_from = self.display.clone();
    }
}

impl Mechanic for PuzzleMechanic {
    fn core(&self) -> &MechanicCore {
        &self.core
    }

    /// Restores the shuffled starting grid.
    fn reset(&mut self) {
        self.animator.stop_all();
        self.drag = None;
        self.arrangement = self.initial.clone();
        self.moves = 0;
        self.snap_display();
        self.core.clear_trigger();
    }

    fn update(&mut self, dt: f32) {
        for frame in self.animator.update(dt) {
            let Slide(piece) = frame.key;
            let target = self.slot_position(self.cell_of(piece));
            self.display[piece] = if frame.finished {
                target
            } else {
                self.slide_from[piece].lerp(target, frame.value)
            };
        }
    }

    fn is_busy(&self) -> bool {
        !self.animator.is_idle()
    }

    fn primary_action(&mut self, part: PartId) -> bool {
        self.move_cell(part.0)
    }

    fn drag_to(&mut self, part: PartId, position: Vec3) -> bool {
        if self.core.is_triggered() || part.0 >= self.cell_count() {
            return false;
        }
        self.drag = Some(DragState { cell: part.0, position });

        let piece = self.arrangement[part.0];
        self.animator.stop(Slide(piece));
        self.display[piece] = position;
        true
    }

    fn drag_end(&mut self, part: PartId) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        if drag.cell != part.0 || self.core.is_triggered() {
            self.snap_display();
            return;
        }

        let snap_range = self.options.piece_size * 0.75;
        let target = self
            .neighbors(drag.cell)
            .into_iter()
            .map(|cell| (cell, self.slot_position(cell).distance(drag.position)))
            .filter(|(_, d)| *d <= snap_range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(cell, _)| cell);

        match target {
            Some(other) => self.apply_move(drag.cell, other),
            None => {
                let piece = self.arrangement[drag.cell];
                self.slide_from[piece] = self.display[piece];
                self.animator
                    .animate(Slide(piece), 0.0, 1.0, self.options.slide_duration, Easing::QuadOut);
            }
        }
    }

    fn hit_targets(&self) -> Vec<HitTarget> {
        let radius = self.options.piece_size * 0.5;
        (0..self.cell_count())
            .map(|cell| HitTarget {
                part: PartId(cell),
                bounds: BoundingSphere::new(self.display[self.arrangement[cell]], radius),
                flags: NodeFlags::BOTH,
            })
            .collect()
    }

    fn nodes(&self) -> Vec<VisualNode> {
        let id = self.core.id();
        self.display
            .iter()
            .enumerate()
            .map(|(piece, position)| VisualNode {
                id: NodeId { mechanic: id, part: piece as u32 },
                transform: Transform::at(*position),
                flags: NodeFlags::BOTH,
                visible: true,
            })
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::MECHANIC_TRIGGER;
    use std::cell::Cell;

    fn puzzle(rows: usize, cols: usize, shuffle_steps: u32, seed: u64) -> PuzzleMechanic {
        let options = PuzzleOptions {
            rows,
            cols,
            shuffle_steps,
            seed: Some(seed),
            ..PuzzleOptions::default()
        };
        PuzzleMechanic::new(MechanicId(5), "grid", options, EventBus::shared())
    }

    fn is_permutation(arrangement: &[usize]) -> bool {
        let mut sorted = arrangement.to_vec();
        sorted.sort_unstable();
        sorted.iter().enumerate().all(|(i, p)| i == *p)
    }

    #[test]
    fn zero_shuffle_is_already_solved() {
        let grid = puzzle(3, 3, 0, 1);
        assert!(grid.is_solved());
        assert!(!grid.is_triggered(), "Construction never triggers");
    }

    #[test]
    fn shuffled_grid_starts_unsolved() {
        for seed in 0..20 {
            let grid = puzzle(3, 3, 30, seed);
            assert!(!grid.is_solved(), "seed {} left a solved grid", seed);
            assert!(is_permutation(grid.current_arrangement()));
        }
    }

    #[test]
    fn neighbors_respect_edges() {
        let grid = puzzle(3, 3, 0, 1);
        assert_eq!(grid.neighbors(0), vec![3, 1]);
        assert_eq!(grid.neighbors(4), vec![1, 7, 3, 5]);
        assert_eq!(grid.neighbors(8), vec![5, 7]);
    }

    #[test]
    fn single_cell_grid_cannot_move() {
        let mut grid = puzzle(1, 1, 10, 1);
        assert!(!grid.move_piece(0));
        assert_eq!(grid.moves(), 0);
    }

    #[test]
    fn out_of_range_piece_is_noop() {
        let mut grid = puzzle(2, 2, 5, 3);
        let before = grid.current_arrangement().to_vec();
        assert!(!grid.move_piece(4));
        assert_eq!(grid.current_arrangement(), &before[..]);
    }

    #[test]
    fn move_piece_follows_the_piece() {
        let mut grid = puzzle(3, 3, 30, 7);
        let arrangement = grid.current_arrangement().to_vec();
        let piece = (0..9).find(|p| arrangement[*p] != *p).expect("shuffled grid");
        let from = grid.cell_of(piece);

        assert!(grid.move_piece(piece));
        let to = grid.cell_of(piece);
        assert!(grid.neighbors(from).contains(&to), "piece {} left cell {} for {}", piece, from, to);
    }

    #[test]
    fn click_moves_the_piece_under_the_pointer() {
        let mut grid = puzzle(3, 3, 30, 7);
        let piece = grid.current_arrangement()[4];

        assert!(grid.primary_action(PartId(4)));
        assert_ne!(grid.current_arrangement()[4], piece);
        assert!(grid.neighbors(4).contains(&grid.cell_of(piece)));
    }

    #[test]
    fn solving_move_triggers_once() {
        let bus = EventBus::shared();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        bus.subscribe(MECHANIC_TRIGGER, move |_| c.set(c.get() + 1));

        // 1x2 grid: every move swaps the only two pieces.
        let options = PuzzleOptions {
            rows: 1,
            cols: 2,
            shuffle_steps: 1,
            seed: Some(9),
            ..PuzzleOptions::default()
        };
        let mut grid = PuzzleMechanic::new(MechanicId(1), "pair", options, bus);
        assert_eq!(grid.current_arrangement(), &[1, 0]);

        assert!(grid.move_piece(0));
        assert!(grid.is_solved());
        assert_eq!(count.get(), 1);
        assert!(!grid.move_piece(0), "Solved puzzle ignores moves");
    }

    #[test]
    fn drag_onto_neighbour_swaps() {
        let options = PuzzleOptions {
            rows: 1,
            cols: 2,
            shuffle_steps: 1,
            seed: Some(2),
            ..PuzzleOptions::default()
        };
        let mut grid = PuzzleMechanic::new(MechanicId(1), "pair", options, EventBus::shared());

        let drop_at = grid.slot_position(1) + Vec3::new(5.0, 5.0, 0.0);
        assert!(grid.drag_to(PartId(0), drop_at));
        grid.drag_end(PartId(0));

        assert!(grid.is_solved());
        assert_eq!(grid.moves(), 1);
    }

    #[test]
    fn drag_released_far_away_snaps_back() {
        let mut grid = puzzle(3, 3, 10, 4);
        let before = grid.current_arrangement().to_vec();

        grid.drag_to(PartId(4), Vec3::new(1000.0, 1000.0, 0.0));
        grid.drag_end(PartId(4));
        for _ in 0..10 {
            grid.update(0.05);
        }

        assert_eq!(grid.current_arrangement(), &before[..]);
        assert_eq!(grid.display[before[4]], grid.slot_position(4));
    }

    #[test]
    fn reset_restores_initial_shuffle() {
        let mut grid = puzzle(3, 3, 30, 11);
        let initial = grid.current_arrangement().to_vec();

        for cell in 0..9 {
            grid.move_piece(cell);
        }
        grid.reset();

        assert_eq!(grid.current_arrangement(), &initial[..]);
        assert_eq!(grid.moves(), 0);
        assert!(!grid.is_triggered());
    }
}

//! Double buffer that assembles the next generation of one species.
//!
//! Workers stage animals through `&self`: every cell owns its own lock, so two
//! workers only contend when they target the same cell. The birth markers are
//! plain atomics. Committing into the live grid needs `&mut self` and happens
//! after all workers have joined.

use crate::animal::Animal;
use crate::grid::Grid;
use eco_core::{grid_area, CellState, Position, TieBreak};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::sync::atomic::{self, AtomicBool, AtomicUsize};
use tracing::trace;

/// An animal staged into a cell, remembered with the cell it came from
#[derive(Debug, Clone, Copy)]
pub struct Claim<A> {
    pub animal: A,
    /// Row-major index of the cell the animal occupied when the generation began
    pub origin: usize,
}

pub struct StagingBuffer<A: Animal> {
    rows: i32,
    cols: i32,
    claims: Vec<Mutex<Option<Claim<A>>>>,
    births: Vec<AtomicBool>,
    conflicts: AtomicUsize,
    tie_break: TieBreak,
}

impl<A: Animal> StagingBuffer<A> {
    pub fn new(rows: i32, cols: i32, tie_break: TieBreak) -> Self {
        let size = grid_area(rows, cols).unwrap_or(0);
        Self {
            rows,
            cols,
            claims: (0..size).map(|_| Mutex::new(None)).collect(),
            births: (0..size).map(|_| AtomicBool::new(false)).collect(),
            conflicts: AtomicUsize::new(0),
            tie_break,
        }
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Empty every slot and clear every birth marker
    pub fn reset(&mut self) {
        for slot in &mut self.claims {
            *slot.get_mut() = None;
        }
        for birth in &mut self.births {
            *birth.get_mut() = false;
        }
        *self.conflicts.get_mut() = 0;
    }

    fn index_of(&self, pos: Position) -> Option<usize> {
        if pos.x >= 0 && pos.x < self.rows && pos.y >= 0 && pos.y < self.cols {
            Some((pos.x * self.cols + pos.y) as usize)
        } else {
            None
        }
    }

    /// Stage `animal` at its position, resolving a conflict with whatever is
    /// already there. Returns whether `animal` holds the cell afterwards.
    ///
    /// Positions outside the buffer are ignored.
    pub fn stage(&self, animal: A, origin: Position) -> bool {
        let (Some(index), Some(origin)) = (self.index_of(animal.position()), self.index_of(origin))
        else {
            debug_assert!(false, "staging outside the buffer: {:?}", animal);
            return false;
        };

        let challenger = Claim { animal, origin };
        let mut slot = self.claims[index].lock();
        match slot.as_ref() {
            None => {
                *slot = Some(challenger);
                true
            }
            Some(incumbent) => {
                self.conflicts.fetch_add(1, atomic::Ordering::Relaxed);
                if self.prevails(&challenger, incumbent) {
                    *slot = Some(challenger);
                    true
                } else {
                    false
                }
            }
        }
    }

    fn prevails(&self, challenger: &Claim<A>, incumbent: &Claim<A>) -> bool {
        match challenger.animal.rank().cmp(&incumbent.animal.rank()) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => match self.tie_break {
                TieBreak::ScanOrder => challenger.origin < incumbent.origin,
                TieBreak::ArrivalOrder => false,
            },
        }
    }

    /// Request a newborn at `pos` if the cell is still empty at commit time
    pub fn mark_birth(&self, pos: Position) {
        if let Some(index) = self.index_of(pos) {
            self.births[index].store(true, atomic::Ordering::Relaxed);
        }
    }

    /// The claim currently holding `pos`
    #[cfg(test)]
    pub fn claimed(&self, pos: Position) -> Option<Claim<A>> {
        let index = self.index_of(pos)?;
        *self.claims[index].lock()
    }

    #[cfg(test)]
    pub fn birth_pending(&self, pos: Position) -> bool {
        self.index_of(pos)
            .map(|index| self.births[index].load(atomic::Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Number of stagings that landed on an already claimed cell
    pub fn conflicts(&self) -> usize {
        self.conflicts.load(atomic::Ordering::Relaxed)
    }

    /// Replace this species on `grid` and in `population` with the staged
    /// animals, then place newborns on marked cells that are still empty.
    ///
    /// Cells are visited in row-major order, so `population` comes out sorted
    /// by position. Returns the number of newborns. Leaves the buffer empty.
    pub fn commit(&mut self, grid: &mut Grid, population: &mut Vec<A>) -> usize {
        debug_assert_eq!((grid.rows, grid.cols), (self.rows, self.cols));

        grid.clear_state(A::CELL);
        population.clear();

        let species = A::CELL;
        let mut births = 0;
        for (index, (slot, birth)) in self.claims.iter_mut().zip(&mut self.births).enumerate() {
            let pos = grid.index_to_pos(index);
            let birth_pending = std::mem::take(birth.get_mut());

            if let Some(claim) = slot.get_mut().take() {
                grid.set(pos, A::CELL);
                population.push(claim.animal);
            } else if birth_pending && grid.get(pos) == Some(CellState::Empty) {
                grid.set(pos, A::CELL);
                population.push(A::newborn(pos));
                births += 1;
                trace!(x = pos.x, y = pos.y, species = %species, "Newborn placed");
            }
        }

        *self.conflicts.get_mut() = 0;
        births
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animal::{Fox, Rabbit};

    fn pos(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn test_first_claim_takes_empty_cell() {
        let buffer = StagingBuffer::<Rabbit>::new(3, 3, TieBreak::ScanOrder);
        assert!(buffer.stage(Rabbit::with_age(pos(1, 1), 2), pos(0, 1)));
        assert_eq!(buffer.claimed(pos(1, 1)).map(|c| c.animal.age), Some(2));
        assert_eq!(buffer.claimed(pos(1, 1)).map(|c| c.origin), Some(1));
        assert_eq!(buffer.conflicts(), 0);
    }

    #[test]
    fn test_older_rabbit_wins_either_way_round() {
        for tie_break in [TieBreak::ScanOrder, TieBreak::ArrivalOrder] {
            let buffer = StagingBuffer::<Rabbit>::new(3, 3, tie_break);
            buffer.stage(Rabbit::with_age(pos(1, 1), 1), pos(0, 1));
            assert!(buffer.stage(Rabbit::with_age(pos(1, 1), 3), pos(2, 1)));
            assert!(!buffer.stage(Rabbit::with_age(pos(1, 1), 2), pos(1, 0)));
            assert_eq!(buffer.claimed(pos(1, 1)).map(|c| c.animal.age), Some(3));
            assert_eq!(buffer.conflicts(), 2);
        }
    }

    #[test]
    fn test_scan_order_tie_independent_of_arrival() {
        let late_first = StagingBuffer::<Rabbit>::new(3, 3, TieBreak::ScanOrder);
        late_first.stage(Rabbit::with_age(pos(1, 1), 2), pos(2, 1));
        late_first.stage(Rabbit::with_age(pos(1, 1), 2), pos(0, 1));

        let early_first = StagingBuffer::<Rabbit>::new(3, 3, TieBreak::ScanOrder);
        early_first.stage(Rabbit::with_age(pos(1, 1), 2), pos(0, 1));
        early_first.stage(Rabbit::with_age(pos(1, 1), 2), pos(2, 1));

        let winner = |buffer: &StagingBuffer<Rabbit>| buffer.claimed(pos(1, 1)).map(|c| c.origin);
        assert_eq!(winner(&late_first), Some(1));
        assert_eq!(winner(&early_first), Some(1));
    }

    #[test]
    fn test_scan_order_prefers_lower_origin() {
        let buffer = StagingBuffer::<Rabbit>::new(3, 3, TieBreak::ScanOrder);
        buffer.stage(Rabbit::with_age(pos(1, 1), 2), pos(2, 1));
        assert!(buffer.stage(Rabbit::with_age(pos(1, 1), 2), pos(0, 1)));
        assert!(!buffer.stage(Rabbit::with_age(pos(1, 1), 2), pos(1, 2)));
    }

    #[test]
    fn test_arrival_order_keeps_incumbent_on_tie() {
        let buffer = StagingBuffer::<Rabbit>::new(3, 3, TieBreak::ArrivalOrder);
        assert!(buffer.stage(Rabbit::with_age(pos(1, 1), 2), pos(2, 1)));
        assert!(!buffer.stage(Rabbit::with_age(pos(1, 1), 2), pos(0, 1)));
        assert_eq!(buffer.claimed(pos(1, 1)).map(|c| c.origin), Some(7));
        assert_eq!(buffer.conflicts(), 1);
    }

    #[test]
    fn test_fox_conflict_uses_hunger_after_age() {
        let buffer = StagingBuffer::<Fox>::new(3, 3, TieBreak::ArrivalOrder);
        buffer.stage(Fox::with_state(pos(0, 0), 3, 2), pos(0, 1));
        assert!(buffer.stage(Fox::with_state(pos(0, 0), 3, 1), pos(1, 0)));
        assert!(!buffer.stage(Fox::with_state(pos(0, 0), 2, 0), pos(1, 0)));
        assert_eq!(buffer.claimed(pos(0, 0)).map(|c| c.animal.hunger), Some(1));
    }

    #[test]
    fn test_commit_places_claims_and_births() {
        let mut grid = Grid::new(2, 3);
        grid.set(pos(0, 0), CellState::Rabbit);
        grid.set(pos(1, 2), CellState::Rock);

        let mut buffer = StagingBuffer::<Rabbit>::new(2, 3, TieBreak::ScanOrder);
        buffer.stage(Rabbit::with_age(pos(0, 1), 0), pos(0, 0));
        buffer.mark_birth(pos(0, 0));

        let mut population = vec![Rabbit::new(pos(0, 0))];
        let births = buffer.commit(&mut grid, &mut population);

        assert_eq!(births, 1);
        assert_eq!(
            population,
            vec![Rabbit::new(pos(0, 0)), Rabbit::with_age(pos(0, 1), 0)]
        );
        assert_eq!(grid.count(CellState::Rabbit), 2);
        assert_eq!(grid.get(pos(1, 2)), Some(CellState::Rock));
    }

    #[test]
    fn test_birth_dropped_when_cell_claimed() {
        let mut grid = Grid::new(1, 2);
        let mut buffer = StagingBuffer::<Rabbit>::new(1, 2, TieBreak::ScanOrder);
        buffer.stage(Rabbit::with_age(pos(0, 0), 4), pos(0, 1));
        buffer.mark_birth(pos(0, 0));

        let mut population = Vec::new();
        assert_eq!(buffer.commit(&mut grid, &mut population), 0);
        assert_eq!(population, vec![Rabbit::with_age(pos(0, 0), 4)]);
    }

    #[test]
    fn test_birth_dropped_on_occupied_cell() {
        let mut grid = Grid::new(1, 2);
        grid.set(pos(0, 1), CellState::Rabbit);
        let mut buffer = StagingBuffer::<Fox>::new(1, 2, TieBreak::ScanOrder);
        buffer.mark_birth(pos(0, 1));

        let mut population = Vec::new();
        assert_eq!(buffer.commit(&mut grid, &mut population), 0);
        assert!(population.is_empty());
        assert_eq!(grid.get(pos(0, 1)), Some(CellState::Rabbit));
    }

    #[test]
    fn test_reset_and_commit_leave_buffer_empty() {
        let mut buffer = StagingBuffer::<Rabbit>::new(2, 2, TieBreak::ScanOrder);
        buffer.stage(Rabbit::new(pos(1, 1)), pos(1, 1));
        buffer.mark_birth(pos(0, 0));
        buffer.reset();
        assert!(buffer.claimed(pos(1, 1)).is_none());
        assert!(!buffer.birth_pending(pos(0, 0)));

        buffer.stage(Rabbit::new(pos(1, 1)), pos(1, 1));
        let mut grid = Grid::new(2, 2);
        buffer.commit(&mut grid, &mut Vec::new());
        assert!(buffer.claimed(pos(1, 1)).is_none());
    }
}

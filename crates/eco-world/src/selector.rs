//! Deterministic destination choice.

use eco_core::Position;

/// Pick one of `candidates` for an animal standing at `origin`.
///
/// The choice is `candidates[(generation + x + y) % len]`, a pure function of
/// its arguments. Returns `None` when there is nowhere to go.
pub fn select_destination(
    origin: Position,
    candidates: &[Position],
    generation: u64,
) -> Option<Position> {
    if candidates.is_empty() {
        return None;
    }

    debug_assert!(origin.x >= 0 && origin.y >= 0, "origin {} is out of bounds", origin);
    let key = generation
        .wrapping_add(origin.x as u64)
        .wrapping_add(origin.y as u64);
    let index = (key % candidates.len() as u64) as usize;
    Some(candidates[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring() -> Vec<Position> {
        vec![
            Position::new(0, 1),
            Position::new(1, 2),
            Position::new(2, 1),
            Position::new(1, 0),
        ]
    }

    #[test]
    fn test_empty_candidates_stay() {
        assert_eq!(select_destination(Position::new(3, 4), &[], 7), None);
    }

    #[test]
    fn test_index_formula() {
        let candidates = ring();
        // (0 + 1 + 1) % 4 == 2
        assert_eq!(
            select_destination(Position::new(1, 1), &candidates, 0),
            Some(Position::new(2, 1))
        );
        // (5 + 1 + 1) % 4 == 3
        assert_eq!(
            select_destination(Position::new(1, 1), &candidates, 5),
            Some(Position::new(1, 0))
        );
        // (2 + 0 + 0) % 3 == 2
        assert_eq!(
            select_destination(Position::new(0, 0), &candidates[..3], 2),
            Some(Position::new(2, 1))
        );
    }

    #[test]
    fn test_single_candidate_always_chosen() {
        let only = [Position::new(4, 4)];
        for generation in 0..10 {
            assert_eq!(
                select_destination(Position::new(4, 3), &only, generation),
                Some(Position::new(4, 4))
            );
        }
    }

    #[test]
    fn test_selection_is_pure() {
        let candidates = ring();
        for generation in 0..20 {
            let first = select_destination(Position::new(7, 3), &candidates, generation);
            let second = select_destination(Position::new(7, 3), &candidates, generation);
            assert_eq!(first, second);
        }
    }
}

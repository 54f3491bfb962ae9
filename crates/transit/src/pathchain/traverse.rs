//! Lazy depth-first traversal over a chain topology.

use std::collections::HashSet;

use super::{Direction, PathChain};

/// One chain reached by a [`Traversal`]
#[derive(Clone, Debug)]
pub struct TraversalStep {
    pub chain: PathChain,
    pub direction: Direction,
    /// Chain this one was reached from, `None` for the start
    pub from: Option<usize>,
}

/// Iterator yielding every chain reachable from a start chain exactly once.
///
/// Neighbors are visited in the order they are listed at each exit, deepest
/// first. Visited indices are tracked per traversal.
pub struct Traversal {
    stack: Vec<TraversalStep>,
    visited: HashSet<usize>,
    /// Also leave the start chain through its entry end
    outward: bool,
}

impl Traversal {
    pub(super) fn new(start: PathChain, direction: Direction) -> Self {
        let mut visited = HashSet::new();
        visited.insert(start.index());
        Self {
            stack: vec![TraversalStep {
                chain: start,
                direction,
                from: None,
            }],
            visited,
            outward: false,
        }
    }

    pub(super) fn outward(start: PathChain, direction: Direction) -> Self {
        Self {
            outward: true,
            ..Self::new(start, direction)
        }
    }
}

impl Iterator for Traversal {
    type Item = TraversalStep;

    fn next(&mut self) -> Option<Self::Item> {
        let step = self.stack.pop()?;

        let mut candidates = step.chain.next_chains(step.direction);
        if self.outward && step.from.is_none() {
            candidates.extend(step.chain.next_chains(step.direction.reversed()));
        }
        let next: Vec<(PathChain, Direction)> = candidates
            .into_iter()
            .filter(|(chain, _)| self.visited.insert(chain.index()))
            .collect();

        self.stack.extend(next.into_iter().rev().map(|(chain, direction)| TraversalStep {
            chain,
            direction,
            from: Some(step.chain.index()),
        }));

        Some(step)
    }
}

#[cfg(test)]
mod tests {
    use crate::pathchain::{build_pathchain, Direction, Path};

    #[test]
    fn test_traversal_order_and_directions() {
        let groups = build_pathchain(vec![
            Path::from_xy(&[[0.0, 0.0], [1.0, 0.0]]).unwrap(),
            Path::from_xy(&[[2.0, 0.0], [1.0, 0.0]]).unwrap(),
            Path::from_xy(&[[2.0, 0.0], [3.0, 0.0]]).unwrap(),
        ]);
        let start = groups[0].chain(0).unwrap();

        let steps: Vec<(usize, Direction, Option<usize>)> = start
            .traverse(Direction::Forward)
            .map(|s| (s.chain.index(), s.direction, s.from))
            .collect();

        assert_eq!(
            steps,
            vec![
                (0, Direction::Forward, None),
                (1, Direction::Backward, Some(0)),
                (2, Direction::Forward, Some(1)),
            ]
        );
    }

    #[test]
    fn test_traversal_terminates_on_loop() {
        let groups = build_pathchain(vec![
            Path::from_xy(&[[0.0, 0.0], [1.0, 0.0]]).unwrap(),
            Path::from_xy(&[[1.0, 0.0], [1.0, 1.0]]).unwrap(),
            Path::from_xy(&[[1.0, 1.0], [0.0, 0.0]]).unwrap(),
        ]);
        let start = groups[0].chain(0).unwrap();
        assert_eq!(start.traverse(Direction::Forward).count(), 3);
    }

    #[test]
    fn test_outward_traversal_covers_both_sides() {
        let groups = build_pathchain(vec![
            Path::from_xy(&[[0.0, 0.0], [1.0, 0.0]]).unwrap(),
            Path::from_xy(&[[1.0, 0.0], [2.0, 0.0]]).unwrap(),
            Path::from_xy(&[[2.0, 0.0], [3.0, 0.0]]).unwrap(),
        ]);
        let middle = groups[0].chain(1).unwrap();

        let forward: Vec<usize> = middle.traverse(Direction::Forward).map(|s| s.chain.index()).collect();
        assert_eq!(forward, vec![1, 2]);

        let steps: Vec<(usize, Direction, Option<usize>)> = middle
            .traverse_outward(Direction::Forward)
            .map(|s| (s.chain.index(), s.direction, s.from))
            .collect();
        assert_eq!(
            steps,
            vec![
                (1, Direction::Forward, None),
                (2, Direction::Forward, Some(1)),
                (0, Direction::Backward, Some(1)),
            ]
        );
    }
}

//! Mapping external points (stations, stops) onto chains.
//!
//! When several segments could hold a point, for instance right at a
//! junction, the one with the smallest perpendicular distance wins, then
//! the lowest chain index, then the lowest segment index.

use geo::Coord;

use super::{Direction, IsolatedPathChain, PathChain, PathEnd};
use crate::geometry::{polyline_length, project_onto_segment, PointOnPath, COLLINEAR_COSINE};
use crate::spatial::SegmentIndex;

const DISTANCE_EPSILON: f64 = 1e-12;

/// A point projected onto a specific chain
#[derive(Clone, Debug)]
pub struct PointOnPathchain {
    pub chain: PathChain,
    pub on_path: PointOnPath,
    pub position: Coord<f64>,
}

impl PointOnPathchain {
    pub fn segment_index(&self) -> usize {
        self.on_path.segment_index
    }

    /// Length along the chain from the given end to the point
    pub fn distance_from(&self, end: PathEnd) -> f64 {
        match end {
            PathEnd::Start => self.on_path.distance,
            PathEnd::End => (self.chain.path().length() - self.on_path.distance).max(0.0),
        }
    }

    /// Length from where a walk in `direction` enters the chain
    pub fn distance_along(&self, direction: Direction) -> f64 {
        self.distance_from(direction.entry())
    }
}

/// Locates points on a fixed set of chain groups
pub struct PathChainLocator {
    chains: Vec<PathChain>,
    index: SegmentIndex,
    threshold: f64,
}

impl PathChainLocator {
    pub fn new(groups: &[IsolatedPathChain]) -> Self {
        Self::with_threshold(groups, COLLINEAR_COSINE)
    }

    pub fn with_threshold(groups: &[IsolatedPathChain], threshold: f64) -> Self {
        let chains: Vec<PathChain> = groups.iter().flat_map(|g| g.chains().iter().cloned()).collect();
        let index = SegmentIndex::new(&chains);
        Self {
            chains,
            index,
            threshold,
        }
    }

    pub fn locate(&self, point: Coord<f64>) -> Option<PointOnPathchain> {
        let mut best: Option<(f64, usize, usize, f64)> = None;

        for (node, d2) in self.index.nearest(point) {
            if let Some((best_d2, ..)) = best {
                if d2 > best_d2 + DISTANCE_EPSILON {
                    break;
                }
            }

            let chain = &self.chains[node.chain];
            let segments = chain.path().coords().len() - 1;
            if point == node.line.end && node.segment + 1 != segments {
                continue;
            }
            let Some(offset) = project_onto_segment(point, node.line.start, node.line.end, self.threshold)
            else {
                continue;
            };

            let key = (d2, chain.index(), node.segment, offset);
            let better = match best {
                None => true,
                Some((_, best_chain, best_segment, _)) => {
                    (key.1, key.2) < (best_chain, best_segment)
                }
            };
            if better {
                best = Some(key);
            }
        }

        let (_, chain_index, segment, offset) = best?;
        let chain = self.chains.iter().find(|c| c.index() == chain_index)?.clone();
        let walked = polyline_length(&chain.path().coords()[..=segment]);

        Some(PointOnPathchain {
            chain,
            on_path: PointOnPath {
                segment_index: segment,
                distance: walked + offset,
            },
            position: point,
        })
    }
}

/// Project `point` onto whichever chain of `groups` it lies on.
pub fn find_point_on_pathchain(groups: &[IsolatedPathChain], point: Coord<f64>) -> Option<PointOnPathchain> {
    find_point_on_pathchain_with(groups, point, COLLINEAR_COSINE)
}

pub fn find_point_on_pathchain_with(
    groups: &[IsolatedPathChain],
    point: Coord<f64>,
    threshold: f64,
) -> Option<PointOnPathchain> {
    PathChainLocator::with_threshold(groups, threshold).locate(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathchain::{build_pathchain, Path};
    use approx::assert_relative_eq;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn groups() -> Vec<IsolatedPathChain> {
        build_pathchain(vec![
            Path::from_xy(&[[0.0, 0.0], [3.0, 4.0], [6.0, 8.0], [8.0, 8.0]]).unwrap(),
            Path::from_xy(&[[8.0, 8.0], [8.0, 20.0]]).unwrap(),
        ])
    }

    #[test]
    fn test_locate_on_vertex() {
        let hit = find_point_on_pathchain(&groups(), c(3.0, 4.0)).unwrap();
        assert_eq!(hit.chain.index(), 0);
        assert_eq!(hit.segment_index(), 1);
        assert_relative_eq!(hit.distance_from(PathEnd::Start), 5.0);
        assert_relative_eq!(hit.distance_from(PathEnd::End), 7.0);
        assert_relative_eq!(hit.distance_along(Direction::Backward), 7.0);
    }

    #[test]
    fn test_off_line_point() {
        assert!(find_point_on_pathchain(&groups(), c(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_junction_tie_goes_to_lowest_chain() {
        let hit = find_point_on_pathchain(&groups(), c(8.0, 8.0)).unwrap();
        assert_eq!(hit.chain.index(), 0);
        assert_eq!(hit.segment_index(), 2);
        assert_relative_eq!(hit.distance_from(PathEnd::Start), 12.0);
    }

    #[test]
    fn test_nearest_segment_wins() {
        // Both crossing lines pass the angular test; the closer one is chosen
        let groups = build_pathchain(vec![
            Path::from_xy(&[[0.0, 0.0], [1000.0, 0.0]]).unwrap(),
            Path::from_xy(&[[500.0, -500.0], [500.0, 500.0]]).unwrap(),
        ]);
        assert_eq!(groups.len(), 2);

        let hit = find_point_on_pathchain(&groups, c(504.0, 5.0)).unwrap();
        assert_eq!(hit.chain.index(), 1);
        assert_relative_eq!(hit.distance_from(PathEnd::Start), 505.0);

        let hit = find_point_on_pathchain(&groups, c(505.0, 4.0)).unwrap();
        assert_eq!(hit.chain.index(), 0);
    }

    #[test]
    fn test_second_chain() {
        let hit = find_point_on_pathchain(&groups(), c(8.0, 10.0)).unwrap();
        assert_eq!(hit.chain.index(), 1);
        assert_relative_eq!(hit.distance_from(PathEnd::Start), 2.0);
    }
}

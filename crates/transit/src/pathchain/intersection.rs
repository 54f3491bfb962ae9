//! T-intersection repair.
//!
//! A spur or turnaround often ends on the middle of another line instead of
//! at one of its endpoints. Such a dangling endpoint would leave the
//! spur disconnected, so the line it touches is split at the touching point
//! and the three pieces are made neighbors of each other.

use tracing::{debug, trace};

use super::{register_neighbor, PathEnd, PathInternal};
use crate::geometry::{check_point_on_path_with, point_at, COLLINEAR_COSINE};

const ENDS: [PathEnd; 2] = [PathEnd::Start, PathEnd::End];

/// Splits closer than this to an end of the touched path are ignored
const MIN_SPLIT_LENGTH: f64 = 1e-9;

/// Split every path that a dangling endpoint lies on.
///
/// The split happens at the endpoint's projection onto the touched path.
/// Paths appended by a split are examined too, so several spurs may land on
/// the same original line. Returns the number of splits performed.
pub fn merge_t_intersection(internals: &mut Vec<PathInternal>) -> usize {
    merge_t_intersection_with(internals, COLLINEAR_COSINE)
}

/// [`merge_t_intersection`] with `threshold` as the collinearity cosine an
/// endpoint must reach to count as lying on a path.
pub fn merge_t_intersection_with(internals: &mut Vec<PathInternal>, threshold: f64) -> usize {
    let mut splits = 0;
    let mut i = 0;

    while i < internals.len() {
        for end in ENDS {
            if !internals[i].is_dangling(end) {
                continue;
            }
            let point = internals[i].path.endpoint(end);

            let target = (0..internals.len()).filter(|&j| j != i).find_map(|j| {
                let path = &internals[j].path;
                let hit = check_point_on_path_with(point, path.coords(), threshold)?;
                if hit.distance < MIN_SPLIT_LENGTH || hit.distance > path.length() - MIN_SPLIT_LENGTH {
                    return None;
                }
                let at = point_at(path.coords(), &hit)?;
                let halves = path.split_at(at, &hit)?;
                Some((j, halves))
            });

            let Some((j, (head, tail))) = target else {
                continue;
            };

            let tail_index = internals.len();
            trace!(dangling = i, split = j, tail = tail_index, "Splitting path at T-intersection");

            // The tail inherits the far side of the original path
            let far_side = std::mem::take(internals[j].neighbors_at_mut(PathEnd::End));
            for &n in &far_side {
                for list in internals[n].neighbors.iter_mut() {
                    for slot in list.iter_mut() {
                        if *slot == j {
                            *slot = tail_index;
                        }
                    }
                }
            }

            internals[j].path = head;
            let mut tail_internal = PathInternal::new(tail_index, tail);
            tail_internal.neighbors[1] = far_side;
            internals.push(tail_internal);

            register_neighbor(&mut internals[j], PathEnd::End, tail_index);
            register_neighbor(&mut internals[j], PathEnd::End, i);
            register_neighbor(&mut internals[tail_index], PathEnd::Start, j);
            register_neighbor(&mut internals[tail_index], PathEnd::Start, i);
            register_neighbor(&mut internals[i], end, j);
            register_neighbor(&mut internals[i], end, tail_index);

            splits += 1;
        }
        i += 1;
    }

    if splits > 0 {
        debug!(splits, paths = internals.len(), "Merged T-intersections");
    }

    splits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathchain::{build_pathchain, discover_neighbors, Direction, Path};
    use geo::Coord;

    fn paths(raw: &[&[[f64; 2]]]) -> Vec<Path> {
        raw.iter().map(|p| Path::from_xy(p).unwrap()).collect()
    }

    fn coords(raw: &[[f64; 2]]) -> Vec<Coord<f64>> {
        raw.iter().map(|&[x, y]| Coord { x, y }).collect()
    }

    #[test]
    fn test_t_junction_splits_into_three() {
        let mut internals = discover_neighbors(paths(&[
            &[[0.0, 0.0], [10.0, 0.0]],
            &[[5.0, 0.0], [5.0, 5.0]],
        ]));

        assert_eq!(merge_t_intersection(&mut internals), 1);
        assert_eq!(internals.len(), 3);

        assert_eq!(internals[0].path.coords(), coords(&[[0.0, 0.0], [5.0, 0.0]]).as_slice());
        assert_eq!(internals[1].path.coords(), coords(&[[5.0, 0.0], [5.0, 5.0]]).as_slice());
        assert_eq!(internals[2].path.coords(), coords(&[[5.0, 0.0], [10.0, 0.0]]).as_slice());

        let mut at_junction = internals[0].neighbors_at(PathEnd::End).to_vec();
        at_junction.sort();
        assert_eq!(at_junction, vec![1, 2]);

        let mut at_junction = internals[1].neighbors_at(PathEnd::Start).to_vec();
        at_junction.sort();
        assert_eq!(at_junction, vec![0, 2]);

        let mut at_junction = internals[2].neighbors_at(PathEnd::Start).to_vec();
        at_junction.sort();
        assert_eq!(at_junction, vec![0, 1]);
    }

    #[test]
    fn test_walk_from_any_end_visits_all() {
        let groups = build_pathchain(paths(&[
            &[[0.0, 0.0], [10.0, 0.0]],
            &[[5.0, 0.0], [5.0, 5.0]],
        ]));
        assert_eq!(groups.len(), 1);

        for chain in groups[0].ended() {
            let direction = chain.dead_end_direction().unwrap();
            let mut visited: Vec<usize> = chain.traverse(direction).map(|s| s.chain.index()).collect();
            visited.sort();
            assert_eq!(visited, vec![0, 1, 2]);
        }
        assert_eq!(groups[0].ended().count(), 3);
    }

    #[test]
    fn test_far_side_neighbors_are_patched() {
        let mut internals = discover_neighbors(paths(&[
            &[[0.0, 0.0], [10.0, 0.0]],
            &[[10.0, 0.0], [20.0, 0.0]],
            &[[5.0, 5.0], [5.0, 0.0]],
        ]));

        merge_t_intersection(&mut internals);
        assert_eq!(internals.len(), 4);

        // Path 1 used to touch the end of path 0; now it touches the tail
        assert_eq!(internals[1].neighbors_at(PathEnd::Start), &[3]);
        assert_eq!(internals[3].neighbors_at(PathEnd::End), &[1]);
        assert!(!internals[0].neighbors_at(PathEnd::End).contains(&1));
    }

    #[test]
    fn test_two_spurs_on_one_line() {
        let groups = build_pathchain(paths(&[
            &[[0.0, 0.0], [10.0, 0.0]],
            &[[3.0, 0.0], [3.0, 2.0]],
            &[[7.0, -2.0], [7.0, 0.0]],
        ]));

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 5);

        let (start, direction) = groups[0].walk_start().unwrap();
        assert_eq!(start.traverse(direction).count(), 5);
        assert_eq!(start.index(), 0);
        assert_eq!(direction, Direction::Forward);
    }

    #[test]
    fn test_threshold_decides_split() {
        // The spur stops one unit short of the line, about 11 degrees off it
        let raw: &[&[[f64; 2]]] = &[&[[0.0, 0.0], [10.0, 0.0]], &[[5.0, 1.0], [5.0, 5.0]]];

        let mut strict = discover_neighbors(paths(raw));
        assert_eq!(merge_t_intersection(&mut strict), 0);
        assert_eq!(strict.len(), 2);

        let mut loose = discover_neighbors(paths(raw));
        assert_eq!(merge_t_intersection_with(&mut loose, 0.95), 1);
        assert_eq!(loose.len(), 3);
        assert_eq!(loose[0].path.coords(), coords(&[[0.0, 0.0], [5.0, 0.0]]).as_slice());

        assert_eq!(crate::pathchain::build_pathchain(paths(raw)).len(), 2);
        assert_eq!(crate::pathchain::build_pathchain_with(paths(raw), 0.95).len(), 1);
    }

    #[test]
    fn test_endpoint_touch_is_not_split() {
        let mut internals = discover_neighbors(paths(&[
            &[[0.0, 0.0], [10.0, 0.0]],
            &[[20.0, 0.0], [30.0, 0.0]],
        ]));
        assert_eq!(merge_t_intersection(&mut internals), 0);
        assert_eq!(internals.len(), 2);
    }
}

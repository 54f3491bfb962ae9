//! Depth-first chain walk that labels every fork.
//!
//! Where a chain has several unvisited neighbors, every neighbor after the
//! first opens a side branch. Side branches are walked to completion before
//! the primary branch continues, and each one extends the current
//! [`BranchIdChain`] with a fresh id. Ids come from a counter, so the labels
//! of a walk are reproducible.

use std::collections::HashSet;

use super::{Direction, PathChain};

/// Sequence of fork choices leading to a branch. The root branch is `[0]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchIdChain(Vec<u32>);

impl BranchIdChain {
    pub fn root() -> Self {
        Self(vec![0])
    }

    pub fn child(&self, id: u32) -> Self {
        let mut ids = self.0.clone();
        ids.push(id);
        Self(ids)
    }

    pub fn parent(&self) -> Option<Self> {
        (self.0.len() > 1).then(|| Self(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn ids(&self) -> &[u32] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len() - 1
    }
}

/// Chains already processed, shared by every branch of a walk
#[derive(Clone, Debug, Default)]
pub struct VisitedSet(HashSet<usize>);

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a chain, returning false if it was already marked
    pub fn insert(&mut self, chain: usize) -> bool {
        self.0.insert(chain)
    }

    pub fn contains(&self, chain: usize) -> bool {
        self.0.contains(&chain)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What the walk callback wants next
#[derive(Clone, Debug, PartialEq)]
pub enum Visit<T> {
    /// Keep walking and collect a value
    Emit(T),
    /// Keep walking
    Continue,
    /// Don't walk past this chain on the current branch
    StopBranch,
    /// Abort the whole walk
    Stop,
}

/// Context handed to the walk callback for one chain
#[derive(Clone, Debug)]
pub struct WalkStep<'a> {
    pub chain: &'a PathChain,
    pub direction: Direction,
    pub branch: &'a BranchIdChain,
    /// First chain of a side branch
    pub branch_start: bool,
    /// Chain this one was entered from
    pub from: Option<usize>,
}

struct Task {
    chain: PathChain,
    direction: Direction,
    branch: BranchIdChain,
    branch_start: bool,
    from: Option<usize>,
}

/// Walk everything reachable from `start` that is not yet in `visited`.
///
/// `visited` is updated in place; reusing it across walks guarantees a chain
/// is handed to a callback at most once.
pub fn walk_chain<T, F>(start: &PathChain, direction: Direction, visited: &mut VisitedSet, visit: F) -> Vec<T>
where
    F: FnMut(&WalkStep<'_>) -> Visit<T>,
{
    walk(start, direction, false, visited, visit)
}

/// Like [`walk_chain`], but `start` is also left through its entry end.
///
/// Chains behind the start open side branches of the root, so a walk from
/// any chain of a component reaches the whole component.
pub fn walk_chain_outward<T, F>(start: &PathChain, direction: Direction, visited: &mut VisitedSet, visit: F) -> Vec<T>
where
    F: FnMut(&WalkStep<'_>) -> Visit<T>,
{
    walk(start, direction, true, visited, visit)
}

fn walk<T, F>(start: &PathChain, direction: Direction, outward: bool, visited: &mut VisitedSet, mut visit: F) -> Vec<T>
where
    F: FnMut(&WalkStep<'_>) -> Visit<T>,
{
    let mut results = Vec::new();
    if !visited.insert(start.index()) {
        return results;
    }

    let mut next_branch_id = 1u32;
    let mut stack = vec![Task {
        chain: start.clone(),
        direction,
        branch: BranchIdChain::root(),
        branch_start: false,
        from: None,
    }];

    while let Some(task) = stack.pop() {
        let step = WalkStep {
            chain: &task.chain,
            direction: task.direction,
            branch: &task.branch,
            branch_start: task.branch_start,
            from: task.from,
        };

        match visit(&step) {
            Visit::Emit(value) => results.push(value),
            Visit::Continue => {}
            Visit::StopBranch => continue,
            Visit::Stop => break,
        }

        let mut candidates = task.chain.next_chains(task.direction);
        if outward && task.from.is_none() {
            candidates.extend(task.chain.next_chains(task.direction.reversed()));
        }
        let next: Vec<(PathChain, Direction)> = candidates
            .into_iter()
            .filter(|(chain, _)| visited.insert(chain.index()))
            .collect();

        let mut next = next.into_iter();
        let Some((primary, primary_direction)) = next.next() else {
            continue;
        };

        let from = Some(task.chain.index());
        let sides: Vec<Task> = next
            .map(|(chain, direction)| {
                let id = next_branch_id;
                next_branch_id += 1;
                Task {
                    chain,
                    direction,
                    branch: task.branch.child(id),
                    branch_start: true,
                    from,
                }
            })
            .collect();

        stack.push(Task {
            chain: primary,
            direction: primary_direction,
            branch: task.branch.clone(),
            branch_start: false,
            from,
        });
        stack.extend(sides.into_iter().rev());
    }

    results
}

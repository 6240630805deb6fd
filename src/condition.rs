//! The condition algebra. Symbolic boolean expressions over preprocessor predicates, kept in
//! disjunctive normal form so that equivalence and implication between conditions that arise in
//! realistic C can be decided exactly, without pulling in an external SAT or BDD library.
//!
//! A [`Condition`] is a set of cubes (conjunctions of literals); the condition is true whenever
//! any cube is true. Each cube is a set of literals (a possibly-negated [`Atom`]). Cubes are kept
//! minimal by subsumption elimination: a cube that is a superset of another present cube adds no
//! information to the disjunction and is dropped.
//!
//! Atoms are interned through an [`AtomTable`] so that structurally equal atoms (`defined(FOO)`
//! seen twice) compare by a small integer id rather than by string content.

use std::collections::BTreeSet;
use std::fmt;

/// A single preprocessor-level fact. Atoms are compared structurally; the [`AtomTable`] is what
/// gives two structurally-equal atoms the same [`AtomId`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Atom {
	/// `defined(NAME)`.
	Defined(String),
	/// A bare macro name used as a truthy condition, e.g. `#if NAME`.
	Truthy(String),
	/// `expr == k`, where `expr` is rendered as its source text.
	Equals(String, i64),
}

impl fmt::Display for Atom {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Defined(name) => write!(f, "defined({name})"),
			Self::Truthy(name) => write!(f, "{name}"),
			Self::Equals(expr, value) => write!(f, "{expr} == {value}"),
		}
	}
}

/// The id of an interned [`Atom`] within an [`AtomTable`]. Two atoms constructed separately but
/// structurally equal always intern to the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AtomId(u32);

/// The reference universe of previously-seen atoms for one translation unit. Every [`Condition`]
/// that mentions an atom must have interned it here first.
#[derive(Debug, Default)]
pub struct AtomTable {
	atoms: Vec<Atom>,
}

impl AtomTable {
	/// Creates an empty atom table.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Interns an atom, returning its id. Interning the same atom twice returns the same id.
	pub fn intern(&mut self, atom: Atom) -> AtomId {
		if let Some(index) = self.atoms.iter().position(|existing| existing == &atom) {
			return AtomId(index.try_into().unwrap_or(u32::MAX));
		}
		self.atoms.push(atom);
		AtomId((self.atoms.len() - 1).try_into().unwrap_or(u32::MAX))
	}

	/// Returns the atom that was interned with the given id.
	#[must_use]
	pub fn resolve(&self, id: AtomId) -> &Atom {
		self.atoms.get(id.0 as usize).unwrap_or_else(|| panic!("Internal Error: atom id {id:?} does not refer to an interned atom"))
	}
}

/// A literal: an atom, optionally negated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Literal {
	atom: AtomId,
	negated: bool,
}

impl Literal {
	const fn complement(self) -> Self {
		Self {
			atom: self.atom,
			negated: !self.negated,
		}
	}
}

/// A conjunction of literals. Kept as a sorted set so two cubes with the same literals in any
/// construction order compare equal.
type Cube = BTreeSet<Literal>;

/// A boolean expression over [`Atom`]s, represented as a disjunction of conjunctions (DNF).
///
/// `cubes.is_empty()` means `⊥` (unsatisfiable). A single cube with no literals means `⊤`.
/// Richer backends (BDD, SAT) are permitted by the specification this type implements; this one
/// is the "naive DNF" baseline that the specification calls out as sufficient for tests and
/// realistic single-file preprocessor nests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Condition {
	cubes: BTreeSet<Cube>,
}

impl Condition {
	/// The unconditional, always-true condition (`⊤`).
	#[must_use]
	pub fn unconditional() -> Self {
		let mut cubes = BTreeSet::new();
		cubes.insert(Cube::new());
		Self { cubes }
	}

	/// The unsatisfiable condition (`⊥`).
	#[must_use]
	pub fn never() -> Self {
		Self { cubes: BTreeSet::new() }
	}

	/// Builds a condition from a single atom.
	#[must_use]
	pub fn atom(id: AtomId) -> Self {
		let mut cube = Cube::new();
		cube.insert(Literal { atom: id, negated: false });
		let mut cubes = BTreeSet::new();
		cubes.insert(cube);
		Self { cubes }
	}

	/// Whether this condition is `⊤` (syntactically, after normalization — every equivalent-to-⊤
	/// condition normalizes to this shape because subsumption always collapses a tautological
	/// disjunction down to the single empty cube).
	#[must_use]
	pub fn is_unconditional(&self) -> bool {
		self.cubes.len() == 1 && self.cubes.iter().next().is_some_and(Cube::is_empty)
	}

	/// Whether this condition is `⊥`.
	#[must_use]
	pub fn is_never(&self) -> bool {
		self.cubes.is_empty()
	}

	/// `conjunction(a, b)`: distributes every cube of `self` against every cube of `other`,
	/// dropping cubes that contain both a literal and its negation (unsatisfiable), then
	/// normalizes by subsumption.
	#[must_use]
	pub fn conjunction(&self, other: &Self) -> Self {
		let mut cubes = BTreeSet::new();
		for left in &self.cubes {
			for right in &other.cubes {
				let mut merged = left.clone();
				merged.extend(right.iter().copied());
				if is_satisfiable(&merged) {
					cubes.insert(merged);
				}
			}
		}
		normalize(cubes)
	}

	/// `disjunction(a, b)`: the union of both cube sets, normalized by subsumption.
	#[must_use]
	pub fn disjunction(&self, other: &Self) -> Self {
		let mut cubes = self.cubes.clone();
		cubes.extend(other.cubes.iter().cloned());
		normalize(cubes)
	}

	/// `complement(a)`: De Morgan's law applied to the DNF form. Each cube `l1 ∧ l2 ∧ ...`
	/// negates to `¬l1 ∨ ¬l2 ∨ ...`; the complement of the whole disjunction is the conjunction
	/// of those per-cube disjunctions, computed by iteratively conjoining single-literal
	/// conditions and redistributing.
	///
	/// This only needs the atoms already present in `self` — for propositional atoms (as opposed
	/// to the enumerated value domains real BDD backends track) De Morgan gives an exact,
	/// complete negation without consulting a wider universe of sibling conditions. See
	/// `DESIGN.md` for why this repository resolves the specification's "reference universe"
	/// wording this way.
	#[must_use]
	pub fn complement(&self) -> Self {
		if self.is_never() {
			return Self::unconditional();
		}
		let mut result = Self::unconditional();
		for cube in &self.cubes {
			let mut per_cube_disjunction = Self::never();
			for literal in cube {
				per_cube_disjunction = per_cube_disjunction.disjunction(&literal_condition(literal.complement()));
			}
			result = result.conjunction(&per_cube_disjunction);
		}
		result
	}

	/// `¬c1 ∧ ¬c2 ∧ ...` over a set of already-collected sibling conditions. Used for `#elif`
	/// and `#else`, where `others` is the disjunction of every branch condition opened so far
	/// for the same conditional.
	#[must_use]
	pub fn complement_of_all<'conditions>(others: impl IntoIterator<Item = &'conditions Self>) -> Self {
		let collected = others.into_iter().fold(Self::never(), |accumulated, next| accumulated.disjunction(next));
		collected.complement()
	}

	/// `a.implies(b)`: true iff `a ∧ ¬b` is unsatisfiable. Never returns true for a
	/// non-implication (soundness); because this algebra's complement is exact, this is also
	/// complete for propositional atoms.
	#[must_use]
	pub fn implies(&self, other: &Self) -> bool {
		self.conjunction(&other.complement()).is_never()
	}

	/// `a.equivalent(b)`: `a.implies(b) ∧ b.implies(a)`. Reflexive and symmetric by construction.
	#[must_use]
	pub fn equivalent(&self, other: &Self) -> bool {
		self.implies(other) && other.implies(self)
	}

	/// Renders this condition as a human-readable boolean expression, resolving atom ids through
	/// the given table. Used by diagnostics and the `ls`/`track` output formatters.
	#[must_use]
	pub fn display(&self, atoms: &AtomTable) -> String {
		if self.is_never() {
			return "false".to_owned();
		}
		if self.is_unconditional() {
			return "true".to_owned();
		}
		let mut cube_strings: Vec<String> = self
			.cubes
			.iter()
			.map(|cube| {
				let mut literal_strings: Vec<String> = cube
					.iter()
					.map(|literal| {
						let atom = atoms.resolve(literal.atom);
						if literal.negated {
							format!("!({atom})")
						} else {
							format!("{atom}")
						}
					})
					.collect();
				literal_strings.sort();
				if literal_strings.len() == 1 {
					literal_strings.remove(0)
				} else {
					format!("({})", literal_strings.join(" && "))
				}
			})
			.collect();
		cube_strings.sort();
		if cube_strings.len() == 1 {
			cube_strings.remove(0)
		} else {
			cube_strings.join(" || ")
		}
	}
}

fn literal_condition(literal: Literal) -> Condition {
	let mut cube = Cube::new();
	cube.insert(literal);
	let mut cubes = BTreeSet::new();
	cubes.insert(cube);
	Condition { cubes }
}

fn is_satisfiable(cube: &Cube) -> bool {
	!cube.iter().any(|literal| cube.contains(&literal.complement()))
}

/// Removes any cube that is a (non-strict) superset of another cube in the set: a superset cube
/// constrains more and is therefore redundant in a disjunction once the subset cube is present.
fn normalize(cubes: BTreeSet<Cube>) -> Condition {
	let kept: Vec<Cube> = cubes
		.iter()
		.filter(|candidate| {
			!cubes
				.iter()
				.any(|other| other != *candidate && other.is_subset(candidate) && !(candidate.is_subset(other) && *candidate > other))
		})
		.cloned()
		.collect();
	Condition { cubes: kept.into_iter().collect() }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn atom(table: &mut AtomTable, name: &str) -> Condition {
		Condition::atom(table.intern(Atom::Truthy(name.to_owned())))
	}

	#[test]
	fn conjunction_of_atom_and_its_complement_is_never() {
		let mut table = AtomTable::new();
		let a = atom(&mut table, "A");
		assert!(a.conjunction(&a.complement()).is_never());
	}

	#[test]
	fn implication_is_reflexive() {
		let mut table = AtomTable::new();
		let a = atom(&mut table, "A");
		assert!(a.implies(&a));
	}

	#[test]
	fn mutual_implication_is_equivalence() {
		let mut table = AtomTable::new();
		let a = atom(&mut table, "A");
		let b = atom(&mut table, "B");
		let disjunction = a.disjunction(&b);
		let redundant = disjunction.disjunction(&a);
		assert!(disjunction.equivalent(&redundant));
	}

	#[test]
	fn elif_complement_excludes_prior_branches() {
		let mut table = AtomTable::new();
		let a = atom(&mut table, "A");
		let b = atom(&mut table, "B");
		let elif_condition = b.conjunction(&Condition::complement_of_all([&a]));
		assert!(elif_condition.implies(&b));
		assert!(!elif_condition.implies(&a));
		assert!(elif_condition.conjunction(&a).is_never());
	}

	#[test]
	fn unconditional_absorbs_disjunction() {
		let mut table = AtomTable::new();
		let a = atom(&mut table, "A");
		let joined = a.disjunction(&Condition::unconditional());
		assert!(joined.equivalent(&Condition::unconditional()));
	}

	#[test]
	fn atoms_intern_to_the_same_id() {
		let mut table = AtomTable::new();
		let first = table.intern(Atom::Defined("FOO".to_owned()));
		let second = table.intern(Atom::Defined("FOO".to_owned()));
		assert_eq!(first, second);
	}

	#[test]
	fn de_morgan_round_trips_through_double_complement() {
		let mut table = AtomTable::new();
		let a = atom(&mut table, "A");
		let b = atom(&mut table, "B");
		let condition = a.conjunction(&b).disjunction(&a.complement());
		assert!(condition.equivalent(&condition.complement().complement()));
	}
}

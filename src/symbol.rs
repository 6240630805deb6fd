//! The symbol index (C7): maps `(namespace, identifier)` to the set of symbols declared under
//! that name, each carrying the condition under which it exists. Insertion applies the
//! condition-qualified merge rules of §4.5 so that the same declaration seen down two
//! differently-conditioned branches collapses into one symbol with a widened condition, while a
//! genuinely conflicting redeclaration is surfaced as a diagnostic rather than silently dropped.

use std::collections::HashMap;

use crate::condition::{AtomTable, Condition};
use crate::diagnostics::{EngineError, SourceLocation};

/// The kind of thing a symbol names. Determines both its [`Namespace`] and its default linkage
/// when no storage class decides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolFamily {
	Function,
	Variable,
	Typedef,
	TagStruct,
	TagUnion,
	TagEnum,
	EnumConstant,
	MacroObject,
	MacroFunction,
	Label,
}

impl SymbolFamily {
	/// C keeps tags (`struct`/`union`/`enum` names), ordinary identifiers, and labels in three
	/// separate namespaces that never collide with one another.
	#[must_use]
	pub const fn namespace(self) -> Namespace {
		match self {
			Self::TagStruct | Self::TagUnion | Self::TagEnum => Namespace::Tag,
			Self::Label => Namespace::Label,
			Self::Function | Self::Variable | Self::Typedef | Self::EnumConstant | Self::MacroObject | Self::MacroFunction => Namespace::Ordinary,
		}
	}

	/// The linkage a symbol of this family has when no explicit storage class overrides it:
	/// functions and file-scope variables default to external, everything else has none.
	#[must_use]
	pub const fn default_linkage(self) -> Linkage {
		match self {
			Self::Function | Self::Variable => Linkage::External,
			_ => Linkage::None,
		}
	}
}

/// The three disjoint namespaces C declarations live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
	Ordinary,
	Tag,
	Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
	None,
	Internal,
	External,
	TypedefNameOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
	Static,
	Extern,
	Typedef,
	Register,
	Auto,
}

/// One declaration or definition site, kept for diagnostics and `ls --each`.
#[derive(Debug, Clone)]
pub struct Occurrence {
	pub location: SourceLocation,
	pub is_definition: bool,
}

/// A symbol in the index: an identifier in a namespace, the condition under which it exists, and
/// enough signature information to tell two candidate merges apart.
#[derive(Debug, Clone)]
pub struct Symbol {
	pub identifier: String,
	pub family: SymbolFamily,
	pub existence_condition: Condition,
	pub linkage: Linkage,
	pub storage_class: Option<StorageClass>,
	pub type_signature: String,
	pub occurrences: Vec<Occurrence>,
}

impl Symbol {
	#[must_use]
	pub const fn namespace(&self) -> Namespace {
		self.family.namespace()
	}

	/// Structural equality per §4.5: family, linkage, storage class, and signature must all
	/// agree. Two symbols that differ only in their existence condition or occurrence list are
	/// still structurally equal.
	#[must_use]
	pub fn structurally_equal(&self, other: &Self) -> bool {
		self.family == other.family && self.linkage == other.linkage && self.storage_class == other.storage_class && self.type_signature == other.type_signature
	}
}

/// Filters accepted by [`SymbolIndex::find`].
#[derive(Debug, Clone, Default)]
pub struct SymbolCriteria {
	pub identifier: Option<String>,
	pub namespace: Option<Namespace>,
	pub family: Option<SymbolFamily>,
}

impl SymbolCriteria {
	fn matches(&self, symbol: &Symbol) -> bool {
		self.identifier.as_deref().map_or(true, |identifier| identifier == symbol.identifier)
			&& self.namespace.map_or(true, |namespace| namespace == symbol.namespace())
			&& self.family.map_or(true, |family| family == symbol.family)
	}
}

/// The index itself: one bucket of candidate symbols per `(namespace, identifier)` key.
#[derive(Debug, Default)]
pub struct SymbolIndex {
	buckets: HashMap<(Namespace, String), Vec<Symbol>>,
}

impl SymbolIndex {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or merges `candidate` per §4.5's five-step algorithm, returning the canonical
	/// symbol this insertion resolved to, or a diagnostic if the candidate structurally conflicts
	/// with an existing symbol whose condition overlaps it.
	///
	/// # Errors
	/// Returns [`EngineError::ConditionAlgebra`] when the candidate and an existing symbol with
	/// an implying/implied/overlapping condition are not structurally equal.
	pub fn announce(&mut self, candidate: Symbol, location: &SourceLocation) -> Result<(), EngineError> {
		let key = (candidate.namespace(), candidate.identifier.clone());
		let bucket = self.buckets.entry(key).or_default();

		let mut implies_indices = Vec::new();
		let mut implied_indices = Vec::new();
		let mut independent_indices = Vec::new();
		for (index, existing) in bucket.iter().enumerate() {
			if existing.existence_condition.implies(&candidate.existence_condition) {
				implies_indices.push(index);
			} else if candidate.existence_condition.implies(&existing.existence_condition) {
				implied_indices.push(index);
			} else {
				independent_indices.push(index);
			}
		}

		if !implies_indices.is_empty() && !implied_indices.is_empty() {
			return Err(EngineError::structural("symbol condition partition produced both an implying and an implied group"));
		}
		if implies_indices.len() > 1 || implied_indices.len() > 1 {
			return Err(EngineError::structural("symbol condition partition produced more than one implying/implied candidate"));
		}

		if let [only] = implies_indices[..] {
			let existing = &bucket[only];
			if existing.structurally_equal(&candidate) {
				return Ok(());
			}
			return Err(EngineError::ConditionAlgebra {
				location: location.clone(),
				identifier: candidate.identifier,
				message: format!("existing declaration under a stricter condition does not match this one for `{}`", bucket[only].identifier),
			});
		}

		if let [only] = implied_indices[..] {
			if !bucket[only].structurally_equal(&candidate) {
				return Err(EngineError::ConditionAlgebra {
					location: location.clone(),
					identifier: candidate.identifier,
					message: format!("existing declaration under a weaker condition does not match this one for `{}`", bucket[only].identifier),
				});
			}
			bucket[only].existence_condition = bucket[only].existence_condition.conjunction(&candidate.existence_condition);
			bucket[only].occurrences.extend(candidate.occurrences);
			return Ok(());
		}

		if let Some(matching) = independent_indices.into_iter().find(|index| bucket[*index].structurally_equal(&candidate)) {
			bucket[matching].existence_condition = bucket[matching].existence_condition.disjunction(&candidate.existence_condition);
			bucket[matching].occurrences.extend(candidate.occurrences);
			return Ok(());
		}

		bucket.push(candidate);
		Ok(())
	}

	/// Returns every symbol matching `criteria`, across all namespaces/identifiers.
	#[must_use]
	pub fn find(&self, criteria: &SymbolCriteria) -> Vec<&Symbol> {
		self.buckets.values().flatten().filter(|symbol| criteria.matches(symbol)).collect()
	}

	/// The disjunction of every symbol's existence condition sharing `(namespace, identifier)`:
	/// the condition under which *some* declaration of that name is visible (P4).
	#[must_use]
	pub fn visibility(&self, namespace: Namespace, identifier: &str) -> Condition {
		self.buckets
			.get(&(namespace, identifier.to_owned()))
			.map(|bucket| bucket.iter().fold(Condition::never(), |accumulated, symbol| accumulated.disjunction(&symbol.existence_condition)))
			.unwrap_or_else(Condition::never)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::condition::Atom;

	fn location() -> SourceLocation {
		SourceLocation { file: "a.c".to_owned(), line: 1, column: 1 }
	}

	fn symbol(identifier: &str, condition: Condition, signature: &str) -> Symbol {
		Symbol {
			identifier: identifier.to_owned(),
			family: SymbolFamily::Variable,
			existence_condition: condition,
			linkage: Linkage::External,
			storage_class: None,
			type_signature: signature.to_owned(),
			occurrences: vec![],
		}
	}

	#[test]
	fn identical_declarations_under_equivalent_conditions_merge_to_one_symbol() {
		let mut table = AtomTable::new();
		let a = Condition::atom(table.intern(Atom::Truthy("A".to_owned())));
		let mut index = SymbolIndex::new();
		index.announce(symbol("x", a.clone(), "int"), &location()).expect("first announce succeeds");
		index.announce(symbol("x", a.clone(), "int"), &location()).expect("second announce succeeds");

		let found = index.find(&SymbolCriteria { identifier: Some("x".to_owned()), ..SymbolCriteria::default() });
		assert_eq!(found.len(), 1);
		assert!(found[0].existence_condition.equivalent(&a));
	}

	#[test]
	fn independent_conditions_widen_by_disjunction() {
		let mut table = AtomTable::new();
		let a = Condition::atom(table.intern(Atom::Truthy("A".to_owned())));
		let b = Condition::atom(table.intern(Atom::Truthy("B".to_owned())));
		let mut index = SymbolIndex::new();
		index.announce(symbol("x", a.clone(), "int"), &location()).expect("first announce succeeds");
		index.announce(symbol("x", b.conjunction(&a.complement()), "int"), &location()).expect("second announce succeeds");

		let found = index.find(&SymbolCriteria { identifier: Some("x".to_owned()), ..SymbolCriteria::default() });
		assert_eq!(found.len(), 1);
		assert!(found[0].existence_condition.equivalent(&a.disjunction(&b)));
	}

	#[test]
	fn structurally_different_declarations_under_overlapping_conditions_conflict() {
		let mut table = AtomTable::new();
		let a = Condition::atom(table.intern(Atom::Truthy("A".to_owned())));
		let mut index = SymbolIndex::new();
		index.announce(symbol("x", a.clone(), "int"), &location()).expect("first announce succeeds");
		let outcome = index.announce(symbol("x", a, "float"), &location());
		assert!(outcome.is_err());
	}
}

use crate::patterns::{Modifiers, PatternId, Span};
use std::collections::BTreeMap;
use std::fmt;

/// Index of a pattern variable in a [`PatternBindingTable`](crate::patterns::PatternBindingTable)
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Finality {
    /// Assignable like any other local
    Plain,

    /// Declared `final`
    Final,
}

impl From<Modifiers> for Finality {
    fn from(modifiers: Modifiers) -> Finality {
        if modifiers.contains(Modifiers::FINAL) {
            Finality::Final
        } else {
            Finality::Plain
        }
    }
}

/// When the variable is definitely matched
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Polarity {
    WhenTrue,
    WhenFalse,

    /// Introduced into the enclosing block by a statement that cannot be exited otherwise
    Unconditional,
}

/// Variable bound by a type pattern
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternVariable {
    pub name: String,
    pub ty: String,
    pub pattern: PatternId,
    pub finality: Finality,
    pub polarity: Polarity,
    pub span: Span,
}

/// Ordered set of pattern variables
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingSet(Vec<VarId>);

impl BindingSet {
    pub fn new() -> BindingSet {
        BindingSet(vec![])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, var: VarId) -> bool {
        self.0.contains(&var)
    }

    pub fn insert(&mut self, var: VarId) {
        if !self.contains(var) {
            self.0.push(var);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = VarId> + '_ {
        self.0.iter().copied()
    }

    pub fn union(&self, other: &BindingSet) -> BindingSet {
        let mut out = self.clone();
        for var in other.iter() {
            out.insert(var);
        }
        out
    }

    pub fn intersection(&self, other: &BindingSet) -> BindingSet {
        self.iter().filter(|var| other.contains(*var)).collect()
    }
}

impl FromIterator<VarId> for BindingSet {
    fn from_iter<I: IntoIterator<Item = VarId>>(iter: I) -> BindingSet {
        let mut set = BindingSet::new();
        for var in iter {
            set.insert(var);
        }
        set
    }
}

/// Variables matched when a boolean expression is `true`, and when it is `false`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Facts {
    pub when_true: BindingSet,
    pub when_false: BindingSet,
}

impl Facts {
    pub fn none() -> Facts {
        Facts::default()
    }

    /// Facts of `!e` given the facts of `e`
    pub fn negate(self) -> Facts {
        Facts {
            when_true: self.when_false,
            when_false: self.when_true,
        }
    }
}

/// Whether a name is bound at a program point
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BindingState {
    NotBound,
    BoundTrue,
    BoundFalse,
    BoundBoth,
}

impl BindingState {
    fn join(self, other: BindingState) -> BindingState {
        use BindingState::*;
        match (self, other) {
            (NotBound, state) | (state, NotBound) => state,
            (BoundTrue, BoundTrue) => BoundTrue,
            (BoundFalse, BoundFalse) => BoundFalse,
            _ => BoundBoth,
        }
    }
}

/// Binding state of every pattern variable name at one boolean expression
///
/// Names in scope around the expression are [`BindingState::BoundBoth`]; names the expression
/// binds are [`BindingState::BoundTrue`] or [`BindingState::BoundFalse`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScopeFact {
    states: BTreeMap<String, BindingState>,
}

impl ScopeFact {
    pub fn get(&self, name: &str) -> BindingState {
        self.states
            .get(name)
            .copied()
            .unwrap_or(BindingState::NotBound)
    }

    pub(crate) fn bind(&mut self, name: &str, state: BindingState) {
        let entry = self
            .states
            .entry(name.to_owned())
            .or_insert(BindingState::NotBound);
        *entry = entry.join(state);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, BindingState)> {
        self.states.iter().map(|(name, state)| (name.as_str(), *state))
    }
}

impl fmt::Display for ScopeFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, state)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {:?}", name, state)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn set_operations_keep_order() {
        let a: BindingSet = vec![VarId(2), VarId(0), VarId(2)].into_iter().collect();
        let b: BindingSet = vec![VarId(1), VarId(0)].into_iter().collect();

        assert_eq!(a.union(&b).iter().collect::<Vec<_>>(), vec![VarId(2), VarId(0), VarId(1)]);
        assert_eq!(a.intersection(&b).iter().collect::<Vec<_>>(), vec![VarId(0)]);
    }

    #[test]
    fn negation_swaps() {
        let facts = Facts {
            when_true: vec![VarId(0)].into_iter().collect(),
            when_false: BindingSet::new(),
        };
        let negated = facts.negate();
        assert!(negated.when_true.is_empty());
        assert!(negated.when_false.contains(VarId(0)));
    }

    #[test]
    fn scope_fact_joins_states() {
        let mut fact = ScopeFact::default();
        fact.bind("s", BindingState::BoundTrue);
        fact.bind("t", BindingState::BoundFalse);
        fact.bind("s", BindingState::BoundFalse);
        assert_eq!(fact.get("s"), BindingState::BoundBoth);
        assert_eq!(fact.get("t"), BindingState::BoundFalse);
        assert_eq!(fact.get("u"), BindingState::NotBound);
        assert_eq!(fact.to_string(), "{s: BoundBoth, t: BoundFalse}");
    }

    #[test]
    fn final_modifier() {
        assert_eq!(Finality::from(Modifiers::FINAL), Finality::Final);
        assert_eq!(Finality::from(Modifiers::empty()), Finality::Plain);
    }
}

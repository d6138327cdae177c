use crate::patterns::{Body, PatternId, PatternKind};
use std::collections::{HashMap, HashSet};

/// Subtyping oracle used to order case labels
pub trait TypeHierarchy {
    /// Is the first type a subtype of the second?
    ///
    /// `None` means the hierarchy doesn't know one of the types.
    fn is_subtype(&self, sub_type: &str, super_type: &str) -> Option<bool>;
}

/// Hierarchy built from declared direct supertypes
///
/// Types are named however the caller likes, as long as it is consistent. `Object` and
/// `java.lang.Object` are supertypes of everything.
#[derive(Debug, Default, Clone)]
pub struct ClassHierarchy {
    supertypes: HashMap<String, Vec<String>>,
}

impl ClassHierarchy {
    pub fn new() -> ClassHierarchy {
        ClassHierarchy::default()
    }

    /// Declare a type and its direct supertypes (superclass and interfaces)
    pub fn declare<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        supertypes: impl IntoIterator<Item = S>,
    ) -> &mut ClassHierarchy {
        self.supertypes.insert(
            name.into(),
            supertypes.into_iter().map(Into::into).collect(),
        );
        self
    }

    fn is_object(name: &str) -> bool {
        name == "Object" || name == "java.lang.Object"
    }
}

/// This does a traversal of super types to determine subtyping
impl TypeHierarchy for ClassHierarchy {
    fn is_subtype(&self, sub_type: &str, super_type: &str) -> Option<bool> {
        if sub_type == super_type || ClassHierarchy::is_object(super_type) {
            return Some(true);
        }
        if !self.supertypes.contains_key(sub_type) {
            return None;
        }

        let mut supertypes_to_visit: Vec<&str> = vec![sub_type];
        let mut dont_revisit: HashSet<&str> = HashSet::new();
        dont_revisit.insert(sub_type);
        let mut complete = true;

        while let Some(class) = supertypes_to_visit.pop() {
            if class == super_type {
                return Some(true);
            }
            match self.supertypes.get(class) {
                Some(supertypes) => {
                    for supertype in supertypes {
                        let supertype = supertype.as_str();
                        if dont_revisit.insert(supertype) {
                            supertypes_to_visit.push(supertype);
                        }
                    }
                }
                None if ClassHierarchy::is_object(class) => (),

                // Something above us is unknown, so it might still extend the super type
                None => complete = false,
            }
        }

        if complete {
            Some(false)
        } else {
            None
        }
    }
}

/// Hierarchy that knows nothing beyond reflexivity and `Object`
#[derive(Debug, Default, Copy, Clone)]
pub struct NoHierarchy;

impl TypeHierarchy for NoHierarchy {
    fn is_subtype(&self, sub_type: &str, super_type: &str) -> Option<bool> {
        if sub_type == super_type || ClassHierarchy::is_object(super_type) {
            Some(true)
        } else {
            None
        }
    }
}

/// Outcome of comparing an earlier case label with a later one
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Dominance {
    Dominates,
    DoesNotDominate,

    /// The hierarchy couldn't answer a subtyping question along the way
    Unknown,
}

impl Dominance {
    fn and(self, other: Dominance) -> Dominance {
        match (self, other) {
            (Dominance::DoesNotDominate, _) | (_, Dominance::DoesNotDominate) => {
                Dominance::DoesNotDominate
            }
            (Dominance::Unknown, _) | (_, Dominance::Unknown) => Dominance::Unknown,
            _ => Dominance::Dominates,
        }
    }

    fn from_subtype(answer: Option<bool>) -> Dominance {
        match answer {
            Some(true) => Dominance::Dominates,
            Some(false) => Dominance::DoesNotDominate,
            None => Dominance::Unknown,
        }
    }
}

/// Does the earlier pattern match everything the later one does?
///
/// A type pattern dominates any pattern whose type is a subtype of its own. A record pattern
/// only dominates another record pattern of the same record type whose components are each
/// dominated by the corresponding component. `var` and `_` components match anything.
pub fn dominates(
    body: &Body,
    hierarchy: &dyn TypeHierarchy,
    earlier: PatternId,
    later: PatternId,
) -> Dominance {
    match (&body[earlier].kind, &body[later].kind) {
        (PatternKind::Unnamed, _) => Dominance::Dominates,
        (PatternKind::Type { ty, .. }, _) if ty == PatternKind::VAR => Dominance::Dominates,
        (_, PatternKind::Unnamed) => Dominance::DoesNotDominate,
        (_, PatternKind::Type { ty, .. }) if ty == PatternKind::VAR => Dominance::DoesNotDominate,

        (PatternKind::Type { ty: earlier_ty, .. }, PatternKind::Type { ty: later_ty, .. })
        | (PatternKind::Type { ty: earlier_ty, .. }, PatternKind::Record { ty: later_ty, .. }) => {
            Dominance::from_subtype(hierarchy.is_subtype(later_ty, earlier_ty))
        }

        (PatternKind::Record { .. }, PatternKind::Type { .. }) => Dominance::DoesNotDominate,

        (
            PatternKind::Record {
                ty: earlier_ty,
                components: earlier_components,
            },
            PatternKind::Record {
                ty: later_ty,
                components: later_components,
            },
        ) => {
            if earlier_ty != later_ty || earlier_components.len() != later_components.len() {
                return Dominance::DoesNotDominate;
            }
            earlier_components
                .iter()
                .zip(later_components)
                .fold(Dominance::Dominates, |acc, (e, l)| {
                    acc.and(dominates(body, hierarchy, *e, *l))
                })
        }
    }
}

/// Is the pattern unconditional for the selector type (matches every non-null value)?
pub fn is_unconditional(
    body: &Body,
    hierarchy: &dyn TypeHierarchy,
    pattern: PatternId,
    selector_type: &str,
) -> bool {
    match &body[pattern].kind {
        PatternKind::Type { ty, .. } => {
            hierarchy.is_subtype(selector_type, ty) == Some(true)
        }
        PatternKind::Record { .. } | PatternKind::Unnamed => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn hierarchy() -> ClassHierarchy {
        let mut hierarchy = ClassHierarchy::new();
        hierarchy
            .declare("CharSequence", Vec::<String>::new())
            .declare("String", vec!["Object", "CharSequence"])
            .declare("Integer", vec!["Number"])
            .declare("Number", vec!["Object"])
            .declare("Point", vec!["Record"])
            .declare("Record", vec!["Object"]);
        hierarchy
    }

    #[test]
    fn subtyping() {
        let hierarchy = hierarchy();
        assert_eq!(hierarchy.is_subtype("String", "CharSequence"), Some(true));
        assert_eq!(hierarchy.is_subtype("Integer", "Object"), Some(true));
        assert_eq!(hierarchy.is_subtype("Integer", "String"), Some(false));
        assert_eq!(hierarchy.is_subtype("Mystery", "String"), None);
    }

    #[test]
    fn unknown_ancestors_are_not_guessed() {
        let mut hierarchy = ClassHierarchy::new();
        hierarchy.declare("A", vec!["Unknown"]);
        assert_eq!(hierarchy.is_subtype("A", "B"), None);
    }

    #[test]
    fn type_patterns() {
        let hierarchy = hierarchy();
        let mut body = Body::new();
        let char_sequence = body.type_pattern("CharSequence", "c");
        let string = body.type_pattern("String", "s");
        let integer = body.type_pattern("Integer", "i");

        assert_eq!(dominates(&body, &hierarchy, char_sequence, string), Dominance::Dominates);
        assert_eq!(dominates(&body, &hierarchy, string, char_sequence), Dominance::DoesNotDominate);
        assert_eq!(dominates(&body, &hierarchy, string, integer), Dominance::DoesNotDominate);
    }

    #[test]
    fn record_patterns() {
        let hierarchy = hierarchy();
        let mut body = Body::new();
        let x = body.type_pattern("Integer", "x");
        let y = body.type_pattern("var", "y");
        let narrow = body.record_pattern("Point", vec![x, y]);
        let a = body.type_pattern("Number", "a");
        let b = body.type_pattern("Integer", "b");
        let wide = body.record_pattern("Point", vec![a, b]);
        let whole = body.type_pattern("Point", "p");

        assert_eq!(dominates(&body, &hierarchy, whole, narrow), Dominance::Dominates);
        assert_eq!(dominates(&body, &hierarchy, narrow, whole), Dominance::DoesNotDominate);

        // `Integer x` doesn't cover `Number a`, and `Integer b` doesn't cover `var y`
        assert_eq!(dominates(&body, &hierarchy, narrow, wide), Dominance::DoesNotDominate);
        assert_eq!(dominates(&body, &hierarchy, wide, narrow), Dominance::DoesNotDominate);

        let unknown = body.type_pattern("Mystery", "m");
        let z = body.type_pattern("Integer", "z");
        let with_unknown = body.record_pattern("Point", vec![unknown, z]);
        let c = body.type_pattern("String", "c");
        let d = body.type_pattern("Integer", "d");
        let other = body.record_pattern("Point", vec![c, d]);
        assert_eq!(dominates(&body, &hierarchy, other, with_unknown), Dominance::Unknown);
    }

    #[test]
    fn unconditional() {
        let hierarchy = hierarchy();
        let mut body = Body::new();
        let object = body.type_pattern("Object", "o");
        let string = body.type_pattern("String", "s");
        assert!(is_unconditional(&body, &hierarchy, object, "String"));
        assert!(is_unconditional(&body, &hierarchy, string, "String"));
        assert!(!is_unconditional(&body, &hierarchy, string, "CharSequence"));
    }
}

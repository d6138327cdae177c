use crate::jvm::class_file::{TypePath, TypePathEntry};
use crate::jvm::Error;
use crate::typeanno::Annotation;
use std::fmt;

/// Syntactic shape of a type as written at a use site, with the annotations written on each part
///
/// Annotations are attached to the node they qualify in source. In particular, for array types,
/// the annotations on an `Array` node are those written immediately before its `[]`, and the
/// outermost `Array` node is the leftmost `[]` (so `String @X [] @Y []` is
/// `Array(@X, Array(@Y, String))`).
#[derive(Debug, Clone, PartialEq)]
pub enum TypeTree {
    /// Primitive, type variable, or (unqualified) class name
    Simple {
        name: String,
        annotations: Vec<Annotation>,
    },

    Array {
        element: Box<TypeTree>,
        annotations: Vec<Annotation>,
    },

    /// Generic class type with its type arguments (annotations live on `base`)
    Parameterized {
        base: Box<TypeTree>,
        arguments: Vec<TypeTree>,
    },

    Wildcard {
        bound: Option<(WildcardBound, Box<TypeTree>)>,
        annotations: Vec<Annotation>,
    },

    /// Member type selected out of an enclosing type (`Outer.Inner`)
    ///
    /// `is_static` is set when `inner` is a static member, in which case `outer` is only a
    /// qualifier and not an enclosing instance type.
    Nested {
        outer: Box<TypeTree>,
        inner: Box<TypeTree>,
        is_static: bool,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum WildcardBound {
    Extends,
    Super,
}

/// One annotation on a type use, together with where in the type it sits
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedTypeOccurrence<'a> {
    pub annotation: &'a Annotation,
    pub path: TypePath,
}

impl TypeTree {
    pub fn simple(name: impl Into<String>) -> TypeTree {
        TypeTree::Simple {
            name: name.into(),
            annotations: vec![],
        }
    }

    pub fn array(element: TypeTree) -> TypeTree {
        TypeTree::Array {
            element: Box::new(element),
            annotations: vec![],
        }
    }

    pub fn parameterized(base: TypeTree, arguments: Vec<TypeTree>) -> TypeTree {
        TypeTree::Parameterized {
            base: Box::new(base),
            arguments,
        }
    }

    /// Unbounded wildcard `?`
    pub fn wildcard() -> TypeTree {
        TypeTree::Wildcard {
            bound: None,
            annotations: vec![],
        }
    }

    pub fn wildcard_extends(bound: TypeTree) -> TypeTree {
        TypeTree::Wildcard {
            bound: Some((WildcardBound::Extends, Box::new(bound))),
            annotations: vec![],
        }
    }

    pub fn wildcard_super(bound: TypeTree) -> TypeTree {
        TypeTree::Wildcard {
            bound: Some((WildcardBound::Super, Box::new(bound))),
            annotations: vec![],
        }
    }

    /// Inner (non-static) member type
    pub fn inner(outer: TypeTree, inner: TypeTree) -> TypeTree {
        TypeTree::Nested {
            outer: Box::new(outer),
            inner: Box::new(inner),
            is_static: false,
        }
    }

    /// Static member type
    pub fn static_member(outer: TypeTree, inner: TypeTree) -> TypeTree {
        TypeTree::Nested {
            outer: Box::new(outer),
            inner: Box::new(inner),
            is_static: true,
        }
    }

    /// Add an annotation to the node itself
    ///
    /// On `Parameterized` the annotation goes on the base and on `Nested` on the member type,
    /// matching where it would be written (`@A List<String>`, `Outer.@A Inner`).
    pub fn annotated(mut self, annotation: Annotation) -> TypeTree {
        self.push_annotation(annotation);
        self
    }

    fn push_annotation(&mut self, annotation: Annotation) {
        match self {
            TypeTree::Simple { annotations, .. }
            | TypeTree::Array { annotations, .. }
            | TypeTree::Wildcard { annotations, .. } => annotations.push(annotation),
            TypeTree::Parameterized { base, .. } => base.push_annotation(annotation),
            TypeTree::Nested { inner, .. } => inner.push_annotation(annotation),
        }
    }

    /// Number of `INNER_TYPE` steps needed to get from this type to its innermost member type
    fn inner_depth(&self) -> usize {
        match self {
            TypeTree::Nested {
                outer,
                is_static: false,
                ..
            } => outer.inner_depth() + 1,
            TypeTree::Nested { is_static: true, .. } => 0,
            TypeTree::Parameterized { base, .. } => base.inner_depth(),
            _ => 0,
        }
    }

    /// Is any annotation written anywhere in this type?
    pub fn has_annotations(&self) -> bool {
        match self {
            TypeTree::Simple { annotations, .. } => !annotations.is_empty(),
            TypeTree::Array {
                element,
                annotations,
            } => !annotations.is_empty() || element.has_annotations(),
            TypeTree::Parameterized { base, arguments } => {
                base.has_annotations() || arguments.iter().any(TypeTree::has_annotations)
            }
            TypeTree::Wildcard { bound, annotations } => {
                !annotations.is_empty()
                    || bound.as_ref().map_or(false, |(_, b)| b.has_annotations())
            }
            TypeTree::Nested { outer, inner, .. } => {
                outer.has_annotations() || inner.has_annotations()
            }
        }
    }

    /// Every annotation in the type, with its type path, in source order
    ///
    /// Fails only if a type argument index or a path length does not fit in a byte.
    pub fn occurrences(&self) -> Result<Vec<AnnotatedTypeOccurrence<'_>>, Error> {
        let mut out = vec![];
        build_path(self, &TypePath::empty(), &mut out)?;
        Ok(out)
    }
}

/// Walk the tree below `prefix`, collecting annotations along with their paths
fn build_path<'a>(
    tree: &'a TypeTree,
    prefix: &TypePath,
    out: &mut Vec<AnnotatedTypeOccurrence<'a>>,
) -> Result<(), Error> {
    if prefix.len() > u8::MAX as usize {
        return Err(Error::TypePathTooLong(prefix.len()));
    }

    match tree {
        TypeTree::Simple { annotations, .. } => push_all(annotations, prefix, out),

        // Annotations on the element type come first in source even though the element is the
        // deepest part of the array type
        TypeTree::Array { .. } => {
            let mut levels: Vec<(&'a [Annotation], TypePath)> = vec![];
            let mut current = tree;
            let mut path = prefix.clone();
            while let TypeTree::Array {
                element,
                annotations,
            } = current
            {
                levels.push((annotations, path.clone()));
                path = path.with(TypePathEntry::Array);
                current = element;
            }
            build_path(current, &path, out)?;
            for (annotations, path) in levels {
                push_all(annotations, &path, out);
            }
        }

        TypeTree::Parameterized { base, arguments } => {
            build_path(base, prefix, out)?;

            let mut argument_prefix = prefix.clone();
            for _ in 0..base.inner_depth() {
                argument_prefix = argument_prefix.with(TypePathEntry::InnerType);
            }
            for (idx, argument) in arguments.iter().enumerate() {
                let idx = u8::try_from(idx)
                    .map_err(|_| Error::IndexOverflow("type argument index", idx))?;
                build_path(
                    argument,
                    &argument_prefix.with(TypePathEntry::TypeArgument(idx)),
                    out,
                )?;
            }
        }

        TypeTree::Wildcard { bound, annotations } => {
            push_all(annotations, prefix, out);
            if let Some((_, bound)) = bound {
                build_path(bound, &prefix.with(TypePathEntry::Wildcard), out)?;
            }
        }

        TypeTree::Nested {
            outer,
            inner,
            is_static,
        } => {
            build_path(outer, prefix, out)?;

            let mut inner_prefix = prefix.clone();
            if !is_static {
                for _ in 0..outer.inner_depth() + 1 {
                    inner_prefix = inner_prefix.with(TypePathEntry::InnerType);
                }
            }
            build_path(inner, &inner_prefix, out)?;
        }
    }
    Ok(())
}

fn push_all<'a>(
    annotations: &'a [Annotation],
    path: &TypePath,
    out: &mut Vec<AnnotatedTypeOccurrence<'a>>,
) {
    for annotation in annotations {
        out.push(AnnotatedTypeOccurrence {
            annotation,
            path: path.clone(),
        });
    }
}

/// Renders the type as it would appear in source (annotations included)
impl fmt::Display for TypeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn annotations(f: &mut fmt::Formatter<'_>, annotations: &[Annotation]) -> fmt::Result {
            for annotation in annotations {
                write!(f, "@{} ", annotation.type_name.source_name())?;
            }
            Ok(())
        }

        match self {
            TypeTree::Simple {
                name,
                annotations: annots,
            } => {
                annotations(f, annots)?;
                f.write_str(name)
            }
            TypeTree::Array { .. } => {
                let mut levels = vec![];
                let mut current = self;
                while let TypeTree::Array {
                    element,
                    annotations,
                } = current
                {
                    levels.push(annotations);
                    current = element;
                }
                write!(f, "{}", current)?;
                for annots in levels {
                    if !annots.is_empty() {
                        f.write_str(" ")?;
                        annotations(f, annots)?;
                    }
                    f.write_str("[]")?;
                }
                Ok(())
            }
            TypeTree::Parameterized { base, arguments } => {
                write!(f, "{}<", base)?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", argument)?;
                }
                f.write_str(">")
            }
            TypeTree::Wildcard {
                bound,
                annotations: annots,
            } => {
                annotations(f, annots)?;
                f.write_str("?")?;
                match bound {
                    Some((WildcardBound::Extends, bound)) => write!(f, " extends {}", bound),
                    Some((WildcardBound::Super, bound)) => write!(f, " super {}", bound),
                    None => Ok(()),
                }
            }
            TypeTree::Nested { outer, inner, .. } => write!(f, "{}.{}", outer, inner),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::BinaryName;
    use crate::typeanno::Retention;
    use TypePathEntry::*;

    fn anno(name: &'static str) -> Annotation {
        Annotation::marker(
            BinaryName::from_source_name(name).unwrap(),
            Retention::Runtime,
        )
    }

    /// Paths keyed by annotation name
    fn paths(tree: &TypeTree) -> Vec<(String, Vec<TypePathEntry>)> {
        tree.occurrences()
            .unwrap()
            .into_iter()
            .map(|occ| (occ.annotation.type_name.source_name(), occ.path.0))
            .collect()
    }

    #[test]
    fn nested_type_arguments() {
        // @A A<@B B<@C C>>
        let tree = TypeTree::parameterized(
            TypeTree::simple("A").annotated(anno("A")),
            vec![TypeTree::parameterized(
                TypeTree::simple("B").annotated(anno("B")),
                vec![TypeTree::simple("C").annotated(anno("C"))],
            )],
        );
        assert_eq!(
            paths(&tree),
            vec![
                (String::from("A"), vec![]),
                (String::from("B"), vec![TypeArgument(0)]),
                (String::from("C"), vec![TypeArgument(0), TypeArgument(0)]),
            ]
        );
    }

    #[test]
    fn annotations_before_brackets() {
        // String @X [] @Y []
        let tree = TypeTree::array(TypeTree::array(TypeTree::simple("String")).annotated(anno("Y")))
            .annotated(anno("X"));
        assert_eq!(
            paths(&tree),
            vec![(String::from("X"), vec![]), (String::from("Y"), vec![Array])]
        );
        assert_eq!(tree.to_string(), "String @X [] @Y []");
    }

    #[test]
    fn array_inside_type_argument() {
        // Y<@A String @C [][] @B []>
        let element = TypeTree::simple("String").annotated(anno("A"));
        let argument = TypeTree::array(TypeTree::array(
            TypeTree::array(element).annotated(anno("B")),
        ))
        .annotated(anno("C"));
        let tree = TypeTree::parameterized(TypeTree::simple("Y"), vec![argument]);

        assert_eq!(
            paths(&tree),
            vec![
                (
                    String::from("A"),
                    vec![TypeArgument(0), Array, Array, Array]
                ),
                (String::from("C"), vec![TypeArgument(0)]),
                (String::from("B"), vec![TypeArgument(0), Array, Array]),
            ]
        );
    }

    #[test]
    fn map_of_lists() {
        // Map<String, List<@A String>>
        let tree = TypeTree::parameterized(
            TypeTree::simple("Map"),
            vec![
                TypeTree::simple("String"),
                TypeTree::parameterized(
                    TypeTree::simple("List"),
                    vec![TypeTree::simple("String").annotated(anno("A"))],
                ),
            ],
        );
        assert_eq!(
            paths(&tree),
            vec![(String::from("A"), vec![TypeArgument(1), TypeArgument(0)])]
        );
    }

    #[test]
    fn wildcards() {
        // List<@A ? extends @B Number>
        let tree = TypeTree::parameterized(
            TypeTree::simple("List"),
            vec![TypeTree::wildcard_extends(TypeTree::simple("Number").annotated(anno("B")))
                .annotated(anno("A"))],
        );
        assert_eq!(
            paths(&tree),
            vec![
                (String::from("A"), vec![TypeArgument(0)]),
                (String::from("B"), vec![TypeArgument(0), Wildcard]),
            ]
        );
    }

    #[test]
    fn inner_types() {
        // @A Outer . @B Middle . @C Inner
        let tree = TypeTree::inner(
            TypeTree::inner(
                TypeTree::simple("Outer").annotated(anno("A")),
                TypeTree::simple("Middle").annotated(anno("B")),
            ),
            TypeTree::simple("Inner").annotated(anno("C")),
        );
        assert_eq!(
            paths(&tree),
            vec![
                (String::from("A"), vec![]),
                (String::from("B"), vec![InnerType]),
                (String::from("C"), vec![InnerType, InnerType]),
            ]
        );
    }

    #[test]
    fn static_member_restarts_count() {
        // Outer . @A StaticNested . @B Inner
        let tree = TypeTree::inner(
            TypeTree::static_member(
                TypeTree::simple("Outer"),
                TypeTree::simple("StaticNested").annotated(anno("A")),
            ),
            TypeTree::simple("Inner").annotated(anno("B")),
        );
        assert_eq!(
            paths(&tree),
            vec![
                (String::from("A"), vec![]),
                (String::from("B"), vec![InnerType]),
            ]
        );
    }

    #[test]
    fn type_arguments_of_inner_types() {
        // Outer<@A String>.Inner<@B Integer>
        let tree = TypeTree::inner(
            TypeTree::parameterized(
                TypeTree::simple("Outer"),
                vec![TypeTree::simple("String").annotated(anno("A"))],
            ),
            TypeTree::parameterized(
                TypeTree::simple("Inner"),
                vec![TypeTree::simple("Integer").annotated(anno("B"))],
            ),
        );
        assert_eq!(
            paths(&tree),
            vec![
                (String::from("A"), vec![TypeArgument(0)]),
                (String::from("B"), vec![InnerType, TypeArgument(0)]),
            ]
        );
    }

    #[test]
    fn overlong_paths_fail() {
        let mut tree = TypeTree::simple("int").annotated(anno("A"));
        for _ in 0..300 {
            tree = TypeTree::array(tree);
        }
        assert!(tree.occurrences().is_err());
    }
}

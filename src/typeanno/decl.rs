use crate::jvm::code::{CodeOffsetTracker, NodeId};
use crate::typeanno::{Annotation, TypeTree};

/// Class or interface declaration, reduced to the places where types are written
#[derive(Debug, Default)]
pub struct ClassDecl {
    pub name: String,
    pub type_parameters: Vec<TypeParameter>,

    /// `extends` clause (absent for interfaces and for an implicit `Object` superclass)
    pub superclass: Option<TypeTree>,

    /// `implements` clause (or `extends` clause of an interface)
    pub interfaces: Vec<TypeTree>,

    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeTree,
}

/// Method or constructor declaration
#[derive(Debug, Default)]
pub struct MethodDecl {
    /// Name and descriptor together identify the method (`<init>(I)V`)
    pub name: String,
    pub descriptor: String,
    pub type_parameters: Vec<TypeParameter>,

    /// Explicit receiver parameter (`Outer.@A Inner this`)
    pub receiver: Option<TypeTree>,

    /// Declared formal parameters, not counting the receiver
    pub parameters: Vec<TypeTree>,

    /// Absent for `void` methods; for constructors, holds the annotations written on the
    /// declaration
    pub return_type: Option<TypeTree>,

    pub throws: Vec<TypeTree>,

    /// Types written inside the method body
    pub code_uses: Vec<CodeTypeUse>,

    /// Bookkeeping from generating the method body, if there is one
    pub code: Option<CodeOffsetTracker>,
}

/// Declaration of a type variable
#[derive(Debug, Clone)]
pub struct TypeParameter {
    pub name: String,

    /// Annotations on the type parameter itself (`<@A T>`)
    pub annotations: Vec<Annotation>,

    pub bounds: Vec<Bound>,
}

/// One bound of a type parameter
#[derive(Debug, Clone)]
pub struct Bound {
    pub kind: BoundKind,
    pub ty: TypeTree,
}

/// What a bound resolved to
///
/// Only the first bound can be a class or a type variable; the rest are always interfaces.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BoundKind {
    Class,
    Interface,
    TypeVariable,
}

/// A type written in a method body
#[derive(Debug, Clone)]
pub enum CodeTypeUse {
    LocalVariable { decl: NodeId, ty: TypeTree },

    /// Variable declared in a try-with-resources header
    ResourceVariable { decl: NodeId, ty: TypeTree },

    /// `catch (A | B e)` has one alternative per type in the union
    CatchParameter {
        clause: NodeId,
        alternatives: Vec<TypeTree>,
    },

    New { expr: NodeId, ty: TypeTree },

    /// `(A & B) e` has one alternative per type in the intersection
    Cast {
        expr: NodeId,
        alternatives: Vec<TypeTree>,
    },

    InstanceOf { expr: NodeId, ty: TypeTree },

    /// Qualifying type of `Type::method`
    MethodReference { expr: NodeId, ty: TypeTree },

    /// Type of `Type::new`
    ConstructorReference { expr: NodeId, ty: TypeTree },

    /// `recv.<A, B>m()`
    MethodInvocationTypeArguments {
        expr: NodeId,
        arguments: Vec<TypeTree>,
    },

    /// `new <A>Foo()`, `this.<A>(..)`, `super.<A>(..)`
    ConstructorInvocationTypeArguments {
        expr: NodeId,
        arguments: Vec<TypeTree>,
    },

    /// `Type::<A>method`
    MethodReferenceTypeArguments {
        expr: NodeId,
        arguments: Vec<TypeTree>,
    },

    /// `Type::<A>new`
    ConstructorReferenceTypeArguments {
        expr: NodeId,
        arguments: Vec<TypeTree>,
    },
}

impl TypeParameter {
    pub fn new(name: impl Into<String>) -> TypeParameter {
        TypeParameter {
            name: name.into(),
            annotations: vec![],
            bounds: vec![],
        }
    }

    pub fn annotated(mut self, annotation: Annotation) -> TypeParameter {
        self.annotations.push(annotation);
        self
    }

    pub fn bound(mut self, kind: BoundKind, ty: TypeTree) -> TypeParameter {
        self.bounds.push(Bound { kind, ty });
        self
    }

    /// Does the first bound take the class-bound slot (index 0)?
    pub fn first_bound_is_class(&self) -> bool {
        matches!(
            self.bounds.first(),
            Some(Bound {
                kind: BoundKind::Class | BoundKind::TypeVariable,
                ..
            })
        )
    }
}

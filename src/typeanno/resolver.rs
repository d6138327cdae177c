use crate::jvm::class_file::{LocalVarRange, TargetDescriptor, TypePath};
use crate::jvm::code::{CodeOffsetTracker, NodeId};
use crate::jvm::Error;
use crate::typeanno::{
    AnnotatedTypeOccurrence, Annotation, ClassDecl, CodeTypeUse, MethodDecl, TypeParameter,
    TypeTree,
};

/// Where a type is written, as far as choosing a `target_type` is concerned
///
/// Positions are counted the way they are written in source: formal parameter indices exclude
/// the receiver, interface indices start at 0 for the first type in `implements`, and bound
/// positions start at 0 for the first bound written after `extends`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SyntacticContext {
    Field,
    MethodReturn,
    Receiver,
    FormalParameter { index: usize },
    Throws { index: usize },
    LocalVariable { decl: NodeId },
    ResourceVariable { decl: NodeId },
    CatchParameter { clause: NodeId, alternative: usize },
    ClassTypeParameter { index: usize },
    MethodTypeParameter { index: usize },
    ClassTypeParameterBound {
        param: usize,
        position: usize,
        first_bound_is_class: bool,
    },
    MethodTypeParameterBound {
        param: usize,
        position: usize,
        first_bound_is_class: bool,
    },
    Superclass,
    Interface { index: usize },
    New { expr: NodeId },
    Cast { expr: NodeId, alternative: usize },
    InstanceOf { expr: NodeId },
    MethodInvocationTypeArgument { expr: NodeId, index: usize },
    ConstructorInvocationTypeArgument { expr: NodeId, index: usize },
    MethodReference { expr: NodeId },
    ConstructorReference { expr: NodeId },
    MethodReferenceTypeArgument { expr: NodeId, index: usize },
    ConstructorReferenceTypeArgument { expr: NodeId, index: usize },
}

/// Annotation together with the target and path that locate it
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTypeAnnotation {
    pub annotation: Annotation,
    pub target: TargetDescriptor,
    pub path: TypePath,
}

/// Everything resolved for one class, grouped by the member whose attributes will hold it
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResolvedClass {
    pub name: String,
    pub annotations: Vec<ResolvedTypeAnnotation>,
    pub fields: Vec<ResolvedField>,
    pub methods: Vec<ResolvedMethod>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub name: String,
    pub annotations: Vec<ResolvedTypeAnnotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMethod {
    pub name: String,
    pub descriptor: String,

    /// Belongs on the `method_info`
    pub annotations: Vec<ResolvedTypeAnnotation>,

    /// Belongs on the method's `Code` attribute
    pub code_annotations: Vec<ResolvedTypeAnnotation>,
}

/// Bound index for the bound at `position` among those written
///
/// Index 0 is reserved for the class bound. When the first bound is an interface, the class
/// bound is implicitly `Object` and interface bounds are numbered from 1.
pub fn bound_index(position: usize, first_bound_is_class: bool) -> usize {
    if first_bound_is_class {
        position
    } else {
        position + 1
    }
}

/// Decides `target_type`/`target_info` and `type_path` for annotated type uses
///
/// Code-level contexts need the bookkeeping of the method being compiled. Without it, they fail
/// the same way as a construct for which no code was generated.
pub struct TypeAnnotationResolver<'c> {
    code: Option<&'c CodeOffsetTracker>,
}

impl TypeAnnotationResolver<'static> {
    /// Resolver for declaration-level contexts only
    pub fn new() -> TypeAnnotationResolver<'static> {
        TypeAnnotationResolver { code: None }
    }
}

impl<'c> TypeAnnotationResolver<'c> {
    /// Resolver for a method body
    pub fn with_code(code: &'c CodeOffsetTracker) -> TypeAnnotationResolver<'c> {
        TypeAnnotationResolver { code: Some(code) }
    }

    /// Target for anything written in the given context
    pub fn target_for(&self, context: SyntacticContext) -> Result<TargetDescriptor, Error> {
        use SyntacticContext as Ctx;
        use TargetDescriptor as Target;

        Ok(match context {
            Ctx::Field => Target::Field,
            Ctx::MethodReturn => Target::MethodReturn,
            Ctx::Receiver => Target::MethodReceiver,
            Ctx::FormalParameter { index } => Target::MethodFormalParameter {
                index: narrow_u8("formal parameter index", index)?,
            },
            Ctx::Throws { index } => Target::Throws {
                index: narrow_u16("throws index", index)?,
            },
            Ctx::LocalVariable { decl } => Target::LocalVariable {
                ranges: self.ranges(decl)?,
            },
            Ctx::ResourceVariable { decl } => Target::ResourceVariable {
                ranges: self.ranges(decl)?,
            },
            Ctx::CatchParameter {
                clause,
                alternative,
            } => {
                let code = self.code.ok_or(Error::MissingExceptionHandler {
                    catch_clause: clause,
                    alternative,
                })?;
                Target::ExceptionParameter {
                    table_index: code.exception_table_index(clause, alternative)?,
                }
            }
            Ctx::ClassTypeParameter { index } => Target::ClassTypeParameter {
                index: narrow_u8("type parameter index", index)?,
            },
            Ctx::MethodTypeParameter { index } => Target::MethodTypeParameter {
                index: narrow_u8("type parameter index", index)?,
            },
            Ctx::ClassTypeParameterBound {
                param,
                position,
                first_bound_is_class,
            } => Target::ClassTypeParameterBound {
                param_index: narrow_u8("type parameter index", param)?,
                bound_index: narrow_u8(
                    "bound index",
                    bound_index(position, first_bound_is_class),
                )?,
            },
            Ctx::MethodTypeParameterBound {
                param,
                position,
                first_bound_is_class,
            } => Target::MethodTypeParameterBound {
                param_index: narrow_u8("type parameter index", param)?,
                bound_index: narrow_u8(
                    "bound index",
                    bound_index(position, first_bound_is_class),
                )?,
            },
            Ctx::Superclass => Target::ClassExtends {
                type_index: TargetDescriptor::SUPERCLASS,
            },
            Ctx::Interface { index } => {
                // 65535 is taken by the superclass
                if index >= TargetDescriptor::SUPERCLASS as usize {
                    return Err(Error::IndexOverflow("interface index", index));
                }
                Target::ClassExtends {
                    type_index: index as u16,
                }
            }
            Ctx::New { expr } => Target::New {
                offset: self.offset(expr)?,
            },
            Ctx::Cast { expr, alternative } => Target::Cast {
                offset: self.offset(expr)?,
                type_arg_index: narrow_u8("intersection cast index", alternative)?,
            },
            Ctx::InstanceOf { expr } => Target::InstanceOf {
                offset: self.offset(expr)?,
            },
            Ctx::MethodInvocationTypeArgument { expr, index } => {
                Target::MethodInvocationTypeArgument {
                    offset: self.offset(expr)?,
                    type_arg_index: narrow_u8("type argument index", index)?,
                }
            }
            Ctx::ConstructorInvocationTypeArgument { expr, index } => {
                Target::ConstructorInvocationTypeArgument {
                    offset: self.offset(expr)?,
                    type_arg_index: narrow_u8("type argument index", index)?,
                }
            }
            Ctx::MethodReference { expr } => Target::MethodReference {
                offset: self.offset(expr)?,
            },
            Ctx::ConstructorReference { expr } => Target::ConstructorReference {
                offset: self.offset(expr)?,
            },
            Ctx::MethodReferenceTypeArgument { expr, index } => {
                Target::MethodReferenceTypeArgument {
                    offset: self.offset(expr)?,
                    type_arg_index: narrow_u8("type argument index", index)?,
                }
            }
            Ctx::ConstructorReferenceTypeArgument { expr, index } => {
                Target::ConstructorReferenceTypeArgument {
                    offset: self.offset(expr)?,
                    type_arg_index: narrow_u8("type argument index", index)?,
                }
            }
        })
    }

    /// Resolve a single annotation occurrence
    pub fn resolve(
        &self,
        occurrence: &AnnotatedTypeOccurrence<'_>,
        context: SyntacticContext,
    ) -> Result<ResolvedTypeAnnotation, Error> {
        let target = self.target_for(context)?;
        log::trace!(
            "@{} in {:?} -> {:?} {}",
            occurrence.annotation.type_name.source_name(),
            context,
            target.target_type(),
            occurrence.path
        );
        Ok(ResolvedTypeAnnotation {
            annotation: occurrence.annotation.clone(),
            target,
            path: occurrence.path.clone(),
        })
    }

    /// Resolve every annotation written in a type
    ///
    /// Unannotated types produce nothing (and in particular do not need code to exist).
    pub fn resolve_tree(
        &self,
        tree: &TypeTree,
        context: SyntacticContext,
    ) -> Result<Vec<ResolvedTypeAnnotation>, Error> {
        if !tree.has_annotations() {
            return Ok(vec![]);
        }
        let target = self.target_for(context)?;
        Ok(tree
            .occurrences()?
            .into_iter()
            .map(|occurrence| ResolvedTypeAnnotation {
                annotation: occurrence.annotation.clone(),
                target: target.clone(),
                path: occurrence.path,
            })
            .collect())
    }

    fn offset(&self, expr: NodeId) -> Result<u16, Error> {
        self.code
            .ok_or(Error::MissingCodeFor(expr))?
            .offset_for(expr)
    }

    fn ranges(&self, decl: NodeId) -> Result<Vec<LocalVarRange>, Error> {
        let code = self.code.ok_or(Error::MissingLiveRange(decl))?;
        Ok(code
            .live_ranges_for(decl)?
            .into_iter()
            .map(LocalVarRange::from)
            .collect())
    }

    /// Annotations on type parameter declarations and on their bounds
    fn resolve_type_parameters(
        &self,
        params: &[TypeParameter],
        on_method: bool,
        out: &mut Vec<ResolvedTypeAnnotation>,
    ) -> Result<(), Error> {
        for (param_idx, param) in params.iter().enumerate() {
            let context = if on_method {
                SyntacticContext::MethodTypeParameter { index: param_idx }
            } else {
                SyntacticContext::ClassTypeParameter { index: param_idx }
            };
            if !param.annotations.is_empty() {
                let target = self.target_for(context)?;
                for annotation in &param.annotations {
                    out.push(ResolvedTypeAnnotation {
                        annotation: annotation.clone(),
                        target: target.clone(),
                        path: TypePath::empty(),
                    });
                }
            }

            let first_bound_is_class = param.first_bound_is_class();
            for (position, bound) in param.bounds.iter().enumerate() {
                let context = if on_method {
                    SyntacticContext::MethodTypeParameterBound {
                        param: param_idx,
                        position,
                        first_bound_is_class,
                    }
                } else {
                    SyntacticContext::ClassTypeParameterBound {
                        param: param_idx,
                        position,
                        first_bound_is_class,
                    }
                };
                out.extend(self.resolve_tree(&bound.ty, context)?);
            }
        }
        Ok(())
    }
}

impl Default for TypeAnnotationResolver<'static> {
    fn default() -> Self {
        TypeAnnotationResolver::new()
    }
}

/// Resolve everything written in a class declaration
pub fn resolve_class(class: &ClassDecl) -> Result<ResolvedClass, Error> {
    let resolver = TypeAnnotationResolver::new();

    let mut annotations = vec![];
    resolver.resolve_type_parameters(&class.type_parameters, false, &mut annotations)?;
    if let Some(superclass) = &class.superclass {
        annotations.extend(resolver.resolve_tree(superclass, SyntacticContext::Superclass)?);
    }
    for (index, interface) in class.interfaces.iter().enumerate() {
        annotations.extend(resolver.resolve_tree(interface, SyntacticContext::Interface { index })?);
    }

    let mut fields = vec![];
    for field in &class.fields {
        fields.push(ResolvedField {
            name: field.name.clone(),
            annotations: resolver.resolve_tree(&field.ty, SyntacticContext::Field)?,
        });
    }

    let mut methods = vec![];
    for method in &class.methods {
        methods.push(resolve_method(method)?);
    }

    log::debug!(
        "{}: {} class-level, {} field, {} method type annotations",
        class.name,
        annotations.len(),
        fields.iter().map(|f| f.annotations.len()).sum::<usize>(),
        methods
            .iter()
            .map(|m| m.annotations.len() + m.code_annotations.len())
            .sum::<usize>()
    );

    Ok(ResolvedClass {
        name: class.name.clone(),
        annotations,
        fields,
        methods,
    })
}

/// Resolve everything written in a method declaration and its body
pub fn resolve_method(method: &MethodDecl) -> Result<ResolvedMethod, Error> {
    let resolver = match &method.code {
        Some(code) => TypeAnnotationResolver::with_code(code),
        None => TypeAnnotationResolver { code: None },
    };

    let mut annotations = vec![];
    resolver.resolve_type_parameters(&method.type_parameters, true, &mut annotations)?;
    if let Some(return_type) = &method.return_type {
        annotations.extend(resolver.resolve_tree(return_type, SyntacticContext::MethodReturn)?);
    }
    if let Some(receiver) = &method.receiver {
        annotations.extend(resolver.resolve_tree(receiver, SyntacticContext::Receiver)?);
    }
    for (index, parameter) in method.parameters.iter().enumerate() {
        annotations.extend(
            resolver.resolve_tree(parameter, SyntacticContext::FormalParameter { index })?,
        );
    }
    for (index, thrown) in method.throws.iter().enumerate() {
        annotations.extend(resolver.resolve_tree(thrown, SyntacticContext::Throws { index })?);
    }

    let mut code_annotations = vec![];
    for code_use in &method.code_uses {
        resolver.resolve_code_use(code_use, &mut code_annotations)?;
    }

    Ok(ResolvedMethod {
        name: method.name.clone(),
        descriptor: method.descriptor.clone(),
        annotations,
        code_annotations,
    })
}

impl<'c> TypeAnnotationResolver<'c> {
    fn resolve_code_use(
        &self,
        code_use: &CodeTypeUse,
        out: &mut Vec<ResolvedTypeAnnotation>,
    ) -> Result<(), Error> {
        use SyntacticContext as Ctx;

        match code_use {
            CodeTypeUse::LocalVariable { decl, ty } => {
                out.extend(self.resolve_tree(ty, Ctx::LocalVariable { decl: *decl })?)
            }
            CodeTypeUse::ResourceVariable { decl, ty } => {
                out.extend(self.resolve_tree(ty, Ctx::ResourceVariable { decl: *decl })?)
            }
            CodeTypeUse::CatchParameter {
                clause,
                alternatives,
            } => {
                for (alternative, ty) in alternatives.iter().enumerate() {
                    let context = Ctx::CatchParameter {
                        clause: *clause,
                        alternative,
                    };
                    out.extend(self.resolve_tree(ty, context)?);
                }
            }
            CodeTypeUse::New { expr, ty } => {
                out.extend(self.resolve_tree(ty, Ctx::New { expr: *expr })?)
            }
            CodeTypeUse::Cast { expr, alternatives } => {
                for (alternative, ty) in alternatives.iter().enumerate() {
                    let context = Ctx::Cast {
                        expr: *expr,
                        alternative,
                    };
                    out.extend(self.resolve_tree(ty, context)?);
                }
            }
            CodeTypeUse::InstanceOf { expr, ty } => {
                out.extend(self.resolve_tree(ty, Ctx::InstanceOf { expr: *expr })?)
            }
            CodeTypeUse::MethodReference { expr, ty } => {
                out.extend(self.resolve_tree(ty, Ctx::MethodReference { expr: *expr })?)
            }
            CodeTypeUse::ConstructorReference { expr, ty } => {
                out.extend(self.resolve_tree(ty, Ctx::ConstructorReference { expr: *expr })?)
            }
            CodeTypeUse::MethodInvocationTypeArguments { expr, arguments } => {
                for (index, ty) in arguments.iter().enumerate() {
                    let context = Ctx::MethodInvocationTypeArgument { expr: *expr, index };
                    out.extend(self.resolve_tree(ty, context)?);
                }
            }
            CodeTypeUse::ConstructorInvocationTypeArguments { expr, arguments } => {
                for (index, ty) in arguments.iter().enumerate() {
                    let context = Ctx::ConstructorInvocationTypeArgument { expr: *expr, index };
                    out.extend(self.resolve_tree(ty, context)?);
                }
            }
            CodeTypeUse::MethodReferenceTypeArguments { expr, arguments } => {
                for (index, ty) in arguments.iter().enumerate() {
                    let context = Ctx::MethodReferenceTypeArgument { expr: *expr, index };
                    out.extend(self.resolve_tree(ty, context)?);
                }
            }
            CodeTypeUse::ConstructorReferenceTypeArguments { expr, arguments } => {
                for (index, ty) in arguments.iter().enumerate() {
                    let context = Ctx::ConstructorReferenceTypeArgument { expr: *expr, index };
                    out.extend(self.resolve_tree(ty, context)?);
                }
            }
        }
        Ok(())
    }
}

fn narrow_u8(what: &'static str, index: usize) -> Result<u8, Error> {
    u8::try_from(index).map_err(|_| Error::IndexOverflow(what, index))
}

fn narrow_u16(what: &'static str, index: usize) -> Result<u16, Error> {
    u16::try_from(index).map_err(|_| Error::IndexOverflow(what, index))
}

use crate::jvm::class_file::{
    Attribute, ConstantsPool, RuntimeInvisibleTypeAnnotations, RuntimeVisibleTypeAnnotations,
    Serialize, TypeAnnotation,
};
use crate::jvm::Error;
use crate::typeanno::{ResolvedClass, ResolvedTypeAnnotation, Retention};

/// Owner of a type annotations attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Member {
    Class,
    Field { name: String },
    Method { name: String, descriptor: String },
    /// The `Code` attribute of a method
    Code { name: String, descriptor: String },
}

/// Attributes produced for one member (either may be absent when nothing has that retention)
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EmittedAttributes {
    pub visible: Option<Attribute>,
    pub invisible: Option<Attribute>,
}

impl EmittedAttributes {
    pub fn is_empty(&self) -> bool {
        self.visible.is_none() && self.invisible.is_none()
    }
}

/// Turns resolved type annotations into `Runtime{Visible,Invisible}TypeAnnotations` attributes
pub struct AttributeEmitter<'p> {
    constants: &'p mut ConstantsPool,
}

impl<'p> AttributeEmitter<'p> {
    pub fn new(constants: &'p mut ConstantsPool) -> AttributeEmitter<'p> {
        AttributeEmitter { constants }
    }

    /// Intern the annotations of one retention into class file entries, in order
    fn entries<'a>(
        &mut self,
        annotations: impl Iterator<Item = &'a ResolvedTypeAnnotation>,
    ) -> Result<Vec<TypeAnnotation>, Error> {
        let mut entries = vec![];
        for resolved in annotations {
            entries.push(TypeAnnotation {
                target: resolved.target.clone(),
                path: resolved.path.clone(),
                annotation: resolved.annotation.intern(self.constants)?,
            });
        }
        if entries.len() > u16::MAX as usize {
            return Err(Error::IndexOverflow("type annotation count", entries.len()));
        }
        Ok(entries)
    }

    /// Emit the attributes for all of the annotations belonging to one member
    ///
    /// `RUNTIME` annotations go in the visible attribute, `CLASS` annotations in the invisible
    /// one, and `SOURCE` annotations are dropped.
    pub fn emit(
        &mut self,
        annotations: &[ResolvedTypeAnnotation],
    ) -> Result<EmittedAttributes, Error> {
        let visible = self.entries(with_retention(annotations, Retention::Runtime))?;
        let invisible = self.entries(with_retention(annotations, Retention::Class))?;

        let dropped = annotations.len() - visible.len() - invisible.len();
        if dropped > 0 {
            log::trace!("dropped {} source-retention type annotations", dropped);
        }

        let mut emitted = EmittedAttributes::default();
        if !visible.is_empty() {
            emitted.visible = Some(
                self.constants
                    .get_attribute(RuntimeVisibleTypeAnnotations(visible))?,
            );
        }
        if !invisible.is_empty() {
            emitted.invisible = Some(
                self.constants
                    .get_attribute(RuntimeInvisibleTypeAnnotations(invisible))?,
            );
        }
        Ok(emitted)
    }

    /// Attribute body (count and entries, without the attribute header) for one retention
    pub fn emit_body(
        &mut self,
        annotations: &[ResolvedTypeAnnotation],
        retention: Retention,
    ) -> Result<Vec<u8>, Error> {
        let entries = self.entries(with_retention(annotations, retention))?;
        let mut bytes = vec![];
        entries.serialize(&mut bytes)?;
        Ok(bytes)
    }

    /// Emit attributes for every member of a class that has type annotations
    pub fn emit_class(
        &mut self,
        class: &ResolvedClass,
    ) -> Result<Vec<(Member, EmittedAttributes)>, Error> {
        let mut out = vec![];
        let mut push = |member: Member, emitted: EmittedAttributes| {
            if !emitted.is_empty() {
                out.push((member, emitted));
            }
        };

        push(Member::Class, self.emit(&class.annotations)?);
        for field in &class.fields {
            let member = Member::Field {
                name: field.name.clone(),
            };
            push(member, self.emit(&field.annotations)?);
        }
        for method in &class.methods {
            let member = Member::Method {
                name: method.name.clone(),
                descriptor: method.descriptor.clone(),
            };
            push(member, self.emit(&method.annotations)?);

            let member = Member::Code {
                name: method.name.clone(),
                descriptor: method.descriptor.clone(),
            };
            push(member, self.emit(&method.code_annotations)?);
        }

        log::debug!("{}: type annotations on {} members", class.name, out.len());
        Ok(out)
    }
}

fn with_retention(
    annotations: &[ResolvedTypeAnnotation],
    retention: Retention,
) -> impl Iterator<Item = &ResolvedTypeAnnotation> {
    annotations
        .iter()
        .filter(move |resolved| resolved.annotation.retention == retention)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_file::{TargetDescriptor, TypePath, TypePathEntry};
    use crate::jvm::BinaryName;
    use crate::typeanno::{Annotation, ElementValue, ResolvedField};

    fn resolved(name: &str, retention: Retention) -> ResolvedTypeAnnotation {
        ResolvedTypeAnnotation {
            annotation: Annotation::marker(BinaryName::from_source_name(name).unwrap(), retention),
            target: TargetDescriptor::Field,
            path: TypePath::empty(),
        }
    }

    #[test]
    fn split_by_retention() -> Result<(), Error> {
        let mut constants = ConstantsPool::new();
        let annotations = vec![
            resolved("A", Retention::Runtime),
            resolved("B", Retention::Class),
            resolved("S", Retention::Source),
        ];
        let emitted = AttributeEmitter::new(&mut constants).emit(&annotations)?;

        let visible = emitted.visible.expect("visible attribute");
        let invisible = emitted.invisible.expect("invisible attribute");
        assert_eq!(
            constants.get_utf8_str(visible.name_index)?,
            "RuntimeVisibleTypeAnnotations"
        );
        assert_eq!(visible.info[0..2], [0, 1]);
        assert_eq!(invisible.info[0..2], [0, 1]);
        Ok(())
    }

    #[test]
    fn source_only_emits_nothing() -> Result<(), Error> {
        let mut constants = ConstantsPool::new();
        let annotations = vec![resolved("S", Retention::Source)];
        let emitted = AttributeEmitter::new(&mut constants).emit(&annotations)?;
        assert!(emitted.is_empty());
        assert_eq!(constants.count(), 1, "nothing interned");
        Ok(())
    }

    #[test]
    fn body_layout() -> Result<(), Error> {
        let mut constants = ConstantsPool::new();
        let annotation = Annotation::single(
            BinaryName::from_source_name("B")?,
            Retention::Class,
            ElementValue::Int(3),
        );
        let annotations = vec![ResolvedTypeAnnotation {
            annotation,
            target: TargetDescriptor::MethodFormalParameter { index: 2 },
            path: TypePath(vec![TypePathEntry::Array, TypePathEntry::TypeArgument(1)]),
        }];
        let body =
            AttributeEmitter::new(&mut constants).emit_body(&annotations, Retention::Class)?;

        // #1 = "LB;", #2 = "value", #3 = 3
        assert_eq!(
            body,
            vec![0, 1, 0x16, 2, 2, 0, 0, 3, 1, 0, 1, 0, 1, 0, 2, b'I', 0, 3]
        );
        Ok(())
    }

    #[test]
    fn class_members_without_annotations_are_skipped() -> Result<(), Error> {
        let mut constants = ConstantsPool::new();
        let class = ResolvedClass {
            name: String::from("X"),
            annotations: vec![],
            fields: vec![
                ResolvedField {
                    name: String::from("a"),
                    annotations: vec![],
                },
                ResolvedField {
                    name: String::from("b"),
                    annotations: vec![resolved("A", Retention::Runtime)],
                },
            ],
            methods: vec![],
        };
        let emitted = AttributeEmitter::new(&mut constants).emit_class(&class)?;
        assert_eq!(emitted.len(), 1);
        assert_eq!(
            emitted[0].0,
            Member::Field {
                name: String::from("b")
            }
        );
        Ok(())
    }
}

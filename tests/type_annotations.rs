use typeflow::jvm::class_file::{
    decode_attribute_body, Annotation as RawAnnotation, ConstantIndex, ConstantsPool,
    Deserialize, LocalVarRange, RuntimeInvisibleTypeAnnotations, RuntimeVisibleTypeAnnotations,
    Serialize, TypeAnnotation, Utf8ConstantIndex,
};
use typeflow::jvm::code::{CodeOffsetTracker, NodeId};
use typeflow::jvm::{BinaryName, Error};
use typeflow::typeanno::*;

fn marker(name: &str, retention: Retention) -> Annotation {
    Annotation::marker(
        BinaryName::from_source_name(name).expect("valid name"),
        retention,
    )
}

fn paths(tree: &TypeTree) -> Result<Vec<(String, TypePath)>, Error> {
    Ok(tree
        .occurrences()?
        .into_iter()
        .map(|o| (o.annotation.type_name.source_name(), o.path))
        .collect())
}

#[test]
fn nested_generic_paths() -> Result<(), Error> {
    // @A A<@B B<@C C>>
    let tree = TypeTree::parameterized(
        TypeTree::simple("A"),
        vec![TypeTree::parameterized(
            TypeTree::simple("B"),
            vec![TypeTree::simple("C").annotated(marker("C", Retention::Runtime))],
        )
        .annotated(marker("B", Retention::Runtime))],
    )
    .annotated(marker("A", Retention::Runtime));

    assert_eq!(
        paths(&tree)?,
        vec![
            (String::from("A"), TypePath::empty()),
            (String::from("B"), TypePath(vec![TypePathEntry::TypeArgument(0)])),
            (
                String::from("C"),
                TypePath(vec![
                    TypePathEntry::TypeArgument(0),
                    TypePathEntry::TypeArgument(0)
                ])
            ),
        ]
    );
    Ok(())
}

#[test]
fn second_type_argument_of_second_argument() -> Result<(), Error> {
    // Map<String, Map<Integer, @X Long>>
    let tree = TypeTree::parameterized(
        TypeTree::simple("Map"),
        vec![
            TypeTree::simple("String"),
            TypeTree::parameterized(
                TypeTree::simple("Map"),
                vec![
                    TypeTree::simple("Integer"),
                    TypeTree::simple("Long").annotated(marker("X", Retention::Class)),
                ],
            ),
        ],
    );
    assert_eq!(
        paths(&tree)?,
        vec![(
            String::from("X"),
            TypePath(vec![
                TypePathEntry::TypeArgument(1),
                TypePathEntry::TypeArgument(1)
            ])
        )]
    );
    Ok(())
}

#[test]
fn array_dimensions_outer_to_inner() -> Result<(), Error> {
    // String @X [] @Y []
    let tree = TypeTree::array(
        TypeTree::array(TypeTree::simple("String")).annotated(marker("Y", Retention::Class)),
    )
    .annotated(marker("X", Retention::Class));

    assert_eq!(
        paths(&tree)?,
        vec![
            (String::from("X"), TypePath::empty()),
            (String::from("Y"), TypePath(vec![TypePathEntry::Array])),
        ]
    );
    Ok(())
}

#[test]
fn wildcard_bound_and_inner_type() -> Result<(), Error> {
    // List<? extends Outer.@I Inner>
    let tree = TypeTree::parameterized(
        TypeTree::simple("List"),
        vec![TypeTree::wildcard_extends(TypeTree::inner(
            TypeTree::simple("Outer"),
            TypeTree::simple("Inner").annotated(marker("I", Retention::Runtime)),
        ))],
    );
    assert_eq!(
        paths(&tree)?,
        vec![(
            String::from("I"),
            TypePath(vec![
                TypePathEntry::TypeArgument(0),
                TypePathEntry::Wildcard,
                TypePathEntry::InnerType
            ])
        )]
    );
    Ok(())
}

#[test]
fn bound_indices_skip_the_class_slot() -> Result<(), Error> {
    // class X<T extends @A Comparable & @B Serializable>
    let class = ClassDecl {
        name: String::from("X"),
        type_parameters: vec![TypeParameter::new("T")
            .bound(
                BoundKind::Interface,
                TypeTree::simple("Comparable").annotated(marker("A", Retention::Class)),
            )
            .bound(
                BoundKind::Interface,
                TypeTree::simple("Serializable").annotated(marker("B", Retention::Class)),
            )],
        ..ClassDecl::default()
    };
    let resolved = resolve_class(&class)?;
    let targets: Vec<TargetDescriptor> = resolved
        .annotations
        .iter()
        .map(|r| r.target.clone())
        .collect();
    assert_eq!(
        targets,
        vec![
            TargetDescriptor::ClassTypeParameterBound {
                param_index: 0,
                bound_index: 1
            },
            TargetDescriptor::ClassTypeParameterBound {
                param_index: 0,
                bound_index: 2
            },
        ]
    );
    Ok(())
}

#[test]
fn class_to_attributes_and_back() -> Result<(), Error> {
    // class X extends @A Base { @B List<@C String> f; }
    let class = ClassDecl {
        name: String::from("X"),
        superclass: Some(TypeTree::simple("Base").annotated(marker("A", Retention::Runtime))),
        fields: vec![FieldDecl {
            name: String::from("f"),
            ty: TypeTree::parameterized(
                TypeTree::simple("List"),
                vec![TypeTree::simple("String").annotated(marker("C", Retention::Class))],
            )
            .annotated(marker("B", Retention::Source)),
        }],
        ..ClassDecl::default()
    };

    let resolved = resolve_class(&class)?;
    let mut constants = ConstantsPool::new();
    let emitted = AttributeEmitter::new(&mut constants).emit_class(&resolved)?;
    assert_eq!(emitted.len(), 2);

    let (member, class_attributes) = &emitted[0];
    assert_eq!(*member, Member::Class);
    let visible = class_attributes.visible.as_ref().expect("visible on class");
    assert!(class_attributes.invisible.is_none());
    let decoded: RuntimeVisibleTypeAnnotations = decode_attribute_body(&visible.info)?;
    assert_eq!(
        Disassembler::new(&constants).visible(&decoded),
        concat!(
            "    RuntimeVisibleTypeAnnotations: \n",
            "      #1 @A(\n",
            "        target type = 0x10 CLASS_EXTENDS\n",
            "        type index = -1\n",
            "      )\n",
        )
    );

    // The source retention annotation on the field is dropped
    let (member, field_attributes) = &emitted[1];
    assert_eq!(
        *member,
        Member::Field {
            name: String::from("f")
        }
    );
    assert!(field_attributes.visible.is_none());
    let invisible = field_attributes.invisible.as_ref().expect("invisible on field");
    let decoded: RuntimeInvisibleTypeAnnotations = decode_attribute_body(&invisible.info)?;
    assert_eq!(decoded.0.len(), 1);
    assert_eq!(decoded.0[0].target, TargetDescriptor::Field);
    assert_eq!(decoded.0[0].path, TypePath(vec![TypePathEntry::TypeArgument(0)]));
    Ok(())
}

#[test]
fn method_body_targets_use_generated_offsets() -> Result<(), Error> {
    let local = NodeId(1);
    let new_expr = NodeId(2);
    let cast = NodeId(3);
    let catch = NodeId(4);

    let mut code = CodeOffsetTracker::new();
    code.emit("new", 3, Some(new_expr));
    code.emit("dup", 1, Some(new_expr));
    code.emit("invokespecial", 3, Some(new_expr));
    code.open_local(local, 1);
    code.emit("astore_1", 1, None);
    code.emit("aload_1", 1, None);
    code.emit("checkcast", 3, Some(cast));
    code.emit("areturn", 1, None);
    code.close_local(local)?;
    code.add_exception_handler(catch, 0)?;
    code.add_exception_handler(catch, 1)?;

    let method = MethodDecl {
        name: String::from("m"),
        descriptor: String::from("()Ljava/lang/Object;"),
        code_uses: vec![
            CodeTypeUse::New {
                expr: new_expr,
                ty: TypeTree::simple("ArrayList").annotated(marker("N", Retention::Runtime)),
            },
            CodeTypeUse::LocalVariable {
                decl: local,
                ty: TypeTree::simple("List").annotated(marker("L", Retention::Runtime)),
            },
            CodeTypeUse::Cast {
                expr: cast,
                alternatives: vec![
                    TypeTree::simple("Serializable"),
                    TypeTree::simple("Runnable").annotated(marker("R", Retention::Runtime)),
                ],
            },
            CodeTypeUse::CatchParameter {
                clause: catch,
                alternatives: vec![
                    TypeTree::simple("IOException"),
                    TypeTree::simple("SQLException").annotated(marker("E", Retention::Runtime)),
                ],
            },
        ],
        code: Some(code),
        ..MethodDecl::default()
    };

    let resolved = resolve_method(&method)?;
    assert!(resolved.annotations.is_empty());
    assert!(resolved
        .code_annotations
        .iter()
        .all(|r| r.target.target_type().is_code_target()));
    let targets: Vec<TargetDescriptor> = resolved
        .code_annotations
        .iter()
        .map(|r| r.target.clone())
        .collect();
    assert_eq!(
        targets,
        vec![
            TargetDescriptor::New { offset: 0 },
            TargetDescriptor::LocalVariable {
                ranges: vec![LocalVarRange {
                    start_pc: 7,
                    length: 6,
                    index: 1
                }]
            },
            TargetDescriptor::Cast {
                offset: 9,
                type_arg_index: 1
            },
            TargetDescriptor::ExceptionParameter { table_index: 1 },
        ]
    );
    Ok(())
}

#[test]
fn missing_code_is_an_internal_error() {
    let method = MethodDecl {
        name: String::from("m"),
        descriptor: String::from("()V"),
        code_uses: vec![CodeTypeUse::InstanceOf {
            expr: NodeId(9),
            ty: TypeTree::simple("String").annotated(marker("A", Retention::Runtime)),
        }],
        code: Some(CodeOffsetTracker::new()),
        ..MethodDecl::default()
    };
    match resolve_method(&method) {
        Err(Error::MissingCodeFor(NodeId(9))) => (),
        other => panic!("expected missing code error, got {:?}", other),
    }
}

#[test]
fn every_target_survives_encoding() -> std::io::Result<()> {
    let annotation = RawAnnotation {
        type_index: Utf8ConstantIndex(ConstantIndex(7)),
        element_value_pairs: vec![],
    };
    let range = LocalVarRange {
        start_pc: 4,
        length: 10,
        index: 2,
    };
    let targets = vec![
        TargetDescriptor::ClassTypeParameter { index: 1 },
        TargetDescriptor::MethodTypeParameter { index: 2 },
        TargetDescriptor::ClassExtends {
            type_index: TargetDescriptor::SUPERCLASS,
        },
        TargetDescriptor::ClassTypeParameterBound {
            param_index: 0,
            bound_index: 1,
        },
        TargetDescriptor::MethodTypeParameterBound {
            param_index: 3,
            bound_index: 0,
        },
        TargetDescriptor::Field,
        TargetDescriptor::MethodReturn,
        TargetDescriptor::MethodReceiver,
        TargetDescriptor::MethodFormalParameter { index: 4 },
        TargetDescriptor::Throws { index: 300 },
        TargetDescriptor::LocalVariable {
            ranges: vec![range, range],
        },
        TargetDescriptor::ResourceVariable {
            ranges: vec![range],
        },
        TargetDescriptor::ExceptionParameter { table_index: 5 },
        TargetDescriptor::InstanceOf { offset: 6 },
        TargetDescriptor::New { offset: 7 },
        TargetDescriptor::ConstructorReference { offset: 8 },
        TargetDescriptor::MethodReference { offset: 9 },
        TargetDescriptor::Cast {
            offset: 10,
            type_arg_index: 1,
        },
        TargetDescriptor::ConstructorInvocationTypeArgument {
            offset: 11,
            type_arg_index: 2,
        },
        TargetDescriptor::MethodInvocationTypeArgument {
            offset: 12,
            type_arg_index: 0,
        },
        TargetDescriptor::ConstructorReferenceTypeArgument {
            offset: 13,
            type_arg_index: 1,
        },
        TargetDescriptor::MethodReferenceTypeArgument {
            offset: 514,
            type_arg_index: 3,
        },
    ];

    let mut covered: Vec<TargetType> = targets.iter().map(|t| t.target_type()).collect();
    covered.dedup();
    assert_eq!(covered, TargetType::ALL.to_vec(), "one target per target type");

    let path = TypePath(vec![
        TypePathEntry::Array,
        TypePathEntry::InnerType,
        TypePathEntry::Wildcard,
        TypePathEntry::TypeArgument(2),
    ]);
    for target in targets {
        let entry = TypeAnnotation {
            target: target.clone(),
            path: path.clone(),
            annotation: annotation.clone(),
        };
        let mut bytes = vec![];
        entry.serialize(&mut bytes)?;
        assert_eq!(bytes[0], target.target_type() as u8);

        let decoded = TypeAnnotation::deserialize(&mut bytes.as_slice())?;
        assert_eq!(decoded, entry, "{:?}", target);
    }
    Ok(())
}

#[test]
fn cli_style_disassembly_without_constants() -> Result<(), Error> {
    // one entry: 0x17 throws index 1, empty path, annotation #12 with no pairs
    let body = [0, 1, 0x17, 0, 1, 0, 0, 12, 0, 0];
    let decoded: RuntimeInvisibleTypeAnnotations = decode_attribute_body(&body)?;
    assert_eq!(
        Disassembler::without_constants().invisible(&decoded),
        concat!(
            "    RuntimeInvisibleTypeAnnotations: \n",
            "      #12 @#12(\n",
            "        target type = 0x17 THROWS\n",
            "        throws index = 1\n",
            "      )\n",
        )
    );
    Ok(())
}

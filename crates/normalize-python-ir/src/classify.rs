//! Declaration classification: statements to [`Declaration`] records.
//!
//! One pass over a statement list in source order, one record per
//! statement. Function and class bodies recurse through the same pass;
//! decorator lists go through [`Normalizer::classify_decorators`], a separate
//! pass over expressions, so a body statement can never land among the
//! decorators or the reverse.

use crate::ast::{AnnAssign, Assign, ClassDef, Expr, FunctionDef, Keyword, Module, Stmt};
use crate::config::NormalizeConfig;
use crate::docstring::docstring;
use crate::ir::{
    AnnotatedAssignment, Assignment, AttributeAccess, ClassDeclaration, Declaration,
    DecoratorCall, FunctionDeclaration, KeywordArgument, LiteralValue, Signature, UnknownNode,
};
use crate::literal;
use crate::signature;
use crate::unparse::{unparse_expr, unparse_stmt};

/// Turns a syntax tree into declaration records.
///
/// Holds only configuration; one instance can normalize any number of
/// modules, from any number of threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    config: NormalizeConfig,
}

impl Normalizer {
    pub fn new(config: NormalizeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    /// Classify a module's top-level statements.
    pub fn normalize(&self, module: &Module) -> Vec<Declaration> {
        self.classify(&module.body)
    }

    /// Classify a statement list, preserving order.
    pub fn classify(&self, body: &[Stmt]) -> Vec<Declaration> {
        body.iter().map(|stmt| self.classify_stmt(stmt)).collect()
    }

    /// Classify a single statement. Statements without a dedicated rule
    /// become [`Declaration::Unknown`].
    pub fn classify_stmt(&self, stmt: &Stmt) -> Declaration {
        match stmt {
            Stmt::Assign(assign) => Declaration::Assign(self.assignment(assign)),
            Stmt::AnnAssign(ann) => Declaration::AnnAssign(self.annotated_assignment(ann)),
            Stmt::FunctionDef(func) => Declaration::Function(self.function(func)),
            Stmt::ClassDef(class) => Declaration::Class(self.class(class)),
            Stmt::Expr(Expr::Attribute { value, attr }) => {
                Declaration::Attribute(attribute_access(value, attr))
            }
            Stmt::Expr(_) | Stmt::Opaque { .. } => Declaration::Unknown(UnknownNode {
                node_kind: stmt.kind_name().to_string(),
                raw: unparse_stmt(stmt),
            }),
        }
    }

    /// Classify a decorator list.
    pub fn classify_decorators(&self, decorators: &[Expr]) -> Vec<Declaration> {
        decorators.iter().map(|d| self.classify_decorator(d)).collect()
    }

    fn classify_decorator(&self, decorator: &Expr) -> Declaration {
        match decorator {
            Expr::Name(id) => Declaration::Decorator(DecoratorCall {
                names: vec![id.clone()],
                called: false,
                arguments: Vec::new(),
                keywords: Vec::new(),
            }),
            Expr::Call {
                func,
                args,
                keywords,
            } if func.dotted_name().is_some() => Declaration::Decorator(DecoratorCall {
                names: func.dotted_name().into_iter().collect(),
                called: true,
                arguments: args.iter().map(|arg| self.resolve(arg)).collect(),
                keywords: self.keywords(keywords),
            }),
            Expr::Attribute { value, attr } => Declaration::Attribute(attribute_access(value, attr)),
            other => Declaration::Unknown(UnknownNode {
                node_kind: other.kind_name().to_string(),
                raw: unparse_expr(other),
            }),
        }
    }

    /// Resolve an expression under this normalizer's configuration.
    pub fn resolve(&self, expr: &Expr) -> LiteralValue {
        self.finish(literal::resolve(expr))
    }

    fn finish(&self, value: LiteralValue) -> LiteralValue {
        if self.config.distinguish_references {
            value
        } else {
            value.conflate_references()
        }
    }

    fn declared_type(&self, annotation: &Expr) -> Option<LiteralValue> {
        self.config
            .annotation_mode()
            .declared_type(annotation)
            .map(|value| self.finish(value))
    }

    fn assignment(&self, assign: &Assign) -> Assignment {
        let mut names = Vec::new();
        for target in &assign.targets {
            collect_target_names(target, &mut names);
        }
        Assignment {
            names,
            value: self.resolve(&assign.value),
        }
    }

    fn annotated_assignment(&self, ann: &AnnAssign) -> AnnotatedAssignment {
        let annotated_type = match &ann.annotation {
            Expr::Subscript { value, .. } => {
                Some(value.dotted_name().unwrap_or_else(|| unparse_expr(value)))
            }
            _ => None,
        };
        AnnotatedAssignment {
            names: vec![target_name(&ann.target)],
            value: ann.value.as_ref().map(|value| self.resolve(value)),
            annotated_type,
            declared_type: self.declared_type(&ann.annotation),
        }
    }

    fn function(&self, func: &FunctionDef) -> FunctionDeclaration {
        FunctionDeclaration {
            names: vec![func.name.clone()],
            is_async: func.is_async,
            arguments: self.signature(func),
            returns: func.returns.as_ref().and_then(|r| self.declared_type(r)),
            body: self.classify(&func.body),
            decorators: self.classify_decorators(&func.decorators),
            doc: docstring(&func.body, self.config.clean_docstrings),
        }
    }

    fn signature(&self, func: &FunctionDef) -> Signature {
        let mut sig = signature::extract_with(&func.args, self.config.annotation_mode());
        if !self.config.distinguish_references {
            for param in sig
                .positional_only
                .iter_mut()
                .chain(&mut sig.positional)
                .chain(&mut sig.variadic)
                .chain(&mut sig.keyword_only)
                .chain(&mut sig.keyword_variadic)
            {
                param.declared_type = param.declared_type.take().map(LiteralValue::conflate_references);
            }
        }
        sig
    }

    fn class(&self, class: &ClassDef) -> ClassDeclaration {
        ClassDeclaration {
            names: vec![class.name.clone()],
            bases: class.bases.iter().map(|base| self.resolve(base)).collect(),
            keywords: self.keywords(&class.keywords),
            body: self.classify(&class.body),
            decorators: self.classify_decorators(&class.decorators),
            doc: docstring(&class.body, self.config.clean_docstrings),
        }
    }

    fn keywords(&self, keywords: &[Keyword]) -> Vec<KeywordArgument> {
        keywords
            .iter()
            .map(|kw| KeywordArgument {
                name: kw.arg.clone(),
                value: self.resolve(&kw.value),
            })
            .collect()
    }
}

/// `a`, `(a, b)`, `[a, (b, c)]` contribute their names element-wise;
/// anything else (`self.x`, `d[k]`) contributes its source text.
fn collect_target_names(target: &Expr, names: &mut Vec<String>) {
    match target {
        Expr::Tuple(items) | Expr::List(items) => {
            for item in items {
                collect_target_names(item, names);
            }
        }
        other => names.push(target_name(other)),
    }
}

fn target_name(target: &Expr) -> String {
    match target {
        Expr::Name(id) => id.clone(),
        other => unparse_expr(other),
    }
}

fn attribute_access(base: &Expr, attr: &str) -> AttributeAccess {
    AttributeAccess {
        names: vec![base.dotted_name().unwrap_or_else(|| unparse_expr(base))],
        attribute: attr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Arg, Arguments, StmtKind};
    use crate::ir::{DeclarationKind, ParameterRole};

    fn function(name: &str, body: Vec<Stmt>) -> FunctionDef {
        FunctionDef {
            name: name.to_string(),
            args: Arguments::default(),
            body,
            decorators: Vec::new(),
            returns: None,
            is_async: false,
        }
    }

    fn class(name: &str, body: Vec<Stmt>) -> ClassDef {
        ClassDef {
            name: name.to_string(),
            bases: Vec::new(),
            keywords: Vec::new(),
            body,
            decorators: Vec::new(),
        }
    }

    fn assign(target: &str, value: Expr) -> Stmt {
        Stmt::Assign(Assign {
            targets: vec![Expr::name(target)],
            value,
        })
    }

    #[test]
    fn test_assign() {
        let decls = Normalizer::default().classify(&[assign("x", Expr::int(1))]);
        assert_eq!(
            decls,
            vec![Declaration::Assign(Assignment {
                names: vec!["x".to_string()],
                value: LiteralValue::int(1),
            })]
        );
    }

    #[test]
    fn test_chained_and_tuple_targets() {
        // a = b, (c, d) = 1
        let stmt = Stmt::Assign(Assign {
            targets: vec![
                Expr::name("a"),
                Expr::Tuple(vec![
                    Expr::name("b"),
                    Expr::Tuple(vec![Expr::name("c"), Expr::name("d")]),
                ]),
            ],
            value: Expr::int(1),
        });
        let decl = Normalizer::default().classify_stmt(&stmt);
        assert_eq!(decl.names(), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_attribute_target_uses_source_text() {
        let stmt = Stmt::Assign(Assign {
            targets: vec![Expr::attribute(Expr::name("self"), "x")],
            value: Expr::NoneLit,
        });
        let decl = Normalizer::default().classify_stmt(&stmt);
        assert_eq!(decl.names(), ["self.x"]);
        assert_eq!(decl.value(), Some(&LiteralValue::raw("None")));
    }

    #[test]
    fn test_annotated_assignment() {
        let subscripted = Stmt::AnnAssign(AnnAssign {
            target: Expr::name("xs"),
            annotation: Expr::subscript(Expr::name("List"), Expr::name("int")),
            value: Some(Expr::List(vec![])),
        });
        let bare = Stmt::AnnAssign(AnnAssign {
            target: Expr::name("n"),
            annotation: Expr::name("int"),
            value: None,
        });

        let decls = Normalizer::default().classify(&[subscripted.clone(), bare.clone()]);
        let Declaration::AnnAssign(first) = &decls[0] else {
            panic!("expected ANNASSIGN");
        };
        assert_eq!(first.annotated_type.as_deref(), Some("List"));
        assert_eq!(first.value, Some(LiteralValue::Sequence(vec![])));
        assert_eq!(first.declared_type, Some(LiteralValue::raw("List[int]")));

        let Declaration::AnnAssign(second) = &decls[1] else {
            panic!("expected ANNASSIGN");
        };
        assert_eq!(second.names, vec!["n"]);
        assert_eq!(second.value, None);
        assert_eq!(second.annotated_type, None);
        assert_eq!(second.declared_type, Some(LiteralValue::reference("int")));

        let asymmetric = Normalizer::new(NormalizeConfig {
            resolve_bare_annotations: false,
            ..Default::default()
        });
        let decls = asymmetric.classify(&[subscripted, bare]);
        assert!(matches!(
            &decls[0],
            Declaration::AnnAssign(AnnotatedAssignment { declared_type: Some(_), .. })
        ));
        assert!(matches!(
            &decls[1],
            Declaration::AnnAssign(AnnotatedAssignment { declared_type: None, .. })
        ));
    }

    #[test]
    fn test_nested_class_and_method() {
        let method = function(
            "m",
            vec![
                Stmt::Expr(Expr::str("Method doc.")),
                Stmt::opaque(StmtKind::Return, "return 1"),
            ],
        );
        let module = Module::new(vec![Stmt::ClassDef(class(
            "C",
            vec![assign("x", Expr::int(1)), Stmt::FunctionDef(method)],
        ))]);

        let decls = Normalizer::default().normalize(&module);
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].kind(), DeclarationKind::Class);
        assert_eq!(decls[0].names(), ["C"]);

        let body = decls[0].body().unwrap();
        assert_eq!(body[0].kind(), DeclarationKind::Assign);
        assert_eq!(body[0].names(), ["x"]);
        assert_eq!(body[1].kind(), DeclarationKind::Function);
        assert_eq!(body[1].names(), ["m"]);
        assert_eq!(body[1].doc(), Some("Method doc."));

        let method_body = body[1].body().unwrap();
        assert_eq!(method_body.len(), 2);
        assert_eq!(
            method_body[1],
            Declaration::Unknown(UnknownNode {
                node_kind: "Return".to_string(),
                raw: "return 1".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_statements_never_fail() {
        let body = vec![
            Stmt::opaque(StmtKind::If, "if x:\n    pass"),
            Stmt::opaque(StmtKind::Other("Match".to_string()), "match x:\n    case _:\n        pass"),
            Stmt::Expr(Expr::call(Expr::name("print"), vec![Expr::str("hi")])),
        ];
        let decls = Normalizer::default().classify(&body);
        assert_eq!(decls.len(), 3);
        assert!(decls.iter().all(|d| d.kind() == DeclarationKind::Unknown));
        let Declaration::Unknown(call) = &decls[2] else {
            unreachable!();
        };
        assert_eq!(call.node_kind, "Expr");
        assert_eq!(call.raw, "print('hi')");
    }

    #[test]
    fn test_statement_attribute_access() {
        let stmt = Stmt::Expr(Expr::attribute(
            Expr::attribute(Expr::name("os"), "path"),
            "sep",
        ));
        assert_eq!(
            Normalizer::default().classify_stmt(&stmt),
            Declaration::Attribute(AttributeAccess {
                names: vec!["os.path".to_string()],
                attribute: "sep".to_string(),
            })
        );
    }

    #[test]
    fn test_decorators_are_separate_from_body() {
        let mut func = function("handler", vec![assign("y", Expr::int(2))]);
        func.decorators = vec![
            Expr::name("staticmethod"),
            Expr::Call {
                func: Box::new(Expr::attribute(Expr::name("app"), "route")),
                args: vec![Expr::str("/")],
                keywords: vec![Keyword {
                    arg: Some("methods".to_string()),
                    value: Expr::List(vec![Expr::str("GET")]),
                }],
            },
            Expr::attribute(Expr::name("functools"), "cache"),
            Expr::Lambda {
                args: Box::default(),
                body: Box::new(Expr::name("f")),
            },
        ];

        let decl = Normalizer::default().classify_stmt(&Stmt::FunctionDef(func));
        let decorators = decl.decorators();
        assert_eq!(decorators.len(), 4);
        assert_eq!(
            decorators[0],
            Declaration::Decorator(DecoratorCall {
                names: vec!["staticmethod".to_string()],
                called: false,
                arguments: vec![],
                keywords: vec![],
            })
        );
        assert_eq!(
            decorators[1],
            Declaration::Decorator(DecoratorCall {
                names: vec!["app.route".to_string()],
                called: true,
                arguments: vec![LiteralValue::string("/")],
                keywords: vec![KeywordArgument {
                    name: Some("methods".to_string()),
                    value: LiteralValue::Sequence(vec![LiteralValue::string("GET")]),
                }],
            })
        );
        assert_eq!(decorators[2].kind(), DeclarationKind::Attribute);
        assert_eq!(decorators[3].kind(), DeclarationKind::Unknown);

        // Body statements never show up as decorators.
        assert!(decorators.iter().all(|d| d.names() != ["y"]));
        assert_eq!(decl.body().unwrap()[0].names(), ["y"]);
    }

    #[test]
    fn test_function_signature_and_returns() {
        let mut func = function("f", vec![]);
        func.args = Arguments {
            args: vec![Arg::annotated("x", Expr::name("int"))],
            vararg: Some(Arg::new("args")),
            ..Default::default()
        };
        func.returns = Some(Expr::name("str"));
        func.is_async = true;

        let Declaration::Function(decl) = Normalizer::default().classify_stmt(&Stmt::FunctionDef(func)) else {
            panic!("expected FUNCTION");
        };
        assert!(decl.is_async);
        assert_eq!(decl.returns, Some(LiteralValue::reference("str")));
        assert_eq!(decl.arguments.positional[0].role, ParameterRole::Positional);
        assert_eq!(decl.arguments.variadic[0].name, "args");
        assert_eq!(decl.doc, None);
    }

    #[test]
    fn test_conflated_references() {
        let normalizer = Normalizer::new(NormalizeConfig {
            distinguish_references: false,
            ..Default::default()
        });
        let mut func = function("f", vec![assign("x", Expr::name("y"))]);
        func.args.args = vec![Arg::annotated("a", Expr::name("int"))];

        let Declaration::Function(decl) = normalizer.classify_stmt(&Stmt::FunctionDef(func)) else {
            panic!("expected FUNCTION");
        };
        assert_eq!(decl.body[0].value(), Some(&LiteralValue::string("y")));
        assert_eq!(
            decl.arguments.positional[0].declared_type,
            Some(LiteralValue::string("int"))
        );
    }

    #[test]
    fn test_raw_docstrings() {
        let normalizer = Normalizer::new(NormalizeConfig {
            clean_docstrings: false,
            ..Default::default()
        });
        let cls = class("C", vec![Stmt::Expr(Expr::str("\n    Doc.\n    "))]);
        let decl = normalizer.classify_stmt(&Stmt::ClassDef(cls));
        assert_eq!(decl.doc(), Some("\n    Doc.\n    "));
    }

    #[test]
    fn test_classify_is_idempotent_and_ordered() {
        let body = vec![
            assign("a", Expr::int(1)),
            Stmt::FunctionDef(function("f", vec![])),
            assign("b", Expr::str("two")),
            Stmt::ClassDef(class("K", vec![])),
        ];
        let normalizer = Normalizer::default();
        let first = normalizer.classify(&body);
        assert_eq!(first, normalizer.classify(&body));
        let names: Vec<_> = first.iter().map(|d| d.names()[0].as_str()).collect();
        assert_eq!(names, vec!["a", "f", "b", "K"]);
    }
}

//! Tree-sitter based Python reader.
//!
//! Lowers the concrete syntax tree into [`crate::ast`]. Statements with no
//! dedicated variant are carried as opaque source text; expression kinds with
//! no dedicated variant become [`Expr::Other`].

use crate::ast::*;
use crate::traits::{ReadError, Reader};
use std::path::Path;
use tree_sitter::{Node, Parser, Tree};

/// Static instance of the Python reader, listed by [`crate::input::readers`].
pub static PYTHON_READER: PythonReader = PythonReader;

/// Python reader using tree-sitter.
pub struct PythonReader;

impl Reader for PythonReader {
    fn language(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn read(&self, source: &str) -> Result<Module, ReadError> {
        read_python(source)
    }
}

/// Parse Python source into a module.
pub fn read_python(source: &str) -> Result<Module, ReadError> {
    tracing::debug!(bytes = source.len(), "parsing python source");
    let tree = parse(source)?;

    let ctx = ReadContext::new(source);
    let module = ctx.read_module(&tree)?;
    tracing::debug!(statements = module.body.len(), "lowered python module");
    Ok(module)
}

/// Read and parse a Python file.
pub fn read_python_file(path: &Path) -> Result<Module, ReadError> {
    let source = std::fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "read python file");
    read_python(&source)
}

/// The parser's own tree as an S-expression. Syntax errors show up as
/// `ERROR` nodes rather than failing.
pub fn python_syntax_tree(source: &str) -> Result<String, ReadError> {
    Ok(parse(source)?.root_node().to_sexp())
}

fn parse(source: &str) -> Result<Tree, ReadError> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_python::language().into())
        .map_err(|err| ReadError::Grammar(err.to_string()))?;

    parser
        .parse(source, None)
        .ok_or_else(|| ReadError::Parse("failed to parse".into()))
}

/// Named children, minus comments.
fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

fn first_named<'t>(node: Node<'t>) -> Result<Node<'t>, ReadError> {
    named_children(node)
        .into_iter()
        .next()
        .ok_or_else(|| ReadError::Parse(format!("{} is empty", node.kind())))
}

fn field<'t>(node: Node<'t>, name: &str) -> Result<Node<'t>, ReadError> {
    node.child_by_field_name(name)
        .ok_or_else(|| ReadError::Parse(format!("{} missing {name}", node.kind())))
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error() || child.is_missing())
        .find_map(first_error)
}

fn push_param(args: &mut Arguments, keyword_only: bool, arg: Arg, default: Option<Expr>) {
    if keyword_only {
        args.kwonlyargs.push(arg);
        args.kw_defaults.push(default);
    } else {
        args.args.push(arg);
        args.defaults.extend(default);
    }
}

fn is_async(node: Node) -> bool {
    node.child(0).is_some_and(|first| first.kind() == "async")
}

/// Statement kinds carried as opaque source.
fn opaque_kind(node: Node) -> Option<StmtKind> {
    Some(match node.kind() {
        "return_statement" => StmtKind::Return,
        "delete_statement" => StmtKind::Delete,
        "pass_statement" => StmtKind::Pass,
        "break_statement" => StmtKind::Break,
        "continue_statement" => StmtKind::Continue,
        "if_statement" => StmtKind::If,
        "for_statement" if is_async(node) => StmtKind::Other("AsyncFor".into()),
        "for_statement" => StmtKind::For,
        "while_statement" => StmtKind::While,
        "with_statement" if is_async(node) => StmtKind::Other("AsyncWith".into()),
        "with_statement" => StmtKind::With,
        "try_statement" => StmtKind::Try,
        "raise_statement" => StmtKind::Raise,
        "assert_statement" => StmtKind::Assert,
        "import_statement" => StmtKind::Import,
        "import_from_statement" | "future_import_statement" => StmtKind::ImportFrom,
        "global_statement" => StmtKind::Global,
        "nonlocal_statement" => StmtKind::Nonlocal,
        "match_statement" => StmtKind::Match,
        "type_alias_statement" => StmtKind::TypeAlias,
        "print_statement" => StmtKind::Other("Print".into()),
        "exec_statement" => StmtKind::Other("Exec".into()),
        _ => return None,
    })
}

/// Python `ast` name for expression kinds kept as source.
fn other_expr_kind(kind: &str) -> &str {
    match kind {
        "list_comprehension" => "ListComp",
        "dictionary_comprehension" => "DictComp",
        "set_comprehension" => "SetComp",
        "generator_expression" => "GeneratorExp",
        "yield" => "Yield",
        other => other,
    }
}

struct ReadContext<'a> {
    source: &'a str,
}

impl<'a> ReadContext<'a> {
    fn new(source: &'a str) -> Self {
        Self { source }
    }

    fn node_text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Node text with continuation lines shifted left by the node's own
    /// start column, so nested statements read as if at top level.
    fn dedented_text(&self, node: Node) -> String {
        let column = node.start_position().column;
        let text = self.node_text(node);
        let mut out = String::with_capacity(text.len());
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
                let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
                out.push_str(&line[indent.min(column)..]);
            } else {
                out.push_str(line);
            }
        }
        out.truncate(out.trim_end().len());
        out
    }

    fn read_module(&self, tree: &Tree) -> Result<Module, ReadError> {
        let root = tree.root_node();

        if root.has_error() {
            let message = match first_error(root) {
                Some(node) => {
                    let pos = node.start_position();
                    format!("syntax error at line {}, column {}", pos.row + 1, pos.column + 1)
                }
                None => "syntax error in source".to_string(),
            };
            tracing::debug!(%message, "rejecting python source");
            return Err(ReadError::Parse(message));
        }

        Ok(Module::new(self.read_block(root)?))
    }

    fn read_block(&self, node: Node) -> Result<Vec<Stmt>, ReadError> {
        named_children(node)
            .into_iter()
            .map(|child| self.read_stmt(child))
            .collect()
    }

    fn read_stmt(&self, node: Node) -> Result<Stmt, ReadError> {
        match node.kind() {
            "expression_statement" => match named_children(node).as_slice() {
                [single] => self.read_simple_stmt(*single),
                // `a, b` at statement level
                many => Ok(Stmt::Expr(Expr::Tuple(self.read_exprs(many)?))),
            },
            "function_definition" => Ok(Stmt::FunctionDef(self.read_function(node, Vec::new())?)),
            "class_definition" => Ok(Stmt::ClassDef(self.read_class(node, Vec::new())?)),
            "decorated_definition" => self.read_decorated(node),
            _ => match opaque_kind(node) {
                Some(kind) => Ok(Stmt::opaque(kind, self.dedented_text(node))),
                // Expression nodes at statement level
                None => self.read_simple_stmt(node),
            },
        }
    }

    fn read_simple_stmt(&self, node: Node) -> Result<Stmt, ReadError> {
        match node.kind() {
            "assignment" => self.read_assignment(node),
            "augmented_assignment" => Ok(Stmt::opaque(
                StmtKind::AugAssign,
                self.dedented_text(node),
            )),
            _ => Ok(Stmt::Expr(self.read_expr(node)?)),
        }
    }

    fn read_assignment(&self, node: Node) -> Result<Stmt, ReadError> {
        let left = field(node, "left")?;

        if let Some(annotation) = node.child_by_field_name("type") {
            let value = node
                .child_by_field_name("right")
                .map(|right| self.read_expr(right))
                .transpose()?;
            return Ok(Stmt::AnnAssign(AnnAssign {
                target: self.read_expr(left)?,
                annotation: self.read_expr(annotation)?,
                value,
            }));
        }

        // a = b = value nests one assignment per `=`
        let mut targets = vec![self.read_expr(left)?];
        let mut right = field(node, "right")?;
        while right.kind() == "assignment" && right.child_by_field_name("type").is_none() {
            targets.push(self.read_expr(field(right, "left")?)?);
            right = field(right, "right")?;
        }

        Ok(Stmt::Assign(Assign {
            targets,
            value: self.read_expr(right)?,
        }))
    }

    fn read_decorated(&self, node: Node) -> Result<Stmt, ReadError> {
        let mut decorators = Vec::new();
        for child in named_children(node) {
            if child.kind() == "decorator" {
                decorators.push(self.read_expr(first_named(child)?)?);
            }
        }

        let definition = field(node, "definition")?;
        match definition.kind() {
            "function_definition" => Ok(Stmt::FunctionDef(
                self.read_function(definition, decorators)?,
            )),
            "class_definition" => Ok(Stmt::ClassDef(self.read_class(definition, decorators)?)),
            other => Err(ReadError::Parse(format!(
                "unexpected decorated definition: {other}"
            ))),
        }
    }

    fn read_function(&self, node: Node, decorators: Vec<Expr>) -> Result<FunctionDef, ReadError> {
        let name = field(node, "name")?;
        let body = field(node, "body")?;

        let args = node
            .child_by_field_name("parameters")
            .map(|params| self.read_parameters(params))
            .transpose()?
            .unwrap_or_default();
        let returns = node
            .child_by_field_name("return_type")
            .map(|ret| self.read_expr(ret))
            .transpose()?;

        Ok(FunctionDef {
            name: self.node_text(name).to_string(),
            args,
            body: self.read_block(body)?,
            decorators,
            returns,
            is_async: is_async(node),
        })
    }

    fn read_class(&self, node: Node, decorators: Vec<Expr>) -> Result<ClassDef, ReadError> {
        let name = field(node, "name")?;
        let body = field(node, "body")?;

        let (bases, keywords) = match node.child_by_field_name("superclasses") {
            Some(list) => self.read_call_arguments(list)?,
            None => (Vec::new(), Vec::new()),
        };

        Ok(ClassDef {
            name: self.node_text(name).to_string(),
            bases,
            keywords,
            body: self.read_block(body)?,
            decorators,
        })
    }

    /// `parameters` of a `def`, or `lambda_parameters`.
    fn read_parameters(&self, node: Node) -> Result<Arguments, ReadError> {
        let mut args = Arguments::default();
        // Everything after `*` or `*args` is keyword-only.
        let mut keyword_only = false;

        for child in named_children(node) {
            match child.kind() {
                "identifier" => push_param(&mut args, keyword_only, Arg::new(self.node_text(child)), None),
                "typed_parameter" => {
                    let annotation = Some(self.read_expr(field(child, "type")?)?);
                    let inner = first_named(child)?;
                    match inner.kind() {
                        "list_splat_pattern" => {
                            args.vararg = Some(Arg {
                                name: self.splat_name(inner)?,
                                annotation,
                            });
                            keyword_only = true;
                        }
                        "dictionary_splat_pattern" => {
                            args.kwarg = Some(Arg {
                                name: self.splat_name(inner)?,
                                annotation,
                            });
                        }
                        _ => push_param(
                            &mut args,
                            keyword_only,
                            Arg {
                                name: self.node_text(inner).to_string(),
                                annotation,
                            },
                            None,
                        ),
                    }
                }
                "default_parameter" => {
                    let name = field(child, "name")?;
                    let value = self.read_expr(field(child, "value")?)?;
                    push_param(&mut args, keyword_only, Arg::new(self.node_text(name)), Some(value));
                }
                "typed_default_parameter" => {
                    let name = field(child, "name")?;
                    let annotation = self.read_expr(field(child, "type")?)?;
                    let value = self.read_expr(field(child, "value")?)?;
                    push_param(
                        &mut args,
                        keyword_only,
                        Arg::annotated(self.node_text(name), annotation),
                        Some(value),
                    );
                }
                "list_splat_pattern" => {
                    args.vararg = Some(Arg::new(self.splat_name(child)?));
                    keyword_only = true;
                }
                "dictionary_splat_pattern" => {
                    args.kwarg = Some(Arg::new(self.splat_name(child)?));
                }
                "keyword_separator" => keyword_only = true,
                "positional_separator" => {
                    let before = std::mem::take(&mut args.args);
                    args.posonlyargs.extend(before);
                }
                // Python 2 tuple parameters and anything newer
                _ => push_param(&mut args, keyword_only, Arg::new(self.node_text(child)), None),
            }
        }

        Ok(args)
    }

    fn splat_name(&self, node: Node) -> Result<String, ReadError> {
        Ok(self.node_text(first_named(node)?).to_string())
    }

    fn read_call_arguments(&self, node: Node) -> Result<(Vec<Expr>, Vec<Keyword>), ReadError> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();

        for child in named_children(node) {
            match child.kind() {
                "keyword_argument" => {
                    let name = field(child, "name")?;
                    let value = field(child, "value")?;
                    keywords.push(Keyword {
                        arg: Some(self.node_text(name).to_string()),
                        value: self.read_expr(value)?,
                    });
                }
                "dictionary_splat" => keywords.push(Keyword {
                    arg: None,
                    value: self.read_expr(first_named(child)?)?,
                }),
                _ => args.push(self.read_expr(child)?),
            }
        }

        Ok((args, keywords))
    }

    fn read_exprs(&self, nodes: &[Node]) -> Result<Vec<Expr>, ReadError> {
        nodes.iter().map(|node| self.read_expr(*node)).collect()
    }

    fn read_children(&self, node: Node) -> Result<Vec<Expr>, ReadError> {
        self.read_exprs(&named_children(node))
    }

    fn read_expr(&self, node: Node) -> Result<Expr, ReadError> {
        match node.kind() {
            // Literals
            "identifier" => Ok(Expr::name(self.node_text(node))),
            "string" => Ok(self.read_string(node)),
            "concatenated_string" => Ok(self.read_concatenated_string(node)),
            "integer" | "float" => Ok(self.read_number(node)),
            "true" => Ok(Expr::Bool(true)),
            "false" => Ok(Expr::Bool(false)),
            "none" => Ok(Expr::NoneLit),
            "ellipsis" => Ok(Expr::Ellipsis),

            // Displays
            "list" | "list_pattern" => Ok(Expr::List(self.read_children(node)?)),
            "tuple" | "tuple_pattern" | "expression_list" | "pattern_list" => {
                Ok(Expr::Tuple(self.read_children(node)?))
            }
            "set" => Ok(Expr::Set(self.read_children(node)?)),
            "dictionary" => self.read_dictionary(node),

            "parenthesized_expression" | "type" => self.read_expr(first_named(node)?),

            // Operators
            "binary_operator" => {
                let op_node = field(node, "operator")?;
                let op = Operator::from_symbol(self.node_text(op_node)).ok_or_else(|| {
                    ReadError::Parse(format!("unknown binary op: {}", self.node_text(op_node)))
                })?;
                Ok(Expr::binary(
                    self.read_expr(field(node, "left")?)?,
                    op,
                    self.read_expr(field(node, "right")?)?,
                ))
            }
            "boolean_operator" => self.read_boolean_operator(node),
            "comparison_operator" => self.read_comparison_operator(node),
            "unary_operator" => {
                let op_node = field(node, "operator")?;
                let op = match self.node_text(op_node) {
                    "-" => UnaryOperator::USub,
                    "+" => UnaryOperator::UAdd,
                    "~" => UnaryOperator::Invert,
                    other => {
                        return Err(ReadError::Parse(format!("unknown unary op: {other}")));
                    }
                };
                Ok(Expr::UnaryOp {
                    op,
                    operand: Box::new(self.read_expr(field(node, "argument")?)?),
                })
            }
            "not_operator" => Ok(Expr::UnaryOp {
                op: UnaryOperator::Not,
                operand: Box::new(self.read_expr(field(node, "argument")?)?),
            }),

            // Access and calls
            "call" => {
                let function = field(node, "function")?;
                let arguments = field(node, "arguments")?;
                let (args, keywords) = if arguments.kind() == "argument_list" {
                    self.read_call_arguments(arguments)?
                } else {
                    // f(x for x in xs)
                    (vec![self.read_expr(arguments)?], Vec::new())
                };
                Ok(Expr::Call {
                    func: Box::new(self.read_expr(function)?),
                    args,
                    keywords,
                })
            }
            "attribute" => {
                let object = field(node, "object")?;
                let attribute = field(node, "attribute")?;
                Ok(Expr::attribute(
                    self.read_expr(object)?,
                    self.node_text(attribute),
                ))
            }
            "subscript" => {
                let value = field(node, "value")?;
                let mut cursor = node.walk();
                let subscripts: Vec<_> = node
                    .children_by_field_name("subscript", &mut cursor)
                    .collect();
                let slice = match subscripts.as_slice() {
                    [single] => self.read_expr(*single)?,
                    many => Expr::Tuple(self.read_exprs(many)?),
                };
                Ok(Expr::subscript(self.read_expr(value)?, slice))
            }
            "slice" => self.read_slice(node),
            "list_splat" | "list_splat_pattern" | "splat_type" => {
                Ok(Expr::Starred(Box::new(self.read_expr(first_named(node)?)?)))
            }

            // Type annotations
            "generic_type" => {
                let children = named_children(node);
                let [base, params] = children.as_slice() else {
                    return Err(ReadError::Parse("generic_type needs a base and parameters".into()));
                };
                Ok(Expr::subscript(self.read_expr(*base)?, self.read_expr(*params)?))
            }
            "type_parameter" => match named_children(node).as_slice() {
                [single] => self.read_expr(*single),
                many => Ok(Expr::Tuple(self.read_exprs(many)?)),
            },
            "union_type" => {
                let children = named_children(node);
                let [left, right] = children.as_slice() else {
                    return Err(ReadError::Parse("union_type needs two operands".into()));
                };
                Ok(Expr::binary(
                    self.read_expr(*left)?,
                    Operator::BitOr,
                    self.read_expr(*right)?,
                ))
            }
            "member_type" => {
                let children = named_children(node);
                let [base, attr] = children.as_slice() else {
                    return Err(ReadError::Parse("member_type needs a base and a name".into()));
                };
                Ok(Expr::attribute(self.read_expr(*base)?, self.node_text(*attr)))
            }

            // Other expression forms
            "conditional_expression" => {
                let children = named_children(node);
                let [body, test, orelse] = children.as_slice() else {
                    return Err(ReadError::Parse(
                        "conditional_expression needs 3 parts".into(),
                    ));
                };
                Ok(Expr::IfExp {
                    test: Box::new(self.read_expr(*test)?),
                    body: Box::new(self.read_expr(*body)?),
                    orelse: Box::new(self.read_expr(*orelse)?),
                })
            }
            "lambda" => {
                let args = node
                    .child_by_field_name("parameters")
                    .map(|params| self.read_parameters(params))
                    .transpose()?
                    .unwrap_or_default();
                Ok(Expr::Lambda {
                    args: Box::new(args),
                    body: Box::new(self.read_expr(field(node, "body")?)?),
                })
            }
            "named_expression" => Ok(Expr::NamedExpr {
                target: Box::new(self.read_expr(field(node, "name")?)?),
                value: Box::new(self.read_expr(field(node, "value")?)?),
            }),
            "await" => Ok(Expr::Await(Box::new(self.read_expr(first_named(node)?)?))),

            kind => {
                tracing::trace!(kind, "keeping expression as source");
                Ok(Expr::Other {
                    kind: other_expr_kind(kind).to_string(),
                    source: self.dedented_text(node),
                })
            }
        }
    }

    fn read_boolean_operator(&self, node: Node) -> Result<Expr, ReadError> {
        let left = field(node, "left")?;
        let right = field(node, "right")?;
        let op_node = field(node, "operator")?;

        let op = BoolOperator::from_keyword(self.node_text(op_node)).ok_or_else(|| {
            ReadError::Parse(format!("unknown boolean op: {}", self.node_text(op_node)))
        })?;

        // The grammar nests left; `a and b and c` is one node in Python.
        let mut values = match self.read_expr(left)? {
            Expr::BoolOp(inner) if inner.op == op && left.kind() == "boolean_operator" => {
                inner.values
            }
            other => vec![other],
        };
        values.push(self.read_expr(right)?);

        Ok(Expr::boolean(op, values))
    }

    fn read_comparison_operator(&self, node: Node) -> Result<Expr, ReadError> {
        let mut operands = Vec::new();
        let mut ops = Vec::new();
        // `not in` and `is not` may arrive as two tokens.
        let mut pending = String::new();

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "comment" {
                continue;
            }
            if child.is_named() {
                if !pending.is_empty() {
                    let op = CmpOperator::from_symbol(&pending).ok_or_else(|| {
                        ReadError::Parse(format!("unknown comparison op: {pending}"))
                    })?;
                    ops.push(op);
                    pending.clear();
                }
                operands.push(self.read_expr(child)?);
            } else {
                if !pending.is_empty() {
                    pending.push(' ');
                }
                pending.push_str(self.node_text(child));
            }
        }

        let mut operands = operands.into_iter();
        let left = operands
            .next()
            .ok_or_else(|| ReadError::Parse("comparison has no operands".into()))?;
        let comparators: Vec<_> = operands.collect();
        if comparators.is_empty() || comparators.len() != ops.len() {
            return Err(ReadError::Parse(
                "comparison operators and operands do not line up".into(),
            ));
        }

        Ok(Expr::Compare {
            left: Box::new(left),
            ops,
            comparators,
        })
    }

    fn read_dictionary(&self, node: Node) -> Result<Expr, ReadError> {
        let mut keys = Vec::new();
        let mut values = Vec::new();

        for child in named_children(node) {
            match child.kind() {
                "pair" => {
                    keys.push(Some(self.read_expr(field(child, "key")?)?));
                    values.push(self.read_expr(field(child, "value")?)?);
                }
                "dictionary_splat" => {
                    keys.push(None);
                    values.push(self.read_expr(first_named(child)?)?);
                }
                other => {
                    return Err(ReadError::Parse(format!("unexpected {other} in dictionary")));
                }
            }
        }

        Ok(Expr::Dict { keys, values })
    }

    fn read_slice(&self, node: Node) -> Result<Expr, ReadError> {
        // lower:upper:step, any part optional; colons mark the position.
        let mut parts: [Option<Box<Expr>>; 3] = [None, None, None];
        let mut index = 0;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == ":" {
                index += 1;
            } else if child.is_named() && child.kind() != "comment" && index < parts.len() {
                parts[index] = Some(Box::new(self.read_expr(child)?));
            }
        }

        let [lower, upper, step] = parts;
        Ok(Expr::Slice { lower, upper, step })
    }

    fn read_string(&self, node: Node) -> Expr {
        let text = self.node_text(node);
        let prefix_len = text.find(['\'', '"']).unwrap_or(0);
        let prefix = text[..prefix_len].to_ascii_lowercase();

        if prefix.contains('f') || prefix.contains('t') {
            return Expr::FormattedStr(text.to_string());
        }
        if prefix.contains('b') {
            return Expr::Bytes(text.to_string());
        }

        let quoted = &text[prefix_len..];
        let quote_len = if quoted.starts_with("\"\"\"") || quoted.starts_with("'''") {
            3
        } else {
            1
        };
        let body = quoted
            .get(quote_len..quoted.len().saturating_sub(quote_len))
            .unwrap_or("");

        if prefix.contains('r') {
            return Expr::Str(body.to_string());
        }
        match decode_escapes(body) {
            Some(decoded) => Expr::Str(decoded),
            None => {
                tracing::trace!(text, "named unicode escape kept as source");
                Expr::Other {
                    kind: "Constant".to_string(),
                    source: text.to_string(),
                }
            }
        }
    }

    fn read_concatenated_string(&self, node: Node) -> Expr {
        let parts: Vec<Expr> = named_children(node)
            .into_iter()
            .filter(|child| child.kind() == "string")
            .map(|child| self.read_string(child))
            .collect();

        let mut joined = String::new();
        for part in &parts {
            match part {
                Expr::Str(s) => joined.push_str(s),
                Expr::Bytes(_) => return Expr::Bytes(self.node_text(node).to_string()),
                Expr::Other { kind, .. } => {
                    return Expr::Other {
                        kind: kind.clone(),
                        source: self.node_text(node).to_string(),
                    };
                }
                _ => return Expr::FormattedStr(self.node_text(node).to_string()),
            }
        }
        Expr::Str(joined)
    }

    fn read_number(&self, node: Node) -> Expr {
        let text = self.node_text(node);
        match parse_number(text) {
            Some(num) => Expr::Num(num),
            None => {
                tracing::trace!(text, "numeric literal out of range");
                Expr::Other {
                    kind: "Constant".to_string(),
                    source: text.to_string(),
                }
            }
        }
    }
}

/// Parse a Python numeric literal. `None` when it does not fit an `i64` or
/// a finite `f64`.
fn parse_number(text: &str) -> Option<Num> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .to_ascii_lowercase();

    if let Some(imag) = cleaned.strip_suffix('j') {
        return imag
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())
            .map(Num::Imaginary);
    }

    // Python 2 long suffix
    let cleaned = cleaned.trim_end_matches('l');
    let (digits, radix) = if let Some(hex) = cleaned.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(oct) = cleaned.strip_prefix("0o") {
        (oct, 8)
    } else if let Some(bin) = cleaned.strip_prefix("0b") {
        (bin, 2)
    } else {
        (cleaned, 10)
    };

    if radix == 10 && digits.contains(['.', 'e']) {
        // 1e999 overflows to inf, which has no JSON form
        return digits
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())
            .map(Num::Float);
    }
    i64::from_str_radix(digits, radix).ok().map(Num::Int)
}

/// Decode backslash escapes of a non-raw string body. `None` when the body
/// uses a `\N{NAME}` escape, which needs the Unicode name table.
fn decode_escapes(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escape) = chars.next() else {
            out.push('\\');
            break;
        };
        match escape {
            // line continuation
            '\n' => {}
            '\r' => {
                chars.next_if_eq(&'\n');
            }
            '\\' | '\'' | '"' => out.push(escape),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut value = escape as u32 - '0' as u32;
                for _ in 0..2 {
                    match chars.next_if(|d| ('0'..='7').contains(d)) {
                        Some(d) => value = value * 8 + (d as u32 - '0' as u32),
                        None => break,
                    }
                }
                out.extend(char::from_u32(value));
            }
            'x' | 'u' | 'U' => {
                let width = match escape {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = (0..width)
                    .map_while(|_| chars.next_if(|d| d.is_ascii_hexdigit()))
                    .collect();
                let decoded = (digits.len() == width)
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push('\\');
                        out.push(escape);
                        out.push_str(&digits);
                    }
                }
            }
            'N' if chars.peek() == Some(&'{') => return None,
            // unknown escapes stay as written
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(source: &str) -> Stmt {
        let module = read_python(source).unwrap();
        assert_eq!(module.body.len(), 1, "expected one statement in {source:?}");
        module.body.into_iter().next().unwrap()
    }

    fn assigned_value(source: &str) -> Expr {
        match single(source) {
            Stmt::Assign(assign) => assign.value,
            other => panic!("expected Assign, got {other:?}"),
        }
    }

    #[test]
    fn test_simple_assignment() {
        match single("x = 42") {
            Stmt::Assign(assign) => {
                assert_eq!(assign.targets, vec![Expr::name("x")]);
                assert_eq!(assign.value, Expr::int(42));
            }
            other => panic!("expected Assign, got {other:?}"),
        }
    }

    #[test]
    fn test_chained_assignment() {
        match single("a = b = 1") {
            Stmt::Assign(assign) => {
                assert_eq!(assign.targets, vec![Expr::name("a"), Expr::name("b")]);
                assert_eq!(assign.value, Expr::int(1));
            }
            other => panic!("expected Assign, got {other:?}"),
        }
    }

    #[test]
    fn test_tuple_target() {
        match single("x, y = 1, 2") {
            Stmt::Assign(assign) => {
                assert_eq!(
                    assign.targets,
                    vec![Expr::Tuple(vec![Expr::name("x"), Expr::name("y")])]
                );
                assert_eq!(assign.value, Expr::Tuple(vec![Expr::int(1), Expr::int(2)]));
            }
            other => panic!("expected Assign, got {other:?}"),
        }
    }

    #[test]
    fn test_annotated_assignment() {
        match single("n: int") {
            Stmt::AnnAssign(ann) => {
                assert_eq!(ann.target, Expr::name("n"));
                assert_eq!(ann.annotation, Expr::name("int"));
                assert_eq!(ann.value, None);
            }
            other => panic!("expected AnnAssign, got {other:?}"),
        }
        match single("xs: List[int] = []") {
            Stmt::AnnAssign(ann) => {
                assert_eq!(
                    ann.annotation,
                    Expr::subscript(Expr::name("List"), Expr::name("int"))
                );
                assert_eq!(ann.value, Some(Expr::List(vec![])));
            }
            other => panic!("expected AnnAssign, got {other:?}"),
        }
    }

    #[test]
    fn test_function_parameters() {
        let source = "async def f(a, /, b: int = 1, *args, c, d: str = 'x', **kw) -> None:\n    pass";
        match single(source) {
            Stmt::FunctionDef(func) => {
                assert_eq!(func.name, "f");
                assert!(func.is_async);
                assert_eq!(func.returns, Some(Expr::NoneLit));
                let args = &func.args;
                assert_eq!(args.posonlyargs, vec![Arg::new("a")]);
                assert_eq!(args.args, vec![Arg::annotated("b", Expr::name("int"))]);
                assert_eq!(args.defaults, vec![Expr::int(1)]);
                assert_eq!(args.vararg, Some(Arg::new("args")));
                assert_eq!(
                    args.kwonlyargs,
                    vec![Arg::new("c"), Arg::annotated("d", Expr::name("str"))]
                );
                assert_eq!(args.kw_defaults, vec![None, Some(Expr::str("x"))]);
                assert_eq!(args.kwarg, Some(Arg::new("kw")));
                assert_eq!(func.body, vec![Stmt::opaque(StmtKind::Pass, "pass")]);
            }
            other => panic!("expected FunctionDef, got {other:?}"),
        }
    }

    #[test]
    fn test_keyword_separator() {
        match single("def f(a, *, b=2):\n    pass") {
            Stmt::FunctionDef(func) => {
                assert_eq!(func.args.args, vec![Arg::new("a")]);
                assert_eq!(func.args.vararg, None);
                assert_eq!(func.args.kwonlyargs, vec![Arg::new("b")]);
                assert_eq!(func.args.kw_defaults, vec![Some(Expr::int(2))]);
            }
            other => panic!("expected FunctionDef, got {other:?}"),
        }
    }

    #[test]
    fn test_decorated_class() {
        let source = "@dataclass(frozen=True)\nclass Point(Base, metaclass=Meta):\n    x: int = 0\n";
        match single(source) {
            Stmt::ClassDef(class) => {
                assert_eq!(class.name, "Point");
                assert_eq!(class.bases, vec![Expr::name("Base")]);
                assert_eq!(
                    class.keywords,
                    vec![Keyword {
                        arg: Some("metaclass".to_string()),
                        value: Expr::name("Meta"),
                    }]
                );
                assert_eq!(class.decorators.len(), 1);
                assert!(matches!(
                    &class.decorators[0],
                    Expr::Call { keywords, .. } if keywords.len() == 1
                ));
                assert_eq!(class.body.len(), 1);
            }
            other => panic!("expected ClassDef, got {other:?}"),
        }
    }

    #[test]
    fn test_boolean_chain_is_flat() {
        let value = assigned_value("v = a and b and c");
        assert_eq!(
            value,
            Expr::boolean(
                BoolOperator::And,
                vec![Expr::name("a"), Expr::name("b"), Expr::name("c")]
            )
        );
    }

    #[test]
    fn test_comparison_operators() {
        let value = assigned_value("v = a not in b is not c");
        assert_eq!(
            value,
            Expr::Compare {
                left: Box::new(Expr::name("a")),
                ops: vec![CmpOperator::NotIn, CmpOperator::IsNot],
                comparators: vec![Expr::name("b"), Expr::name("c")],
            }
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(assigned_value(r#"s = 'a\nb'"#), Expr::str("a\nb"));
        assert_eq!(assigned_value(r#"s = r'a\nb'"#), Expr::str("a\\nb"));
        assert_eq!(assigned_value(r#"s = "it's""#), Expr::str("it's"));
        assert_eq!(assigned_value(r#"s = '\x41\u00e9'"#), Expr::str("Aé"));
        assert_eq!(assigned_value("s = 'a' 'b'"), Expr::str("ab"));
        assert_eq!(assigned_value("s = b'raw'"), Expr::Bytes("b'raw'".to_string()));
        assert_eq!(
            assigned_value("s = f'{x}!'"),
            Expr::FormattedStr("f'{x}!'".to_string())
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(assigned_value("n = 0xff"), Expr::int(255));
        assert_eq!(assigned_value("n = 1_000"), Expr::int(1000));
        assert_eq!(assigned_value("n = 2.5"), Expr::float(2.5));
        assert_eq!(assigned_value("n = 3j"), Expr::Num(Num::Imaginary(3.0)));
        assert_eq!(
            assigned_value("n = 99999999999999999999"),
            Expr::Other {
                kind: "Constant".to_string(),
                source: "99999999999999999999".to_string(),
            }
        );
        assert_eq!(
            assigned_value("n = 1e999"),
            Expr::Other {
                kind: "Constant".to_string(),
                source: "1e999".to_string(),
            }
        );
        assert_eq!(
            assigned_value("n = 1e999j"),
            Expr::Other {
                kind: "Constant".to_string(),
                source: "1e999j".to_string(),
            }
        );
    }

    #[test]
    fn test_dict_with_splat() {
        let value = assigned_value("d = {'a': 1, **rest}");
        assert_eq!(
            value,
            Expr::Dict {
                keys: vec![Some(Expr::str("a")), None],
                values: vec![Expr::int(1), Expr::name("rest")],
            }
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let module = read_python("# leading\nx = 1  # trailing\n# between\ny = 2\n").unwrap();
        assert_eq!(module.body.len(), 2);
    }

    #[test]
    fn test_opaque_statements_keep_source() {
        let source = "def f():\n    if x:\n        return 1\n";
        match single(source) {
            Stmt::FunctionDef(func) => {
                assert_eq!(
                    func.body,
                    vec![Stmt::opaque(StmtKind::If, "if x:\n    return 1")]
                );
            }
            other => panic!("expected FunctionDef, got {other:?}"),
        }
        assert_eq!(
            single("x += 1"),
            Stmt::opaque(StmtKind::AugAssign, "x += 1")
        );
        assert_eq!(
            single("import os"),
            Stmt::opaque(StmtKind::Import, "import os")
        );
    }

    #[test]
    fn test_attribute_statement() {
        assert_eq!(
            single("os.path"),
            Stmt::Expr(Expr::attribute(Expr::name("os"), "path"))
        );
    }

    #[test]
    fn test_syntax_error() {
        let err = read_python("def (:\n").unwrap_err();
        assert!(matches!(err, ReadError::Parse(_)));
    }

    #[test]
    fn test_syntax_tree_dump() {
        let tree = python_syntax_tree("x = 1").unwrap();
        assert!(tree.starts_with("(module"));
        assert!(tree.contains("assignment"));
    }

    #[test]
    fn test_read_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mod.py");
        std::fs::write(&path, "x = 1\n").unwrap();
        assert_eq!(read_python_file(&path).unwrap().body.len(), 1);

        let missing = read_python_file(&dir.path().join("missing.py")).unwrap_err();
        assert!(matches!(missing, ReadError::Io { .. }));
    }

    #[test]
    fn test_decode_escapes() {
        assert_eq!(decode_escapes(r"\101\0").as_deref(), Some("A\0"));
        assert_eq!(decode_escapes(r"a\
b").as_deref(), Some("ab"));
        assert_eq!(decode_escapes(r"\q\N").as_deref(), Some(r"\q\N"));
        assert_eq!(decode_escapes(r"\xZZ").as_deref(), Some(r"\xZZ"));
        assert_eq!(decode_escapes(r"\N{BULLET}"), None);
    }

    #[test]
    fn test_named_escape_kept_as_source() {
        assert_eq!(
            assigned_value(r"s = '\N{BULLET} item'"),
            Expr::Other {
                kind: "Constant".to_string(),
                source: r"'\N{BULLET} item'".to_string(),
            }
        );
        assert_eq!(
            assigned_value(r"s = 'a' '\N{BULLET}'"),
            Expr::Other {
                kind: "Constant".to_string(),
                source: r"'a' '\N{BULLET}'".to_string(),
            }
        );
        assert_eq!(assigned_value(r"s = r'\N{BULLET}'"), Expr::str(r"\N{BULLET}"));
    }
}

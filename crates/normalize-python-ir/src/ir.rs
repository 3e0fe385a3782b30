//! Serializable declaration IR.
//!
//! Everything here is plain owned data: built once by the
//! [`Normalizer`](crate::Normalizer), returned by value, never mutated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A literal value resolved from an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum LiteralValue {
    /// A string literal.
    String(String),
    /// A bare identifier.
    Reference(String),
    Number(Number),
    /// A tuple or list.
    Sequence(Vec<LiteralValue>),
    /// A dict display, in first-insertion order.
    Mapping(Vec<MappingEntry>),
    /// Source-like text for anything without a structured form.
    Raw(String),
}

/// One key/value pair of a [`LiteralValue::Mapping`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct MappingEntry {
    pub key: LiteralValue,
    pub value: LiteralValue,
}

/// A numeric literal, keeping its natural kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
    Complex { real: f64, imag: f64 },
}

impl LiteralValue {
    pub fn string(value: impl Into<String>) -> Self {
        LiteralValue::String(value.into())
    }

    pub fn reference(name: impl Into<String>) -> Self {
        LiteralValue::Reference(name.into())
    }

    pub fn raw(text: impl Into<String>) -> Self {
        LiteralValue::Raw(text.into())
    }

    pub fn int(value: i64) -> Self {
        LiteralValue::Number(Number::Int(value))
    }

    /// Build a mapping from pairs; a repeated key overwrites the earlier value
    /// but keeps the earlier position.
    pub fn mapping(pairs: impl IntoIterator<Item = (LiteralValue, LiteralValue)>) -> Self {
        let mut entries: Vec<MappingEntry> = Vec::new();
        for (key, value) in pairs {
            match entries.iter_mut().find(|entry| entry.key == key) {
                Some(existing) => existing.value = value,
                None => entries.push(MappingEntry { key, value }),
            }
        }
        LiteralValue::Mapping(entries)
    }

    /// Look up a mapping entry by key.
    pub fn get(&self, key: &LiteralValue) -> Option<&LiteralValue> {
        match self {
            LiteralValue::Mapping(entries) => entries
                .iter()
                .find(|entry| &entry.key == key)
                .map(|entry| &entry.value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::String(s) | LiteralValue::Reference(s) | LiteralValue::Raw(s) => {
                Some(s)
            }
            _ => None,
        }
    }

    /// Collapse every `Reference` into a `String`, recursively.
    ///
    /// This is the identifier/string-conflated form some consumers expect.
    pub fn conflate_references(self) -> Self {
        match self {
            LiteralValue::Reference(name) => LiteralValue::String(name),
            LiteralValue::Sequence(items) => LiteralValue::Sequence(
                items
                    .into_iter()
                    .map(LiteralValue::conflate_references)
                    .collect(),
            ),
            LiteralValue::Mapping(entries) => LiteralValue::mapping(
                entries
                    .into_iter()
                    .map(|e| (e.key.conflate_references(), e.value.conflate_references())),
            ),
            other => other,
        }
    }
}

/// Renders the value as Python source.
impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::String(s) => f.write_str(&crate::unparse::quote_str(s)),
            LiteralValue::Reference(s) | LiteralValue::Raw(s) => f.write_str(s),
            LiteralValue::Number(n) => write!(f, "{n}"),
            LiteralValue::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            LiteralValue::Mapping(entries) => {
                f.write_str("{")?;
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", entry.key, entry.value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int(n) => write!(f, "{n}"),
            Number::Float(x) => f.write_str(&crate::unparse::float_repr(x)),
            Number::Complex { real, imag } if real == 0.0 => {
                write!(f, "{}j", crate::unparse::imaginary_repr(imag))
            }
            Number::Complex { real, imag } => write!(
                f,
                "({} + {}j)",
                crate::unparse::float_repr(real),
                crate::unparse::imaginary_repr(imag)
            ),
        }
    }
}

/// Declaration kind tag, as it appears in serialized output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Assign,
    AnnAssign,
    Function,
    Class,
    Attribute,
    Decorator,
    Unknown,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Assign => "ASSIGN",
            DeclarationKind::AnnAssign => "ANNASSIGN",
            DeclarationKind::Function => "FUNCTION",
            DeclarationKind::Class => "CLASS",
            DeclarationKind::Attribute => "ATTRIBUTE",
            DeclarationKind::Decorator => "DECORATOR",
            DeclarationKind::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized statement-level construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(tag = "kind")]
pub enum Declaration {
    #[serde(rename = "ASSIGN")]
    Assign(Assignment),
    #[serde(rename = "ANNASSIGN")]
    AnnAssign(AnnotatedAssignment),
    #[serde(rename = "FUNCTION")]
    Function(FunctionDeclaration),
    #[serde(rename = "CLASS")]
    Class(ClassDeclaration),
    #[serde(rename = "ATTRIBUTE")]
    Attribute(AttributeAccess),
    #[serde(rename = "DECORATOR")]
    Decorator(DecoratorCall),
    #[serde(rename = "UNKNOWN")]
    Unknown(UnknownNode),
}

impl Declaration {
    pub fn kind(&self) -> DeclarationKind {
        match self {
            Declaration::Assign(_) => DeclarationKind::Assign,
            Declaration::AnnAssign(_) => DeclarationKind::AnnAssign,
            Declaration::Function(_) => DeclarationKind::Function,
            Declaration::Class(_) => DeclarationKind::Class,
            Declaration::Attribute(_) => DeclarationKind::Attribute,
            Declaration::Decorator(_) => DeclarationKind::Decorator,
            Declaration::Unknown(_) => DeclarationKind::Unknown,
        }
    }

    /// Target names, the declared name, or the base object; empty for UNKNOWN.
    pub fn names(&self) -> &[String] {
        match self {
            Declaration::Assign(d) => &d.names,
            Declaration::AnnAssign(d) => &d.names,
            Declaration::Function(d) => &d.names,
            Declaration::Class(d) => &d.names,
            Declaration::Attribute(d) => &d.names,
            Declaration::Decorator(d) => &d.names,
            Declaration::Unknown(_) => &[],
        }
    }

    pub fn value(&self) -> Option<&LiteralValue> {
        match self {
            Declaration::Assign(d) => Some(&d.value),
            Declaration::AnnAssign(d) => d.value.as_ref(),
            _ => None,
        }
    }

    /// Nested declarations; present only for functions and classes.
    pub fn body(&self) -> Option<&[Declaration]> {
        match self {
            Declaration::Function(d) => Some(&d.body),
            Declaration::Class(d) => Some(&d.body),
            _ => None,
        }
    }

    pub fn decorators(&self) -> &[Declaration] {
        match self {
            Declaration::Function(d) => &d.decorators,
            Declaration::Class(d) => &d.decorators,
            _ => &[],
        }
    }

    pub fn doc(&self) -> Option<&str> {
        match self {
            Declaration::Function(d) => d.doc.as_deref(),
            Declaration::Class(d) => d.doc.as_deref(),
            _ => None,
        }
    }
}

/// `a = b = value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct Assignment {
    pub names: Vec<String>,
    pub value: LiteralValue,
}

/// `name: annotation = value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct AnnotatedAssignment {
    pub names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<LiteralValue>,
    /// Base name of a subscripted annotation (`List` for `List[int]`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotated_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<LiteralValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct FunctionDeclaration {
    pub names: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_async: bool,
    pub arguments: Signature,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<LiteralValue>,
    pub body: Vec<Declaration>,
    pub decorators: Vec<Declaration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ClassDeclaration {
    pub names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<LiteralValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<KeywordArgument>,
    pub body: Vec<Declaration>,
    pub decorators: Vec<Declaration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// `base.attribute`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct AttributeAccess {
    pub names: Vec<String>,
    pub attribute: String,
}

/// `@name` or `@dotted.name(args)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct DecoratorCall {
    pub names: Vec<String>,
    pub called: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<LiteralValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<KeywordArgument>,
}

/// `name=value`; `name` is absent for `**value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct KeywordArgument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: LiteralValue,
}

/// A construct with no dedicated rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct UnknownNode {
    /// Host syntax kind, e.g. `If` or `Expr`.
    pub node_kind: String,
    pub raw: String,
}

/// A function's normalized parameter list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct Signature {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positional_only: Vec<Parameter>,
    pub positional: Vec<Parameter>,
    /// Zero or one `*args` parameter.
    pub variadic: Vec<Parameter>,
    pub keyword_only: Vec<Parameter>,
    /// Zero or one `**kwargs` parameter.
    pub keyword_variadic: Vec<Parameter>,
    /// Source text of each positional default, in order.
    pub defaults: Vec<String>,
    /// Source text of the keyword-only default list, `None` marking a
    /// parameter without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_defaults: Option<String>,
}

impl Signature {
    /// All parameters in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.positional_only
            .iter()
            .chain(&self.positional)
            .chain(&self.variadic)
            .chain(&self.keyword_only)
            .chain(&self.keyword_variadic)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct Parameter {
    pub role: ParameterRole,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<LiteralValue>,
    /// Source text of this parameter's default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub enum ParameterRole {
    #[serde(rename = "POSONLYARG")]
    PositionalOnly,
    #[serde(rename = "ARG")]
    Positional,
    #[serde(rename = "VARARG")]
    Variadic,
    #[serde(rename = "KWONLYARG")]
    KeywordOnly,
    #[serde(rename = "KWARG")]
    KeywordVariadic,
}

impl ParameterRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterRole::PositionalOnly => "POSONLYARG",
            ParameterRole::Positional => "ARG",
            ParameterRole::Variadic => "VARARG",
            ParameterRole::KeywordOnly => "KWONLYARG",
            ParameterRole::KeywordVariadic => "KWARG",
        }
    }
}

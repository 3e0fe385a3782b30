//! Signature extraction: parameter list to [`Signature`].

use crate::ast::{Arg, Arguments, Expr};
use crate::ir::{LiteralValue, Parameter, ParameterRole, Signature};
use crate::literal;
use crate::unparse::unparse_expr;

/// Which annotations produce a `declared_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnnotationMode {
    /// Every annotation is resolved.
    #[default]
    Uniform,
    /// Only subscripted annotations (`List[int]`) are resolved; bare ones
    /// (`int`, `typing.Any`) leave the declared type absent.
    SubscriptedOnly,
}

impl AnnotationMode {
    /// Resolve `annotation` if this mode admits it.
    pub fn declared_type(self, annotation: &Expr) -> Option<LiteralValue> {
        match (self, annotation) {
            (AnnotationMode::Uniform, _) | (AnnotationMode::SubscriptedOnly, Expr::Subscript { .. }) => {
                Some(literal::resolve(annotation))
            }
            (AnnotationMode::SubscriptedOnly, _) => None,
        }
    }
}

/// Extract a signature, resolving every annotation.
pub fn extract(args: &Arguments) -> Signature {
    extract_with(args, AnnotationMode::Uniform)
}

/// Extract a signature with an explicit annotation policy.
pub fn extract_with(args: &Arguments, mode: AnnotationMode) -> Signature {
    let positional_count = args.posonlyargs.len() + args.args.len();
    // Defaults belong to the trailing positional parameters.
    let first_defaulted = positional_count.saturating_sub(args.defaults.len());
    let default_for = |index: usize| {
        index
            .checked_sub(first_defaulted)
            .and_then(|offset| args.defaults.get(offset))
            .map(unparse_expr)
    };

    let positional_only = args
        .posonlyargs
        .iter()
        .enumerate()
        .map(|(i, arg)| parameter(arg, ParameterRole::PositionalOnly, default_for(i), mode))
        .collect();
    let positional = args
        .args
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            let index = args.posonlyargs.len() + i;
            parameter(arg, ParameterRole::Positional, default_for(index), mode)
        })
        .collect();
    let keyword_only = args
        .kwonlyargs
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            let default = args.kw_defaults.get(i).and_then(Option::as_ref).map(unparse_expr);
            parameter(arg, ParameterRole::KeywordOnly, default, mode)
        })
        .collect();

    Signature {
        positional_only,
        positional,
        variadic: args
            .vararg
            .iter()
            .map(|arg| parameter(arg, ParameterRole::Variadic, None, mode))
            .collect(),
        keyword_only,
        keyword_variadic: args
            .kwarg
            .iter()
            .map(|arg| parameter(arg, ParameterRole::KeywordVariadic, None, mode))
            .collect(),
        defaults: args.defaults.iter().map(unparse_expr).collect(),
        keyword_defaults: keyword_defaults(args),
    }
}

fn parameter(arg: &Arg, role: ParameterRole, default: Option<String>, mode: AnnotationMode) -> Parameter {
    Parameter {
        role,
        name: arg.name.clone(),
        declared_type: arg.annotation.as_ref().and_then(|a| mode.declared_type(a)),
        default,
    }
}

/// `[d1, None, d3]`, one slot per keyword-only parameter.
fn keyword_defaults(args: &Arguments) -> Option<String> {
    if args.kwonlyargs.is_empty() {
        return None;
    }
    let slots: Vec<String> = (0..args.kwonlyargs.len())
        .map(|i| match args.kw_defaults.get(i) {
            Some(Some(default)) => unparse_expr(default),
            _ => "None".to_string(),
        })
        .collect();
    Some(format!("[{}]", slots.join(", ")))
}

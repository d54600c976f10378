//! Built-in implementations of the XPath 1.0 core function library, plus the
//! schema-independent functions YANG adds to it.

use crate::axes::collect_descendant_nodes;
use crate::context::{EvaluationContext, XPathValue, string_to_number};
use crate::datasource::{DataSourceNode, NodeType};
use crate::error::XPathError;
use regex::Regex;
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// YANG functions that need schema information this engine does not have.
const SCHEMA_FUNCTIONS: &[&str] = &[
    "deref",
    "derived-from",
    "derived-from-or-self",
    "enum-value",
    "bit-is-set",
];

/// Dispatches a function call to the correct implementation.
pub fn evaluate_function<'a, 'd, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    match name {
        // Node-set
        "last" => {
            expect_args(name, &args, 0..=0)?;
            Ok(XPathValue::Number(e_ctx.context_size as f64))
        }
        "position" => {
            expect_args(name, &args, 0..=0)?;
            Ok(XPathValue::Number(e_ctx.context_position as f64))
        }
        "count" => func_count(args),
        "id" => func_id(args, e_ctx),
        "local-name" | "namespace-uri" | "name" => func_node_name(name, args, e_ctx),

        // String
        "string" => {
            expect_args(name, &args, 0..=1)?;
            Ok(XPathValue::String(string_arg_or_context(args, e_ctx)))
        }
        "concat" => {
            expect_args(name, &args, 2..=usize::MAX)?;
            Ok(XPathValue::String(args.iter().map(|v| v.to_string()).collect()))
        }
        "starts-with" => {
            let (s1, s2) = two_strings(name, args)?;
            Ok(XPathValue::Boolean(s1.starts_with(&s2)))
        }
        "contains" => {
            let (s1, s2) = two_strings(name, args)?;
            Ok(XPathValue::Boolean(s1.contains(&s2)))
        }
        "substring-before" => {
            let (s1, s2) = two_strings(name, args)?;
            let before = s1.find(&s2).map(|index| &s1[..index]).unwrap_or("");
            Ok(XPathValue::String(before.to_string()))
        }
        "substring-after" => {
            let (s1, s2) = two_strings(name, args)?;
            let after = s1.find(&s2).map(|index| &s1[index + s2.len()..]).unwrap_or("");
            Ok(XPathValue::String(after.to_string()))
        }
        "substring" => func_substring(args),
        "string-length" => {
            expect_args(name, &args, 0..=1)?;
            let s = string_arg_or_context(args, e_ctx);
            Ok(XPathValue::Number(s.chars().count() as f64))
        }
        "normalize-space" => {
            expect_args(name, &args, 0..=1)?;
            let s = string_arg_or_context(args, e_ctx);
            Ok(XPathValue::String(s.split_whitespace().collect::<Vec<_>>().join(" ")))
        }
        "translate" => func_translate(args),

        // Boolean
        "boolean" => {
            expect_args(name, &args, 1..=1)?;
            Ok(XPathValue::Boolean(args[0].to_bool()))
        }
        "not" => {
            expect_args(name, &args, 1..=1)?;
            Ok(XPathValue::Boolean(!args[0].to_bool()))
        }
        "true" | "false" => {
            expect_args(name, &args, 0..=0)?;
            Ok(XPathValue::Boolean(name == "true"))
        }
        "lang" => func_lang(args, e_ctx),

        // Number
        "number" => {
            expect_args(name, &args, 0..=1)?;
            let n = match args.first() {
                Some(arg) => arg.to_number(),
                None => string_to_number(&e_ctx.context_node.string_value()),
            };
            Ok(XPathValue::Number(n))
        }
        "sum" => func_sum(args),
        "floor" => {
            expect_args(name, &args, 1..=1)?;
            Ok(XPathValue::Number(args[0].to_number().floor()))
        }
        "ceiling" => {
            expect_args(name, &args, 1..=1)?;
            Ok(XPathValue::Number(args[0].to_number().ceil()))
        }
        "round" => {
            expect_args(name, &args, 1..=1)?;
            Ok(XPathValue::Number(xpath_round(args[0].to_number())))
        }

        // YANG
        "current" => {
            expect_args(name, &args, 0..=0)?;
            Ok(XPathValue::NodeSet(vec![e_ctx.initial_node]))
        }
        "re-match" => func_re_match(args),
        _ if SCHEMA_FUNCTIONS.contains(&name) => Err(XPathError::Unsupported(format!(
            "{}() requires YANG schema information",
            name
        ))),

        _ => Err(XPathError::FunctionError {
            function: name.to_string(),
            message: "Unknown XPath function".to_string(),
        }),
    }
}

fn expect_args<N>(
    function: &str,
    args: &[XPathValue<N>],
    arity: RangeInclusive<usize>,
) -> Result<(), XPathError> {
    if arity.contains(&args.len()) {
        return Ok(());
    }
    let expected = if arity.end() == &usize::MAX {
        format!("at least {}", arity.start())
    } else if arity.start() == arity.end() {
        arity.start().to_string()
    } else {
        format!("{} or {}", arity.start(), arity.end())
    };
    Err(XPathError::FunctionError {
        function: function.to_string(),
        message: format!("Expected {} arguments, got {}", expected, args.len()),
    })
}

fn string_arg_or_context<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> String {
    match args.first() {
        Some(arg) => arg.to_string(),
        None => e_ctx.context_node.string_value(),
    }
}

fn two_strings<'a, N: DataSourceNode<'a>>(
    function: &str,
    args: Vec<XPathValue<N>>,
) -> Result<(String, String), XPathError> {
    expect_args(function, &args, 2..=2)?;
    Ok((args[0].to_string(), args[1].to_string()))
}

/// XPath `round()`: halves go towards positive infinity, and values in [-0.5, 0) round
/// to negative zero.
fn xpath_round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() || n == 0.0 {
        n
    } else if (-0.5..0.0).contains(&n) {
        -0.0
    } else {
        (n + 0.5).floor()
    }
}

// --- Node-Set Functions ---

fn func_count<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    expect_args("count", &args, 1..=1)?;
    let nodes = args.remove(0).into_node_set("count() argument")?;
    Ok(XPathValue::Number(nodes.len() as f64))
}

fn func_id<'a, 'd, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    expect_args("id", &args, 1..=1)?;

    let id_string = match args.remove(0) {
        XPathValue::NodeSet(nodes) => nodes
            .iter()
            .map(|n| n.string_value())
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    };
    let ids_to_find: HashSet<&str> = id_string.split_whitespace().collect();
    if ids_to_find.is_empty() {
        return Ok(XPathValue::NodeSet(vec![]));
    }

    let mut descendants = Vec::new();
    collect_descendant_nodes(e_ctx.root_node, &mut descendants);
    let results = descendants
        .into_iter()
        .filter(|node| node.node_type() == NodeType::Element)
        .filter(|node| {
            node.attributes().any(|attr| {
                attr.name().is_some_and(|q| {
                    (q.prefix == Some("xml") || q.prefix.is_none()) && q.local_part == "id"
                }) && ids_to_find.contains(attr.string_value().as_str())
            })
        })
        .collect();
    Ok(XPathValue::NodeSet(results))
}

fn func_node_name<'a, 'd, N: DataSourceNode<'a>>(
    function: &str,
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    expect_args(function, &args, 0..=1)?;
    let node = if args.is_empty() {
        Some(e_ctx.context_node)
    } else {
        let what = format!("{}() argument", function);
        args.remove(0).into_node_set(&what)?.into_iter().min()
    };
    let Some(node) = node else {
        return Ok(XPathValue::String(String::new()));
    };

    let value = match function {
        "local-name" => node.name().map(|q| q.local_part.to_string()),
        "namespace-uri" => match node.node_type() {
            NodeType::Element | NodeType::Attribute => node.namespace_uri().map(str::to_string),
            _ => None,
        },
        _ => node.name().map(|q| q.to_string()),
    };
    Ok(XPathValue::String(value.unwrap_or_default()))
}

// --- String Functions ---

fn func_substring<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    expect_args("substring", &args, 2..=3)?;
    let s = args[0].to_string();
    let first = xpath_round(args[1].to_number());
    // NaN bounds select nothing, since every comparison with NaN is false.
    let last = match args.get(2) {
        Some(length) => first + xpath_round(length.to_number()),
        None => f64::INFINITY,
    };

    let result = s
        .chars()
        .enumerate()
        .filter(|(i, _)| {
            let pos = (i + 1) as f64; // XPath positions are 1-based
            pos >= first && pos < last
        })
        .map(|(_, c)| c)
        .collect::<String>();
    Ok(XPathValue::String(result))
}

fn func_translate<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    expect_args("translate", &args, 3..=3)?;
    let source = args[0].to_string();
    let from: Vec<char> = args[1].to_string().chars().collect();
    let to: Vec<char> = args[2].to_string().chars().collect();
    let result = source
        .chars()
        .filter_map(|c| match from.iter().position(|&fc| fc == c) {
            Some(pos) => to.get(pos).copied(),
            None => Some(c),
        })
        .collect::<String>();
    Ok(XPathValue::String(result))
}

// --- Boolean Functions ---

fn func_lang<'a, 'd, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    expect_args("lang", &args, 1..=1)?;
    let wanted = args[0].to_string().to_lowercase();

    let mut current = Some(e_ctx.context_node);
    while let Some(node) = current {
        let declared = node.attributes().find(|attr| {
            attr.name()
                .is_some_and(|q| q.prefix == Some("xml") && q.local_part == "lang")
        });
        if let Some(attr) = declared {
            // The nearest xml:lang decides; "en" also matches "en-GB".
            let lang = attr.string_value().to_lowercase();
            let matches = lang == wanted || lang.starts_with(&format!("{}-", wanted));
            return Ok(XPathValue::Boolean(matches));
        }
        current = node.parent();
    }
    Ok(XPathValue::Boolean(false))
}

// --- Number Functions ---

fn func_sum<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    expect_args("sum", &args, 1..=1)?;
    let nodes = args.remove(0).into_node_set("sum() argument")?;
    let sum = nodes
        .iter()
        .map(|node| string_to_number(&node.string_value()))
        .sum();
    Ok(XPathValue::Number(sum))
}

// --- YANG Functions ---

/// `re-match(subject, pattern)`: true if the whole subject matches the pattern.
fn func_re_match<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    expect_args("re-match", &args, 2..=2)?;
    let subject = args[0].to_string();
    let pattern = args[1].to_string();
    let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| XPathError::FunctionError {
        function: "re-match".to_string(),
        message: format!("Invalid pattern '{}': {}", pattern, e),
    })?;
    Ok(XPathValue::Boolean(regex.is_match(&subject)))
}

//! Compiler: raw rule description → [`Ruleset`]
//!
//! Rule descriptions are nested JSON-shaped values (parsed from JSON or YAML
//! by the host). The compiler resolves every node once into [`Predicate`] /
//! [`ValueMatcher`] sum types, compiles every regex, and rejects any shape it
//! does not recognize. An unrecognized shape never compiles to "always true"
//! or "always false".
//!
//! # Rule language
//!
//! ```text
//! leaf:        { attr: <name> | header: <name>, is: <literal> }
//!              { attr: <name> | header: <name>, matches: <regex>, caseInsensitive?: bool }
//!              { attr: <name> | header: <name>, <op>: <number> }      op ∈ > < >= <= == !=
//! combinator:  { AND: [<node>, ...] } | { OR: [<node>, ...] } | { UNLESS: <node> }
//! ruleset:     [<node>, ...]      top-level nodes may also carry `name: <string>`
//! ```

use crate::{
    CompareMatcher, CompareOp, CompileError, CompileErrorKind, CompileOptions, CompileWarning,
    EqualsMatcher, Field, NodePath, Predicate, RegexMatcher, Rule, Ruleset, SinglePredicate,
    ValueMatcher, WarningKind,
};
use serde_json::{Map, Value};

/// Every key the rule language recognizes, used for "did you mean" hints.
const KNOWN_KEYS: &[&str] = &[
    "AND",
    "OR",
    "UNLESS",
    "attr",
    "header",
    "is",
    "matches",
    "caseInsensitive",
    "name",
];

/// The result of a successful compilation.
#[derive(Debug, Clone)]
pub struct Compiled {
    /// The executable ruleset.
    pub ruleset: Ruleset,
    /// Suspicious but legal constructs (empty `AND`/`OR`).
    pub warnings: Vec<CompileWarning>,
}

/// Compiles raw rule descriptions into a [`Ruleset`].
///
/// Compilation is a pure transformation: the same input always yields the
/// same ruleset or the same error. The only side effects are `tracing`
/// events.
///
/// # Example
///
/// ```
/// use reqban::{CompileOptions, Compiler};
/// use serde_json::json;
///
/// let compiler = Compiler::new(CompileOptions::default().strict());
/// let err = compiler.compile(&json!([{ "AND": [] }])).unwrap_err();
/// assert_eq!(err.path.to_string(), "[0].AND");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    /// Create a compiler with the given options.
    #[must_use]
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// The options this compiler applies.
    #[must_use]
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile a rule description.
    ///
    /// # Errors
    ///
    /// Returns the first [`CompileError`] found, with the path of the
    /// offending node. Nothing is returned for a partially valid ruleset.
    pub fn compile(&self, raw: &Value) -> Result<Compiled, CompileError> {
        let root = NodePath::root();
        let Value::Array(items) = raw else {
            return Err(CompileError::new(
                root,
                CompileErrorKind::ExpectedList {
                    found: json_type(raw),
                },
            ));
        };
        if items.len() > self.options.max_rules {
            return Err(CompileError::new(
                root,
                CompileErrorKind::TooManyRules {
                    count: items.len(),
                    max: self.options.max_rules,
                },
            ));
        }

        let mut walk = Walk {
            options: &self.options,
            warnings: Vec::new(),
        };
        let mut rules = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let path = NodePath::rule(index);
            let obj = expect_object(item, &path)?;
            let name = rule_name(obj, &path)?;
            let predicate = walk.node(obj, &path, 1, true)?;
            rules.push(Rule::new(index, name, predicate));
        }

        tracing::debug!(
            rules = rules.len(),
            warnings = walk.warnings.len(),
            "compiled ruleset"
        );
        Ok(Compiled {
            ruleset: Ruleset::new(rules),
            warnings: walk.warnings,
        })
    }

    /// Parse JSON text and compile it.
    ///
    /// # Errors
    ///
    /// Returns [`CompileErrorKind::Parse`] for malformed JSON, otherwise as
    /// [`compile`](Self::compile).
    pub fn compile_str(&self, json: &str) -> Result<Compiled, CompileError> {
        let raw: Value = serde_json::from_str(json).map_err(|e| parse_error(&e))?;
        self.compile(&raw)
    }

    /// Parse YAML text and compile it.
    ///
    /// # Errors
    ///
    /// Returns [`CompileErrorKind::Parse`] for malformed YAML, otherwise as
    /// [`compile`](Self::compile).
    #[cfg(feature = "yaml")]
    pub fn compile_yaml(&self, yaml: &str) -> Result<Compiled, CompileError> {
        let raw: Value = serde_yaml::from_str(yaml).map_err(|e| parse_error(&e))?;
        self.compile(&raw)
    }
}

/// Compile a rule description with default options.
///
/// # Errors
///
/// See [`Compiler::compile`].
pub fn compile(raw: &Value) -> Result<Compiled, CompileError> {
    Compiler::default().compile(raw)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tree walk
// ═══════════════════════════════════════════════════════════════════════════════

struct Walk<'o> {
    options: &'o CompileOptions,
    warnings: Vec<CompileWarning>,
}

/// The keys of one rule object, sorted into roles.
#[derive(Default)]
struct Keys<'v> {
    combinator: Option<(&'v str, &'v Value)>,
    field: Option<(&'v str, &'v Value)>,
    condition: Option<(&'v str, &'v Value)>,
    case_insensitive: Option<&'v Value>,
}

impl<'v> Keys<'v> {
    fn classify(
        obj: &'v Map<String, Value>,
        path: &NodePath,
        top_level: bool,
    ) -> Result<Self, CompileError> {
        let mut keys = Keys::default();
        for (key, value) in obj {
            let slot = match key.as_str() {
                "AND" | "OR" | "UNLESS" => &mut keys.combinator,
                "attr" | "header" => &mut keys.field,
                "is" | "matches" => &mut keys.condition,
                "caseInsensitive" => {
                    keys.case_insensitive = Some(value);
                    continue;
                }
                "name" if top_level => continue,
                k if CompareOp::from_symbol(k).is_some() => &mut keys.condition,
                k if is_operator_like(k) => {
                    return Err(CompileError::new(
                        path.key(k),
                        CompileErrorKind::UnknownOperator { op: k.to_owned() },
                    ));
                }
                k => {
                    return Err(CompileError::new(
                        path.key(k),
                        CompileErrorKind::UnknownKey {
                            key: k.to_owned(),
                            hint: hint_for(k),
                        },
                    ));
                }
            };
            if let Some((first, _)) = *slot {
                return Err(conflict(path, first, key));
            }
            *slot = Some((key.as_str(), value));
        }
        Ok(keys)
    }
}

impl Walk<'_> {
    fn node(
        &mut self,
        obj: &Map<String, Value>,
        path: &NodePath,
        depth: usize,
        top_level: bool,
    ) -> Result<Predicate, CompileError> {
        if depth > self.options.max_depth {
            return Err(CompileError::new(
                path.clone(),
                CompileErrorKind::DepthExceeded {
                    depth,
                    max: self.options.max_depth,
                },
            ));
        }

        let keys = Keys::classify(obj, path, top_level)?;
        match keys.combinator {
            Some((kind, value)) => {
                if let Some((other, _)) = keys.field.or(keys.condition) {
                    return Err(conflict(path, kind, other));
                }
                if keys.case_insensitive.is_some() {
                    return Err(conflict(path, kind, "caseInsensitive"));
                }
                self.combinator(kind, value, &path.key(kind), depth)
            }
            None => self.leaf(&keys, path),
        }
    }

    fn combinator(
        &mut self,
        kind: &str,
        value: &Value,
        path: &NodePath,
        depth: usize,
    ) -> Result<Predicate, CompileError> {
        match kind {
            "UNLESS" => {
                let child = match value {
                    Value::Object(obj) => self.node(obj, path, depth + 1, false)?,
                    Value::Array(items) if items.len() == 1 => {
                        let child_path = path.index(0);
                        let obj = expect_object(&items[0], &child_path)?;
                        self.node(obj, &child_path, depth + 1, false)?
                    }
                    Value::Array(items) => {
                        return Err(CompileError::new(
                            path.clone(),
                            CompileErrorKind::UnlessArity { count: items.len() },
                        ));
                    }
                    other => {
                        return Err(CompileError::new(
                            path.clone(),
                            CompileErrorKind::ExpectedObject {
                                found: json_type(other),
                            },
                        ));
                    }
                };
                Ok(Predicate::unless(child))
            }
            "AND" => {
                let children = self.children(value, path, depth)?;
                if children.is_empty() {
                    self.warn(path, WarningKind::EmptyAnd)?;
                }
                Ok(Predicate::And(children))
            }
            _ => {
                let children = self.children(value, path, depth)?;
                if children.is_empty() {
                    self.warn(path, WarningKind::EmptyOr)?;
                }
                Ok(Predicate::Or(children))
            }
        }
    }

    fn children(
        &mut self,
        value: &Value,
        path: &NodePath,
        depth: usize,
    ) -> Result<Vec<Predicate>, CompileError> {
        let Value::Array(items) = value else {
            return Err(CompileError::new(
                path.clone(),
                CompileErrorKind::ExpectedList {
                    found: json_type(value),
                },
            ));
        };
        if items.len() > self.options.max_children {
            return Err(CompileError::new(
                path.clone(),
                CompileErrorKind::TooManyChildren {
                    count: items.len(),
                    max: self.options.max_children,
                },
            ));
        }
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let child_path = path.index(i);
                let obj = expect_object(item, &child_path)?;
                self.node(obj, &child_path, depth + 1, false)
            })
            .collect()
    }

    fn leaf(&self, keys: &Keys<'_>, path: &NodePath) -> Result<Predicate, CompileError> {
        let Some((field_key, field_value)) = keys.field else {
            return Err(CompileError::new(
                path.clone(),
                CompileErrorKind::MissingField,
            ));
        };
        let name = match field_value {
            Value::String(s) if !s.is_empty() => s.as_str(),
            other => {
                return Err(invalid(
                    path,
                    field_key,
                    "a non-empty string",
                    describe(other),
                ))
            }
        };
        let field = if field_key == "attr" {
            Field::attr(name)
        } else {
            Field::header(name)
        };

        let Some((cond_key, cond_value)) = keys.condition else {
            return Err(CompileError::new(
                path.clone(),
                CompileErrorKind::MissingCondition,
            ));
        };

        let case_insensitive = match keys.case_insensitive {
            None => false,
            Some(_) if cond_key != "matches" => {
                return Err(conflict(path, cond_key, "caseInsensitive"));
            }
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                return Err(invalid(
                    path,
                    "caseInsensitive",
                    "a boolean",
                    describe(other),
                ))
            }
        };

        let matcher = match cond_key {
            "is" => self.literal(cond_value, path)?,
            "matches" => self.pattern(cond_value, case_insensitive, path)?,
            op => threshold(op, cond_value, path)?,
        };
        Ok(Predicate::Single(SinglePredicate::new(
            field,
            matcher,
            path.clone(),
        )))
    }

    fn literal(&self, value: &Value, path: &NodePath) -> Result<ValueMatcher, CompileError> {
        let matcher = match value {
            Value::String(s) => {
                if s.len() > self.options.max_literal_len {
                    return Err(CompileError::new(
                        path.key("is"),
                        CompileErrorKind::PatternTooLong {
                            len: s.len(),
                            max: self.options.max_literal_len,
                        },
                    ));
                }
                EqualsMatcher::new(s.as_str())
            }
            Value::Number(n) => match n.as_f64() {
                Some(f) => EqualsMatcher::number(f),
                None => return Err(invalid(path, "is", "a finite number", n.to_string())),
            },
            Value::Bool(b) => EqualsMatcher::new(b.to_string()),
            other => {
                return Err(invalid(
                    path,
                    "is",
                    "a string, number or boolean",
                    describe(other),
                ))
            }
        };
        Ok(matcher.into())
    }

    fn pattern(
        &self,
        value: &Value,
        case_insensitive: bool,
        path: &NodePath,
    ) -> Result<ValueMatcher, CompileError> {
        let Value::String(pattern) = value else {
            return Err(invalid(
                path,
                "matches",
                "a regular expression string",
                describe(value),
            ));
        };
        if pattern.len() > self.options.max_pattern_len {
            return Err(CompileError::new(
                path.key("matches"),
                CompileErrorKind::PatternTooLong {
                    len: pattern.len(),
                    max: self.options.max_pattern_len,
                },
            ));
        }
        RegexMatcher::with_size_limit(pattern, case_insensitive, self.options.regex_size_limit)
            .map(ValueMatcher::from)
            .map_err(|e| {
                CompileError::new(
                    path.key("matches"),
                    CompileErrorKind::InvalidRegex {
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    },
                )
            })
    }

    fn warn(&mut self, path: &NodePath, kind: WarningKind) -> Result<(), CompileError> {
        if self.options.strict {
            return Err(CompileError::new(
                path.clone(),
                CompileErrorKind::Strict(kind),
            ));
        }
        tracing::warn!(path = %path, "{kind}");
        self.warnings.push(CompileWarning {
            path: path.clone(),
            kind,
        });
        Ok(())
    }
}

fn threshold(op: &str, value: &Value, path: &NodePath) -> Result<ValueMatcher, CompileError> {
    let op_kind = CompareOp::from_symbol(op).ok_or_else(|| {
        CompileError::new(
            path.key(op),
            CompileErrorKind::UnknownOperator { op: op.to_owned() },
        )
    })?;
    match value.as_f64() {
        Some(n) if value.is_number() => Ok(CompareMatcher::new(op_kind, n).into()),
        _ => Err(invalid(path, op, "a number", describe(value))),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════════

fn expect_object<'v>(
    value: &'v Value,
    path: &NodePath,
) -> Result<&'v Map<String, Value>, CompileError> {
    value.as_object().ok_or_else(|| {
        CompileError::new(
            path.clone(),
            CompileErrorKind::ExpectedObject {
                found: json_type(value),
            },
        )
    })
}

fn rule_name(obj: &Map<String, Value>, path: &NodePath) -> Result<Option<String>, CompileError> {
    match obj.get("name") {
        None => Ok(None),
        Some(Value::String(s)) if !s.is_empty() => Ok(Some(s.clone())),
        Some(other) => Err(invalid(path, "name", "a non-empty string", describe(other))),
    }
}

fn conflict(path: &NodePath, first: &str, second: &str) -> CompileError {
    CompileError::new(
        path.clone(),
        CompileErrorKind::ConflictingKeys {
            first: first.to_owned(),
            second: second.to_owned(),
        },
    )
}

fn invalid(path: &NodePath, key: &str, expected: &'static str, found: String) -> CompileError {
    CompileError::new(
        path.key(key),
        CompileErrorKind::InvalidValue {
            key: key.to_owned(),
            expected,
            found,
        },
    )
}

fn parse_error(e: &dyn std::fmt::Display) -> CompileError {
    CompileError::new(
        NodePath::root(),
        CompileErrorKind::Parse {
            message: e.to_string(),
        },
    )
}

fn is_operator_like(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| matches!(c, '<' | '>' | '=' | '!'))
}

fn hint_for(key: &str) -> Option<String> {
    let alias = match key {
        "NOT" | "not" | "unless" => Some("UNLESS"),
        "ignoreCase" | "case_insensitive" | "caseinsensitive" | "i" => Some("caseInsensitive"),
        "regex" | "match" | "pattern" => Some("matches"),
        "equals" | "eq" | "value" => Some("is"),
        "attribute" => Some("attr"),
        _ => None,
    };
    alias
        .or_else(|| {
            KNOWN_KEYS
                .iter()
                .copied()
                .find(|known| known.eq_ignore_ascii_case(key))
        })
        .map(str::to_owned)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) if s.is_empty() => "an empty string".to_owned(),
        Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            format!("{} {value}", json_type(value))
        }
        other => json_type(other).to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RequestSnapshot;
    use serde_json::json;

    fn compile_ok(raw: &Value) -> Compiled {
        compile(raw).unwrap_or_else(|e| panic!("expected {raw} to compile: {e}"))
    }

    fn compile_err(raw: &Value) -> CompileError {
        match compile(raw) {
            Ok(_) => panic!("expected {raw} to be rejected"),
            Err(e) => e,
        }
    }

    #[test]
    fn compiles_every_leaf_shape() {
        let compiled = compile_ok(&json!([
            { "attr": "path", "is": "/admin/login.php" },
            { "attr": "path", "matches": "^/phpmyadmin", "caseInsensitive": true },
            { "header": "User-Agent", "matches": "ZmEu" },
            { "attr": "port", ">": 80 },
            { "header": "content-length", ">=": 1048576 },
            { "attr": "port", "is": 8080 },
        ]));
        let ruleset = compiled.ruleset;
        assert_eq!(ruleset.len(), 6);
        assert!(compiled.warnings.is_empty());

        match ruleset.rules()[2].predicate() {
            Predicate::Single(p) => {
                assert_eq!(p.field(), &Field::Header("user-agent".into()));
                assert_eq!(p.path().to_string(), "[2]");
            }
            other => panic!("expected leaf, got {other:?}"),
        }
    }

    #[test]
    fn compiles_combinators_with_paths() {
        let compiled = compile_ok(&json!([
            { "AND": [
                { "attr": "port", ">": 80 },
                { "UNLESS": { "attr": "protocol", "matches": "^https:?$", "caseInsensitive": true } }
            ] }
        ]));
        let Predicate::And(children) = compiled.ruleset.rules()[0].predicate() else {
            panic!("expected AND");
        };
        let Predicate::Unless(inner) = &children[1] else {
            panic!("expected UNLESS");
        };
        let Predicate::Single(leaf) = inner.as_ref() else {
            panic!("expected leaf");
        };
        assert_eq!(leaf.path().to_string(), "[0].AND[1].UNLESS");
    }

    #[test]
    fn unless_accepts_single_element_list() {
        let compiled = compile_ok(&json!([{ "UNLESS": [{ "attr": "path", "is": "/" }] }]));
        let req = RequestSnapshot::builder().path("/x").build();
        assert!(compiled.ruleset.evaluate(&req).matched);
    }

    #[test]
    fn unless_with_several_children_is_rejected() {
        let err = compile_err(&json!([{ "UNLESS": [
            { "attr": "path", "is": "/a" },
            { "attr": "path", "is": "/b" }
        ] }]));
        assert_eq!(err.kind, CompileErrorKind::UnlessArity { count: 2 });
        assert_eq!(err.path.to_string(), "[0].UNLESS");

        let err = compile_err(&json!([{ "UNLESS": [] }]));
        assert_eq!(err.kind, CompileErrorKind::UnlessArity { count: 0 });
    }

    #[test]
    fn rule_name_is_recorded() {
        let compiled = compile_ok(&json!([
            { "name": "no-zmeu", "header": "user-agent", "matches": "ZmEu", "caseInsensitive": true }
        ]));
        assert_eq!(compiled.ruleset.rules()[0].name(), Some("no-zmeu"));
        assert_eq!(compiled.ruleset.rules()[0].id(), "no-zmeu");
    }

    #[test]
    fn name_on_nested_node_is_rejected() {
        let err = compile_err(&json!([{ "AND": [{ "name": "x", "attr": "path", "is": "/" }] }]));
        assert!(matches!(err.kind, CompileErrorKind::UnknownKey { .. }));
        assert_eq!(err.path.to_string(), "[0].AND[0].name");
    }

    #[test]
    fn top_level_must_be_a_list() {
        let err = compile_err(&json!({ "attr": "path", "is": "/" }));
        assert_eq!(err.kind, CompileErrorKind::ExpectedList { found: "object" });
        assert!(err.path.is_root());
    }

    #[test]
    fn rule_must_be_an_object() {
        let err = compile_err(&json!([{ "attr": "path", "is": "/" }, "oops"]));
        assert_eq!(err.kind, CompileErrorKind::ExpectedObject { found: "string" });
        assert_eq!(err.path.to_string(), "[1]");
    }

    #[test]
    fn unknown_key_is_rejected_with_hint() {
        let err = compile_err(&json!([{ "and": [] }]));
        assert_eq!(
            err.kind,
            CompileErrorKind::UnknownKey {
                key: "and".into(),
                hint: Some("AND".into())
            }
        );
        assert_eq!(err.to_string(), "at [0].and: unknown key `and` (did you mean `AND`?)");

        let err = compile_err(&json!([{ "attr": "path", "regex": "x" }]));
        assert!(matches!(
            err.kind,
            CompileErrorKind::UnknownKey { hint: Some(ref h), .. } if h == "matches"
        ));
    }

    #[test]
    fn unknown_key_next_to_valid_leaf_is_rejected() {
        let err = compile_err(&json!([{ "attr": "path", "is": "/", "comment": "x" }]));
        assert_eq!(
            err.kind,
            CompileErrorKind::UnknownKey {
                key: "comment".into(),
                hint: None
            }
        );
    }

    #[test]
    fn unknown_operator_is_rejected() {
        for op in ["=>", "=", "<>", "==="] {
            let err = compile_err(&json!([{ "attr": "port", op: 80 }]));
            assert_eq!(
                err.kind,
                CompileErrorKind::UnknownOperator { op: op.into() },
                "{op}"
            );
        }
    }

    #[test]
    fn threshold_must_be_a_number() {
        let err = compile_err(&json!([{ "attr": "port", ">": "80" }]));
        assert!(matches!(err.kind, CompileErrorKind::InvalidValue { .. }));
        assert_eq!(err.path.to_string(), "[0].>");
    }

    #[test]
    fn invalid_regex_is_rejected_with_position() {
        let err = compile_err(&json!([
            { "attr": "path", "is": "/ok" },
            { "AND": [
                { "attr": "host", "matches": "\\.edu$" },
                { "attr": "path", "matches": "(unclosed" }
            ] }
        ]));
        assert!(matches!(err.kind, CompileErrorKind::InvalidRegex { .. }));
        assert_eq!(err.path.to_string(), "[1].AND[1].matches");
        assert_eq!(err.path.rule_index(), Some(1));
    }

    #[test]
    fn backtracking_only_syntax_is_rejected() {
        let err = compile_err(&json!([{ "attr": "path", "matches": "(?=admin)" }]));
        assert!(matches!(err.kind, CompileErrorKind::InvalidRegex { .. }));
    }

    #[test]
    fn pattern_length_is_limited() {
        let compiler = Compiler::new(CompileOptions::default().with_max_pattern_len(4));
        let err = compiler
            .compile(&json!([{ "attr": "path", "matches": "abcde" }]))
            .unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::PatternTooLong { len: 5, max: 4 });
    }

    #[test]
    fn missing_field_and_condition() {
        let err = compile_err(&json!([{ "matches": "x" }]));
        assert_eq!(err.kind, CompileErrorKind::MissingField);

        let err = compile_err(&json!([{ "attr": "path" }]));
        assert_eq!(err.kind, CompileErrorKind::MissingCondition);

        let err = compile_err(&json!([{}]));
        assert_eq!(err.kind, CompileErrorKind::MissingField);
    }

    #[test]
    fn conflicting_keys_are_rejected() {
        let err = compile_err(&json!([{ "attr": "path", "header": "host", "is": "/" }]));
        assert!(matches!(err.kind, CompileErrorKind::ConflictingKeys { .. }));

        let err = compile_err(&json!([{ "attr": "path", "is": "/", "matches": "/" }]));
        assert!(matches!(err.kind, CompileErrorKind::ConflictingKeys { .. }));

        let err = compile_err(&json!([{ "attr": "port", ">": 1, "<": 9 }]));
        assert!(matches!(err.kind, CompileErrorKind::ConflictingKeys { .. }));

        let err = compile_err(&json!([{ "AND": [], "OR": [] }]));
        assert!(matches!(err.kind, CompileErrorKind::ConflictingKeys { .. }));

        let err = compile_err(&json!([{ "AND": [], "attr": "path" }]));
        assert!(matches!(err.kind, CompileErrorKind::ConflictingKeys { .. }));
    }

    #[test]
    fn case_insensitive_only_with_matches() {
        let err = compile_err(&json!([{ "attr": "path", "is": "/", "caseInsensitive": true }]));
        assert_eq!(
            err.kind,
            CompileErrorKind::ConflictingKeys {
                first: "is".into(),
                second: "caseInsensitive".into()
            }
        );

        let err = compile_err(&json!([{ "attr": "path", "matches": "/", "caseInsensitive": "yes" }]));
        assert!(matches!(err.kind, CompileErrorKind::InvalidValue { .. }));
    }

    #[test]
    fn field_name_must_be_non_empty_string() {
        let err = compile_err(&json!([{ "attr": "", "is": "/" }]));
        assert!(matches!(err.kind, CompileErrorKind::InvalidValue { .. }));

        let err = compile_err(&json!([{ "header": 5, "is": "/" }]));
        assert_eq!(err.path.to_string(), "[0].header");
    }

    #[test]
    fn literal_types() {
        let err = compile_err(&json!([{ "attr": "path", "is": null }]));
        assert!(matches!(err.kind, CompileErrorKind::InvalidValue { .. }));

        let err = compile_err(&json!([{ "attr": "path", "is": ["/a"] }]));
        assert!(matches!(err.kind, CompileErrorKind::InvalidValue { .. }));

        compile_ok(&json!([{ "attr": "tls", "is": true }]));
    }

    #[test]
    fn and_or_require_lists() {
        let err = compile_err(&json!([{ "AND": { "attr": "path", "is": "/" } }]));
        assert_eq!(err.kind, CompileErrorKind::ExpectedList { found: "object" });
        assert_eq!(err.path.to_string(), "[0].AND");
    }

    #[test]
    fn empty_and_or_warn() {
        let compiled = compile_ok(&json!([{ "AND": [] }, { "OR": [] }]));
        assert_eq!(
            compiled.warnings,
            vec![
                CompileWarning {
                    path: NodePath::rule(0).key("AND"),
                    kind: WarningKind::EmptyAnd
                },
                CompileWarning {
                    path: NodePath::rule(1).key("OR"),
                    kind: WarningKind::EmptyOr
                },
            ]
        );
        // Empty AND is vacuously true: it bans everything.
        let verdict = compiled.ruleset.evaluate(&RequestSnapshot::default());
        assert_eq!(verdict.rule_index, Some(0));
    }

    #[test]
    fn strict_mode_escalates_warnings() {
        let compiler = Compiler::new(CompileOptions::default().strict());
        let err = compiler
            .compile(&json!([{ "OR": [{ "AND": [] }] }]))
            .unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::Strict(WarningKind::EmptyAnd));
        assert_eq!(err.path.to_string(), "[0].OR[0].AND");
    }

    #[test]
    fn depth_is_limited() {
        let mut node = json!({ "attr": "path", "is": "/" });
        for _ in 0..crate::MAX_DEPTH {
            node = json!({ "UNLESS": node });
        }
        let err = compile_err(&json!([node]));
        assert!(matches!(err.kind, CompileErrorKind::DepthExceeded { .. }));
    }

    #[test]
    fn depth_at_limit_is_accepted() {
        let mut node = json!({ "attr": "path", "is": "/" });
        for _ in 1..crate::MAX_DEPTH {
            node = json!({ "UNLESS": node });
        }
        let compiled = compile_ok(&json!([node]));
        assert_eq!(compiled.ruleset.depth(), crate::MAX_DEPTH);
    }

    #[test]
    fn width_is_limited() {
        let compiler = Compiler::new(CompileOptions::default().with_max_children(2));
        let leaf = json!({ "attr": "path", "is": "/" });
        let err = compiler
            .compile(&json!([{ "OR": [leaf, leaf, leaf] }]))
            .unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::TooManyChildren { count: 3, max: 2 });

        let compiler = Compiler::new(CompileOptions::default().with_max_rules(1));
        let err = compiler.compile(&json!([leaf, leaf])).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::TooManyRules { count: 2, max: 1 });
    }

    #[test]
    fn compile_str_reports_parse_errors() {
        let err = Compiler::default().compile_str("[{").unwrap_err();
        assert!(matches!(err.kind, CompileErrorKind::Parse { .. }));

        let compiled = Compiler::default()
            .compile_str(r#"[{ "attr": "path", "is": "/" }]"#)
            .unwrap();
        assert_eq!(compiled.ruleset.len(), 1);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn compile_yaml_rules() {
        let yaml = r"
- { attr: path, is: /admin/login.php }
- AND:
    - { attr: port, '>': 80 }
    - UNLESS: { attr: protocol, matches: '^https:?$', caseInsensitive: true }
";
        let compiled = Compiler::default().compile_yaml(yaml).unwrap();
        assert_eq!(compiled.ruleset.len(), 2);

        let req = RequestSnapshot::builder().port(8080).protocol("http").build();
        assert_eq!(compiled.ruleset.evaluate(&req).rule_index, Some(1));
    }

    #[test]
    fn hint_suggestions() {
        assert_eq!(hint_for("Or").as_deref(), Some("OR"));
        assert_eq!(hint_for("NOT").as_deref(), Some("UNLESS"));
        assert_eq!(hint_for("ignoreCase").as_deref(), Some("caseInsensitive"));
        assert_eq!(hint_for("HEADER").as_deref(), Some("header"));
        assert_eq!(hint_for("comment"), None);
    }
}

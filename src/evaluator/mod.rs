//! Evaluator for the jsonmap language
//!
//! The evaluator walks a parsed [`Program`] against an input [`Value`] and
//! produces an output [`Value`]. It handles:
//! - Literal, list, and object expressions
//! - Reference resolution through the three scope roles
//! - The `bind`, `map`, and `zip` scope constructs
//!
//! Evaluation is a pure recursive walk; the only state carried along is the
//! output path used to report where an error occurred.

pub mod env;
pub mod value;

use indexmap::IndexMap;

use crate::errors::{JsonMapError, JsonMapResult};
use crate::lexer::token::SourceLocation;
use crate::parser::ast::*;

pub use env::Env;
pub use value::Value;

/// Evaluator for a jsonmap program
pub struct Evaluator {
    /// Source code (for error spans)
    source: String,
    /// Output path of the binding under evaluation (for error reporting)
    path: Vec<String>,
}

impl Evaluator {
    /// Create a new evaluator
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            path: Vec::new(),
        }
    }

    /// Evaluate a program against an input document.
    ///
    /// The result is an object whose entries are, in order, the evaluated
    /// right-hand sides of each top-level binding.
    pub fn evaluate(&mut self, program: &Program, input: &Value) -> JsonMapResult<Value> {
        let env = Env::new(input);

        let mut output = IndexMap::with_capacity(program.bindings.len());
        for binding in &program.bindings {
            self.path.push(binding.name.clone());
            let value = self.eval_expr(&binding.value, env)?;
            self.path.pop();
            output.insert(binding.name.clone(), value);
        }

        Ok(Value::Object(output))
    }

    /// Evaluate a single expression
    fn eval_expr(&mut self, expr: &Expr, env: Env<'_>) -> JsonMapResult<Value> {
        match expr {
            Expr::Null(_) => Ok(Value::Null),
            Expr::Bool(b, _) => Ok(Value::Bool(*b)),
            Expr::Number(n, _) => Ok(Value::Number(*n)),
            Expr::String(s, _) => Ok(Value::String(s.clone())),
            Expr::List(list) => self.eval_list(list, env),
            Expr::Object(obj) => self.eval_object(obj, env),
            Expr::Ref(r) => self.eval_ref(r, env),
            Expr::Map(m) => self.eval_map(m, env),
            Expr::Zip(z) => self.eval_zip(z, env),
            Expr::Bind(b) => self.eval_bind(b, env),
        }
    }

    /// Evaluate a list literal, element by element
    fn eval_list(&mut self, list: &ListExpr, env: Env<'_>) -> JsonMapResult<Value> {
        let mut elements = Vec::with_capacity(list.elements.len());
        for (index, expr) in list.elements.iter().enumerate() {
            self.path.push(index.to_string());
            elements.push(self.eval_expr(expr, env)?);
            self.path.pop();
        }
        Ok(Value::Array(elements))
    }

    /// Evaluate an object literal, preserving declaration order
    fn eval_object(&mut self, obj: &ObjectExpr, env: Env<'_>) -> JsonMapResult<Value> {
        let mut entries = IndexMap::with_capacity(obj.entries.len());
        for binding in &obj.entries {
            self.path.push(binding.name.clone());
            let value = self.eval_expr(&binding.value, env)?;
            self.path.pop();
            entries.insert(binding.name.clone(), value);
        }
        Ok(Value::Object(entries))
    }

    /// Resolve a reference: pick the starting scope, then walk the path
    fn eval_ref(&mut self, r: &RefExpr, env: Env<'_>) -> JsonMapResult<Value> {
        let mut value = match r.root {
            RefRoot::Current => env.current,
            RefRoot::Anonymous => env.anon,
            RefRoot::Global => env.global,
        };
        for step in &r.path {
            value = self.apply_step(value, step, &r.location)?;
        }
        Ok(value.clone())
    }

    /// Apply one path step to a value
    fn apply_step<'v>(
        &self,
        value: &'v Value,
        step: &PathStep,
        location: &SourceLocation,
    ) -> JsonMapResult<&'v Value> {
        match step {
            PathStep::Field(key) => match value {
                Value::Object(obj) => obj.get(key).ok_or_else(|| {
                    JsonMapError::missing_field(
                        self.source.clone(),
                        location,
                        key.clone(),
                        self.path_string(),
                    )
                }),
                other => Err(JsonMapError::type_mismatch(
                    self.source.clone(),
                    location,
                    "object",
                    other.type_name(),
                    self.path_string(),
                    format!("the field '{}' can only be read from an object", key),
                )),
            },
            PathStep::Index(index) => match value {
                Value::Array(items) => {
                    let index = *index as usize;
                    items.get(index).ok_or_else(|| {
                        JsonMapError::out_of_bounds(
                            self.source.clone(),
                            location,
                            index,
                            items.len(),
                            self.path_string(),
                        )
                    })
                }
                other => Err(JsonMapError::type_mismatch(
                    self.source.clone(),
                    location,
                    "list",
                    other.type_name(),
                    self.path_string(),
                    format!("the index {} can only be applied to a list", index),
                )),
            },
        }
    }

    /// Evaluate `map source body`: one output element per source element
    fn eval_map(&mut self, m: &MapExpr, env: Env<'_>) -> JsonMapResult<Value> {
        let items = self.eval_source_list(&m.source, env, "map")?;

        let mut results = Vec::with_capacity(items.len());
        for (index, element) in items.iter().enumerate() {
            self.path.push(index.to_string());
            let value = self.eval_body(&m.body, env.with_element(element))?;
            self.path.pop();
            results.push(value);
        }
        Ok(Value::Array(results))
    }

    /// Evaluate `zip source+ body`: iterate the sources pairwise up to the
    /// shortest one
    fn eval_zip(&mut self, z: &ZipExpr, env: Env<'_>) -> JsonMapResult<Value> {
        let mut columns = Vec::with_capacity(z.sources.len());
        for source in &z.sources {
            columns.push(self.eval_source_list(source, env, "zip")?);
        }

        // The parser guarantees at least one source
        let rows = columns.iter().map(|c| c.len()).min().unwrap_or(0);

        let mut results = Vec::with_capacity(rows);
        for index in 0..rows {
            let tuple: Vec<Value> = columns.iter().map(|c| c[index].clone()).collect();
            let merged = merge_namespaces(&tuple);
            let tuple = Value::Array(tuple);

            self.path.push(index.to_string());
            let value = self.eval_body(&z.body, env.with_tuple(&merged, &tuple))?;
            self.path.pop();
            results.push(value);
        }
        Ok(Value::Array(results))
    }

    /// Evaluate `bind source body`: the body runs once with `current`
    /// narrowed to the source. `anon` and `global` are untouched.
    fn eval_bind(&mut self, b: &BindExpr, env: Env<'_>) -> JsonMapResult<Value> {
        let source = self.eval_expr(&b.source, env)?;
        self.eval_body(&b.body, env.with_current(&source))
    }

    /// Evaluate a `map`/`zip` source, requiring a list
    fn eval_source_list(
        &mut self,
        source: &Expr,
        env: Env<'_>,
        keyword: &str,
    ) -> JsonMapResult<Vec<Value>> {
        match self.eval_expr(source, env)? {
            Value::Array(items) => Ok(items),
            other => Err(JsonMapError::type_mismatch(
                self.source.clone(),
                source.location(),
                "list",
                other.type_name(),
                self.path_string(),
                format!("{} iterates over lists", keyword),
            )),
        }
    }

    /// Evaluate a body once against the given environment
    fn eval_body(&mut self, body: &Body, env: Env<'_>) -> JsonMapResult<Value> {
        match body {
            Body::Object(obj) => self.eval_object(obj, env),
            Body::List(list) => {
                // A single-expression list body is unwrapped, so
                // `map &xs [ &name ]` yields a flat list of names
                if let [expr] = list.elements.as_slice() {
                    self.eval_expr(expr, env)
                } else {
                    self.eval_list(list, env)
                }
            }
        }
    }

    /// The output path of the binding under evaluation, `$.items.0.store` style
    fn path_string(&self) -> String {
        let mut path = String::from("$");
        for segment in &self.path {
            path.push('.');
            path.push_str(segment);
        }
        path
    }
}

/// Merged namespace for one zip tuple: shallow, left to right, later object
/// members win on key collision. Non-object members contribute nothing and
/// stay reachable through `&?.N`.
fn merge_namespaces(tuple: &[Value]) -> Value {
    let mut merged = IndexMap::new();
    for member in tuple {
        if let Value::Object(obj) = member {
            for (key, value) in obj {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use serde_json::json;

    fn run(program: &str, input: serde_json::Value) -> JsonMapResult<serde_json::Value> {
        let mut lexer = Lexer::new(program, None);
        let tokens = lexer.tokenize()?;
        let mut parser = Parser::new(tokens, program);
        let ast = parser.parse()?;
        let mut evaluator = Evaluator::new(program);
        let output = evaluator.evaluate(&ast, &Value::from_serde_json(input))?;
        Ok(output.to_serde_json())
    }

    #[test]
    fn test_reference_mapping() {
        let actual = run("foo = &bar;", json!({"bar": "hello, world!"})).unwrap();
        assert_eq!(actual, json!({"foo": "hello, world!"}));
    }

    #[test]
    fn test_literals_ignore_input() {
        let actual = run(
            r#"s = "buzz"; n = 5; yes = true; no = false; nothing = null;"#,
            json!({"unused": 1}),
        )
        .unwrap();
        assert_eq!(
            actual,
            json!({"s": "buzz", "n": 5, "yes": true, "no": false, "nothing": null})
        );
    }

    #[test]
    fn test_array_indexing() {
        let actual = run(
            "foo = &bar.0; fizz = &bar.1;",
            json!({"bar": ["hello", "world"]}),
        )
        .unwrap();
        assert_eq!(actual, json!({"foo": "hello", "fizz": "world"}));
    }

    #[test]
    fn test_deep_reference() {
        let actual = run("foo = &bar.fizz.buzz;", json!({"bar": {"fizz": {"buzz": 0}}})).unwrap();
        assert_eq!(actual, json!({"foo": 0}));
    }

    #[test]
    fn test_quoted_field_step() {
        let actual = run(
            r#"x = &"outer space"."inner space";"#,
            json!({"outer space": {"inner space": 9}}),
        )
        .unwrap();
        assert_eq!(actual, json!({"x": 9}));
    }

    #[test]
    fn test_bare_ref_returns_current() {
        let actual = run("whole = &;", json!({"a": 1})).unwrap();
        assert_eq!(actual, json!({"whole": {"a": 1}}));
    }

    #[test]
    fn test_nested_objects_and_lists() {
        let actual = run(
            r#"foo = [null, 1.4, "hello", &bar, [0, 1, 2], {whiz = &bang;}];"#,
            json!({"bar": "hello", "bang": "world"}),
        )
        .unwrap();
        assert_eq!(
            actual,
            json!({"foo": [null, 1.4, "hello", "hello", [0, 1, 2], {"whiz": "world"}]})
        );
    }

    #[test]
    fn test_bind_narrows_current() {
        let actual = run(
            r#"
            foo = bind &bar {
                "first": &first,
                "second": &second.third,
                "fourth": &!fourth
            };
            "#,
            json!({"fourth": 4, "bar": {"first": 1, "second": {"third": 3}}}),
        )
        .unwrap();
        assert_eq!(actual, json!({"foo": {"first": 1, "second": 3, "fourth": 4}}));
    }

    #[test]
    fn test_nested_bind() {
        let actual = run(
            r#"
            foo = bind &"first scope" {
                bar = bind &"second scope" {
                    fizz = &buzz;
                };
            };
            "#,
            json!({"first scope": {"second scope": {"buzz": "hello"}}}),
        )
        .unwrap();
        assert_eq!(actual, json!({"foo": {"bar": {"fizz": "hello"}}}));
    }

    #[test]
    fn test_bind_does_not_rebind_anon() {
        // `&?` inside bind still sees the enclosing map element
        let actual = run(
            r#"
            out = map &items {
                narrowed = bind &inner { v = &?; w = &deep; };
            };
            "#,
            json!({"items": [{"inner": {"deep": 1}}, {"inner": {"deep": 2}}]}),
        )
        .unwrap();
        assert_eq!(
            actual,
            json!({"out": [
                {"narrowed": {"v": {"inner": {"deep": 1}}, "w": 1}},
                {"narrowed": {"v": {"inner": {"deep": 2}}, "w": 2}}
            ]})
        );
    }

    #[test]
    fn test_map_object_body() {
        let actual = run(
            "student_first_names = map &students { name = &first_name; };",
            json!({"students": [{"first_name": "alice"}, {"first_name": "bob"}]}),
        )
        .unwrap();
        assert_eq!(
            actual,
            json!({"student_first_names": [{"name": "alice"}, {"name": "bob"}]})
        );
    }

    #[test]
    fn test_map_single_expr_body_unwrapped() {
        let actual = run(
            "names = map &students [ &first_name ];",
            json!({"students": [{"first_name": "alice"}, {"first_name": "bob"}]}),
        )
        .unwrap();
        assert_eq!(actual, json!({"names": ["alice", "bob"]}));
    }

    #[test]
    fn test_map_multi_expr_body_is_list_per_element() {
        let actual = run(
            "pairs = map &students [ &first_name, &age ];",
            json!({"students": [
                {"first_name": "alice", "age": 10},
                {"first_name": "bob", "age": 11}
            ]}),
        )
        .unwrap();
        assert_eq!(actual, json!({"pairs": [["alice", 10], ["bob", 11]]}));
    }

    #[test]
    fn test_map_anon_is_element() {
        let actual = run(
            "items = map &inventory { item = &?; store = &!store; };",
            json!({"store": "S", "inventory": ["a", "b"]}),
        )
        .unwrap();
        assert_eq!(
            actual,
            json!({"items": [
                {"item": "a", "store": "S"},
                {"item": "b", "store": "S"}
            ]})
        );
    }

    #[test]
    fn test_map_over_literal_list() {
        let actual = run(
            r#"names = map [{"first_name": &"first_student"}, {"first_name": "bob"}] {
                "name": &"first_name"
            };"#,
            json!({"first_student": "alice"}),
        )
        .unwrap();
        assert_eq!(actual, json!({"names": [{"name": "alice"}, {"name": "bob"}]}));
    }

    #[test]
    fn test_map_requires_list() {
        let err = run("xs = map &n { v = &?; };", json!({"n": 5})).unwrap_err();
        match err {
            JsonMapError::TypeMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, "list");
                assert_eq!(found, "number");
            }
            other => panic!("expected TypeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_zip_positional_tuple() {
        let actual = run(
            r#"nums = zip [1, 2, 3] ["one", "two", "three"] { v = &?.0; n = &?.1; };"#,
            json!({}),
        )
        .unwrap();
        assert_eq!(
            actual,
            json!({"nums": [
                {"v": 1, "n": "one"},
                {"v": 2, "n": "two"},
                {"v": 3, "n": "three"}
            ]})
        );
    }

    #[test]
    fn test_zip_stops_at_shortest() {
        let actual = run(
            "out = zip &a &b [ &?.1 ];",
            json!({"a": [1, 2, 3, 4], "b": [10, 20]}),
        )
        .unwrap();
        assert_eq!(actual, json!({"out": [10, 20]}));
    }

    #[test]
    fn test_zip_merges_object_namespaces() {
        let actual = run(
            "people = zip &names &ages { who = &name; years = &age; };",
            json!({
                "names": [{"name": "alice"}, {"name": "bob"}],
                "ages": [{"age": 30}, {"age": 40}]
            }),
        )
        .unwrap();
        assert_eq!(
            actual,
            json!({"people": [
                {"who": "alice", "years": 30},
                {"who": "bob", "years": 40}
            ]})
        );
    }

    #[test]
    fn test_zip_later_source_wins_on_collision() {
        let actual = run(
            "out = zip &a &b [ &x ];",
            json!({"a": [{"x": 1}], "b": [{"x": 2}]}),
        )
        .unwrap();
        assert_eq!(actual, json!({"out": [2]}));
    }

    #[test]
    fn test_zip_non_object_members_only_positional() {
        // The number member adds nothing to `current` but is there as &?.1
        let actual = run(
            "out = zip &objs &nums { k = &key; n = &?.1; };",
            json!({"objs": [{"key": "a"}], "nums": [7]}),
        )
        .unwrap();
        assert_eq!(actual, json!({"out": [{"k": "a", "n": 7}]}));
    }

    #[test]
    fn test_anon_whole_tuple() {
        let actual = run("out = zip [1] [\"one\"] [ &? ];", json!({})).unwrap();
        assert_eq!(actual, json!({"out": [[1, "one"]]}));
    }

    #[test]
    fn test_global_reaches_through_scopes() {
        let actual = run(
            r#"
            out = map &xs {
                inner = bind &obj {
                    g = &!tag;
                };
            };
            "#,
            json!({"tag": "root", "xs": [{"obj": {}}]}),
        )
        .unwrap();
        assert_eq!(actual, json!({"out": [{"inner": {"g": "root"}}]}));
    }

    #[test]
    fn test_missing_field_error_path() {
        let err = run("x = &missing;", json!({})).unwrap_err();
        match err {
            JsonMapError::MissingField { field, path, .. } => {
                assert_eq!(field, "missing");
                assert_eq!(path, "$.x");
            }
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_index_on_object_is_type_mismatch() {
        let err = run("x = &a.0;", json!({"a": {}})).unwrap_err();
        match err {
            JsonMapError::TypeMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, "list");
                assert_eq!(found, "object");
            }
            other => panic!("expected TypeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_numeric_key_requires_quoted_form() {
        // `&a.1` indexes lists only; `&a."1"` reads the stringified key
        assert!(run("x = &a.1;", json!({"a": {"1": "x"}})).is_err());
        let actual = run(r#"x = &a."1";"#, json!({"a": {"1": "x"}})).unwrap();
        assert_eq!(actual, json!({"x": "x"}));
    }

    #[test]
    fn test_out_of_bounds_error() {
        let err = run("x = &a.5;", json!({"a": [1, 2]})).unwrap_err();
        match err {
            JsonMapError::OutOfBounds { index, length, path, .. } => {
                assert_eq!(index, 5);
                assert_eq!(length, 2);
                assert_eq!(path, "$.x");
            }
            other => panic!("expected OutOfBounds, got {:?}", other),
        }
    }

    #[test]
    fn test_error_path_inside_iteration() {
        let err = run(
            "items = map &xs { v = &missing; };",
            json!({"xs": [{"present": 1}]}),
        )
        .unwrap_err();
        assert_eq!(err.path(), Some("$.items.0.v"));
    }

    #[test]
    fn test_null_field_values_pass_through() {
        let actual = run(r#"foo: null, "fizz": &"bar","#, json!({"bar": null})).unwrap();
        assert_eq!(actual, json!({"foo": null, "fizz": null}));
    }

    #[test]
    fn test_field_access_on_scalar_fails() {
        let err = run("x = &a.b;", json!({"a": 3})).unwrap_err();
        match err {
            JsonMapError::TypeMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, "object");
                assert_eq!(found, "number");
            }
            other => panic!("expected TypeMismatch, got {:?}", other),
        }
    }
}

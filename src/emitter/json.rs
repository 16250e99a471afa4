//! JSON emitter for jsonmap values

use indexmap::IndexMap;

use super::Emitter;
use crate::errors::JsonMapResult;
use crate::evaluator::Value;

/// JSON output emitter
pub struct JsonEmitter {
    /// Whether to pretty-print with indentation
    pretty: bool,
    /// Indentation string
    indent: String,
}

impl JsonEmitter {
    /// Create a new JSON emitter
    pub fn new(pretty: bool) -> Self {
        Self {
            pretty,
            indent: "  ".to_string(),
        }
    }

    /// Create a JSON emitter with custom indentation
    pub fn with_indent(indent: impl Into<String>) -> Self {
        Self {
            pretty: true,
            indent: indent.into(),
        }
    }

    /// Emit a value at the given depth
    fn emit_value(&self, value: &Value, out: &mut String, depth: usize) {
        match value {
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => self.emit_number(*n, out),
            Value::String(s) => self.emit_string(s, out),
            Value::Array(arr) => self.emit_array(arr, out, depth),
            Value::Object(obj) => self.emit_object(obj, out, depth),
        }
    }

    /// Emit a number. Integral doubles print without a fraction, so the
    /// literal `25` comes out as `25`, not `25.0`.
    fn emit_number(&self, n: f64, out: &mut String) {
        if !n.is_finite() {
            // JSON cannot represent NaN or infinities
            out.push_str("null");
        } else if n.fract() == 0.0 && n.abs() < (1i64 << 53) as f64 {
            out.push_str(&format!("{}", n as i64));
        } else {
            out.push_str(&format!("{}", n));
        }
    }

    /// Emit a string with JSON escaping
    fn emit_string(&self, s: &str, out: &mut String) {
        out.reserve(s.len() + 2);
        out.push('"');
        for ch in s.chars() {
            match ch {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if c.is_control() => {
                    out.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => out.push(c),
            }
        }
        out.push('"');
    }

    /// Emit an array
    fn emit_array(&self, arr: &[Value], out: &mut String, depth: usize) {
        if arr.is_empty() {
            out.push_str("[]");
            return;
        }

        if self.pretty {
            out.push_str("[\n");
            for (i, item) in arr.iter().enumerate() {
                out.push_str(&self.indent.repeat(depth + 1));
                self.emit_value(item, out, depth + 1);
                if i < arr.len() - 1 {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&self.indent.repeat(depth));
            out.push(']');
        } else {
            out.push('[');
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                self.emit_value(item, out, depth + 1);
            }
            out.push(']');
        }
    }

    /// Emit an object in key declaration order
    fn emit_object(&self, obj: &IndexMap<String, Value>, out: &mut String, depth: usize) {
        if obj.is_empty() {
            out.push_str("{}");
            return;
        }

        if self.pretty {
            out.push_str("{\n");
            for (i, (key, value)) in obj.iter().enumerate() {
                out.push_str(&self.indent.repeat(depth + 1));
                self.emit_string(key, out);
                out.push_str(": ");
                self.emit_value(value, out, depth + 1);
                if i < obj.len() - 1 {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&self.indent.repeat(depth));
            out.push('}');
        } else {
            out.push('{');
            for (i, (key, value)) in obj.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                self.emit_string(key, out);
                out.push(':');
                self.emit_value(value, out, depth + 1);
            }
            out.push('}');
        }
    }
}

impl Emitter for JsonEmitter {
    fn emit(&self, value: &Value) -> JsonMapResult<String> {
        let mut out = String::new();
        self.emit_value(value, &mut out, 0);
        Ok(out)
    }
}

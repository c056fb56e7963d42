//! Value-to-text conversion (§4.3 "Value concatenation for string
//! output"), used both by `FunctionContext::convert_to_string` and by the
//! top-level text-rendering entry point.

use std::rc::Rc;

use crate::context::Runtime;
use crate::value::{OpaqueHost, Value};

pub(crate) fn convert_to_string(runtime: &Rc<Runtime>, value: &Value) -> String {
    match value {
        Value::Undefined => "(undefined)".to_string(),
        Value::Null => "(null)".to_string(),
        Value::Str(s) => s.to_string(),
        Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Callable(c) => {
            let id = runtime.fn_id(c.identity());
            match c.name() {
                Some(name) => format!("fun<{name}:#{id}>"),
                None => format!("fun<#{id}>"),
            }
        }
        Value::Opaque(o) => match o.as_ref() {
            OpaqueHost::DateLike(dt) => dt.to_rfc3339(),
            OpaqueHost::UrlLike(origin) => origin.clone(),
            OpaqueHost::ErrorLike { name, message } => format!("{name}: {message}"),
            OpaqueHost::Other { repr, .. } => repr.clone(),
        },
        Value::List(items) => {
            let rendered: Vec<String> = items.iter().map(|v| json_repr(runtime, v)).collect();
            format!("[{}]", rendered.join(","))
        }
        Value::Record(fields) => {
            let rendered: Vec<String> = fields
                .iter()
                .map(|(k, v)| format!("{}:{}", json_string(k), json_repr(runtime, v)))
                .collect();
            format!("{{{}}}", rendered.join(","))
        }
    }
}

/// JSON rendering used inside list/record text output (§4.3: "array/
/// iterable → JSON of the materialized array, other → JSON").
fn json_repr(runtime: &Rc<Runtime>, value: &Value) -> String {
    match value {
        Value::Undefined | Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => json_string(s),
        Value::List(_) | Value::Record(_) => convert_to_string(runtime, value),
        Value::Callable(_) | Value::Opaque(_) => json_string(&convert_to_string(runtime, value)),
    }
}

fn json_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Runtime;

    #[test]
    fn undefined_and_null_render_as_parenthesized_words() {
        let rt = Runtime::new(None);
        assert_eq!(convert_to_string(&rt, &Value::Undefined), "(undefined)");
        assert_eq!(convert_to_string(&rt, &Value::Null), "(null)");
    }

    #[test]
    fn list_renders_as_json_array() {
        let rt = Runtime::new(None);
        let v = Value::list(vec![Value::Int(1.into()), Value::str("a")]);
        assert_eq!(convert_to_string(&rt, &v), "[1,\"a\"]");
    }

    #[test]
    fn date_like_renders_as_iso8601() {
        let rt = Runtime::new(None);
        let dt = chrono::DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z").unwrap().with_timezone(&chrono::Utc);
        let v = Value::opaque(OpaqueHost::DateLike(dt));
        assert_eq!(convert_to_string(&rt, &v), "2024-01-02T03:04:05+00:00");
    }

    #[test]
    fn url_like_renders_as_its_origin() {
        let rt = Runtime::new(None);
        let v = Value::opaque(OpaqueHost::UrlLike("https://example.com".to_string()));
        assert_eq!(convert_to_string(&rt, &v), "https://example.com");
    }

    #[test]
    fn error_like_renders_as_name_colon_message() {
        let rt = Runtime::new(None);
        let v = Value::opaque(OpaqueHost::ErrorLike { name: "TypeError".to_string(), message: "bad input".to_string() });
        assert_eq!(convert_to_string(&rt, &v), "TypeError: bad input");
    }

    #[test]
    fn same_callable_gets_a_stable_id_across_calls() {
        let rt = Runtime::new(None);
        let c = Value::Callable(crate::value::Callable::ordinary(
            "add".to_string(),
            TestFn,
        ));
        let a = convert_to_string(&rt, &c);
        let b = convert_to_string(&rt, &c);
        assert_eq!(a, b);
        assert!(a.starts_with("fun<add:#"));
    }

    struct TestFn;
    impl crate::value::OrdinaryFn for TestFn {
        fn call<'a>(
            &'a self,
            _ctx: crate::context::FunctionContext,
            _args: Vec<Value>,
        ) -> crate::value::BoxFuture<'a, crate::error::ReduceResult<Value>> {
            Box::pin(async { Ok(Value::Undefined) })
        }
    }
}

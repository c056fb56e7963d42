//! The dynamic value type host variables, literals, and callables share.
//!
//! Lists and records are reference-counted and therefore cheap to clone;
//! they are treated as immutable by the core (the standard library, not
//! specified here, is responsible for any copy-on-write mutation
//! convention built on top).

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use funcity_par::Expr;
use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::context::FunctionContext;
use crate::error::ReduceResult;

/// A host object the core treats as opaque beyond the text-rendering
/// category it was tagged with (§4.3, §9 "opaque-host"). The core never
/// inspects these past that category — it only needs enough to produce
/// the one piece of text each category's rendering rule calls for.
#[derive(Clone, Debug)]
pub enum OpaqueHost {
    /// Rendered as an ISO-8601 timestamp.
    DateLike(DateTime<Utc>),
    /// Rendered as the origin the host already extracted from its URL
    /// object (`scheme://host[:port]`).
    UrlLike(String),
    /// Rendered as `name: message`.
    ErrorLike { name: String, message: String },
    /// Anything else; `repr` is whatever text the host wants shown.
    Other { type_name: String, repr: String },
}

/// A host value. `!Send` by construction (`Rc`, boxed non-`Send` futures),
/// matching the reducer's single-threaded, current-thread-runtime model.
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Int(BigInt),
    Float(f64),
    Str(Rc<str>),
    List(Rc<Vec<Value>>),
    /// An insertion-ordered record, keyed by string.
    Record(Rc<IndexMap<String, Value>>),
    Callable(Callable),
    /// A host object outside the core's own value vocabulary (a date, a
    /// URL, an exception type, ...).
    Opaque(Rc<OpaqueHost>),
}

impl Value {
    pub fn str(s: impl Into<Rc<str>>) -> Value {
        Value::Str(s.into())
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(items))
    }

    pub fn record(fields: IndexMap<String, Value>) -> Value {
        Value::Record(Rc::new(fields))
    }

    pub fn opaque(host: OpaqueHost) -> Value {
        Value::Opaque(Rc::new(host))
    }

    /// Object-like values are the ones dot-traversal can read a property
    /// from: records and (by name) callables carrying no other state do
    /// not qualify, but records do. Lists are intentionally excluded —
    /// iteration over a list is positional, not by name.
    pub fn as_record(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Record(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Value::Callable(c) => Some(c),
            _ => None,
        }
    }

    /// Truthy semantics (§4.3): `undefined`/`null` are false, booleans are
    /// themselves, numbers are `!= 0`, everything else (including the
    /// empty string) is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => !n.eq(&BigInt::from(0)),
            Value::Float(f) => *f != 0.0,
            Value::Str(_) | Value::List(_) | Value::Record(_) | Value::Callable(_) | Value::Opaque(_) => true,
        }
    }

    /// The host-iteration view used by `for`: `None` means "not iterable",
    /// which the reducer reports as the same error as applying a
    /// non-callable.
    pub fn iter_items(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(items) => Some(items.as_ref().clone()),
            Value::Str(s) => Some(s.chars().map(|c| Value::str(c.to_string())).collect()),
            Value::Record(fields) => Some(
                fields
                    .iter()
                    .map(|(k, v)| Value::list(vec![Value::str(k.clone()), v.clone()]))
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(n) => write!(f, "Float({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::List(items) => write!(f, "List({items:?})"),
            Value::Record(fields) => write!(f, "Record({fields:?})"),
            Value::Callable(c) => write!(f, "Callable(#{})", Rc::as_ptr(&c.0) as usize),
            Value::Opaque(o) => write!(f, "Opaque({o:?})"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => Rc::ptr_eq(a, b),
            (Value::Callable(a), Value::Callable(b)) => Rc::ptr_eq(&a.0, &b.0),
            (Value::Opaque(a), Value::Opaque(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A callable invoked with already-evaluated argument values.
pub trait OrdinaryFn {
    fn call<'a>(&'a self, ctx: FunctionContext, args: Vec<Value>) -> BoxFuture<'a, ReduceResult<Value>>;
}

/// A callable invoked with the unevaluated argument AST, so it can choose
/// whether/when to reduce each one (`cond`, `set`, `fun`, `and`, `or`).
pub trait SpecialFn {
    fn call<'a>(&'a self, ctx: FunctionContext, args: &'a [Expr]) -> BoxFuture<'a, ReduceResult<Value>>;
}

enum CallableBody {
    Ordinary(Box<dyn OrdinaryFn>),
    Special(Box<dyn SpecialFn>),
}

struct CallableInner {
    name: Option<String>,
    body: CallableBody,
}

/// A host-provided function, marked ordinary or special (§4.3). Cheap to
/// clone: the body lives behind a shared `Rc`.
#[derive(Clone)]
pub struct Callable(Rc<CallableInner>);

impl Callable {
    pub fn ordinary(name: impl Into<Option<String>>, f: impl OrdinaryFn + 'static) -> Callable {
        Callable(Rc::new(CallableInner {
            name: name.into(),
            body: CallableBody::Ordinary(Box::new(f)),
        }))
    }

    pub fn special(name: impl Into<Option<String>>, f: impl SpecialFn + 'static) -> Callable {
        Callable(Rc::new(CallableInner {
            name: name.into(),
            body: CallableBody::Special(Box::new(f)),
        }))
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    pub fn is_special(&self) -> bool {
        matches!(self.0.body, CallableBody::Special(_))
    }

    pub fn ordinary_body(&self) -> Option<&dyn OrdinaryFn> {
        match &self.0.body {
            CallableBody::Ordinary(f) => Some(f.as_ref()),
            CallableBody::Special(_) => None,
        }
    }

    pub fn special_body(&self) -> Option<&dyn SpecialFn> {
        match &self.0.body {
            CallableBody::Special(f) => Some(f.as_ref()),
            CallableBody::Ordinary(_) => None,
        }
    }

    /// Stable per-value identity, used to assign the per-run sequence
    /// number in `fun<name:#id>` / `fun<#id>` text rendering.
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

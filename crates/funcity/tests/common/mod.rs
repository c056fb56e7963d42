//! A minimal host standard library used only by this crate's own
//! integration tests. The real standard library (arithmetic, collection
//! functions) is a host concern out of scope for the core (§1) — this is
//! just enough of one to exercise the scenarios in §8.2.

use funcity::{Callable, FunctionContext, OrdinaryFn, ReduceFailure, SpecialFn, Value, VariableMap};
use funcity_par::Expr;
use funcity_reduce::BoxFuture;
use funcity_util::LogEntry;

fn int(v: &Value) -> Option<num_bigint::BigInt> {
    match v {
        Value::Int(n) => Some(n.clone()),
        _ => None,
    }
}

macro_rules! binary_int_fn {
    ($name:ident, $op:tt) => {
        struct $name;
        impl OrdinaryFn for $name {
            fn call<'a>(&'a self, _ctx: FunctionContext, args: Vec<Value>) -> BoxFuture<'a, Result<Value, ReduceFailure>> {
                Box::pin(async move {
                    let (Some(a), Some(b)) = (int(&args[0]), int(&args[1])) else {
                        return Ok(Value::Undefined);
                    };
                    Ok(Value::Int(a $op b))
                })
            }
        }
    };
}

binary_int_fn!(Add, +);
binary_int_fn!(Sub, -);
binary_int_fn!(Mul, *);

struct Eq;
impl OrdinaryFn for Eq {
    fn call<'a>(&'a self, _ctx: FunctionContext, args: Vec<Value>) -> BoxFuture<'a, Result<Value, ReduceFailure>> {
        Box::pin(async move { Ok(Value::Bool(args[0] == args[1])) })
    }
}

struct Delay;
impl OrdinaryFn for Delay {
    fn call<'a>(&'a self, _ctx: FunctionContext, args: Vec<Value>) -> BoxFuture<'a, Result<Value, ReduceFailure>> {
        Box::pin(async move {
            let millis = int(&args[0]).and_then(|n| num_traits::ToPrimitive::to_u64(&n)).unwrap_or(0);
            tokio::time::sleep(std::time::Duration::from_millis(millis)).await;
            Ok(Value::Undefined)
        })
    }
}

/// `cond(test1, result1, test2, result2, ..., [default])`: evaluates
/// tests left to right, returning the first paired result whose test is
/// truthy; a trailing unpaired argument is an unconditional default.
struct Cond;
impl SpecialFn for Cond {
    fn call<'a>(&'a self, ctx: FunctionContext, args: &'a [Expr]) -> BoxFuture<'a, Result<Value, ReduceFailure>> {
        Box::pin(async move {
            let mut i = 0;
            while i + 1 < args.len() {
                let test = ctx.reduce(&args[i]).await?;
                if test.is_truthy() {
                    return ctx.reduce(&args[i + 1]).await;
                }
                i += 2;
            }
            if i < args.len() {
                ctx.reduce(&args[i]).await
            } else {
                Ok(Value::Undefined)
            }
        })
    }
}

/// `set(name, value)`: binds `name` in the current scope to the reduced
/// `value`, and yields that value.
struct Set;
impl SpecialFn for Set {
    fn call<'a>(&'a self, ctx: FunctionContext, args: &'a [Expr]) -> BoxFuture<'a, Result<Value, ReduceFailure>> {
        Box::pin(async move {
            let Some(Expr::Variable(name, _)) = args.first() else {
                return Err(fatal(&ctx, "'set' requires a variable name as its first argument"));
            };
            let Some(value_expr) = args.get(1) else {
                return Err(fatal(&ctx, "'set' requires a value as its second argument"));
            };
            let value = ctx.reduce(value_expr).await?;
            ctx.write(name.clone(), value.clone())?;
            Ok(value)
        })
    }
}

fn fatal(ctx: &FunctionContext, message: &str) -> ReduceFailure {
    ctx.append_log(LogEntry::error(message, ctx.apply_range()))
        .expect_err("an error-kind entry always raises")
}

struct UserFunction {
    defining_ctx: FunctionContext,
    params: Vec<String>,
    body: Expr,
}

impl OrdinaryFn for UserFunction {
    fn call<'a>(&'a self, _ctx: FunctionContext, args: Vec<Value>) -> BoxFuture<'a, Result<Value, ReduceFailure>> {
        Box::pin(async move {
            let call_ctx = self.defining_ctx.new_scope()?;
            if args.len() > self.params.len() {
                call_ctx.append_log(LogEntry::warning(
                    "too many arguments to a user function",
                    call_ctx.apply_range(),
                ))?;
            }
            for (index, param) in self.params.iter().enumerate() {
                let value = args.get(index).cloned().unwrap_or(Value::Undefined);
                call_ctx.write(param.clone(), value)?;
            }
            call_ctx.reduce(&self.body).await
        })
    }
}

/// `fun([param, ...], body)`: builds a closure over the scope where the
/// literal appears.
struct Fun;
impl SpecialFn for Fun {
    fn call<'a>(&'a self, ctx: FunctionContext, args: &'a [Expr]) -> BoxFuture<'a, Result<Value, ReduceFailure>> {
        Box::pin(async move {
            let Some(Expr::List { items, .. }) = args.first() else {
                return Err(fatal(&ctx, "'fun' requires a parameter list as its first argument"));
            };
            let mut params = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Expr::Variable(name, _) => params.push(name.clone()),
                    _ => return Err(fatal(&ctx, "'fun' parameters must be plain identifiers")),
                }
            }
            let Some(body) = args.get(1).cloned() else {
                return Err(fatal(&ctx, "'fun' requires a body expression"));
            };
            Ok(Value::Callable(Callable::ordinary(
                None::<String>,
                UserFunction { defining_ctx: ctx.clone(), params, body },
            )))
        })
    }
}

/// Builds the host variable map the scenario tests inject.
pub fn demo_variables() -> VariableMap {
    let mut vars = VariableMap::new();
    vars.insert("add", Value::Callable(Callable::ordinary("add".to_string(), Add)));
    vars.insert("sub", Value::Callable(Callable::ordinary("sub".to_string(), Sub)));
    vars.insert("mul", Value::Callable(Callable::ordinary("mul".to_string(), Mul)));
    vars.insert("eq", Value::Callable(Callable::ordinary("eq".to_string(), Eq)));
    vars.insert("delay", Value::Callable(Callable::ordinary("delay".to_string(), Delay)));
    vars.insert("cond", Value::Callable(Callable::special("cond".to_string(), Cond)));
    vars.insert("set", Value::Callable(Callable::special("set".to_string(), Set)));
    vars.insert("fun", Value::Callable(Callable::special("fun".to_string(), Fun)));
    vars
}

//! The asynchronous tree-walking reducer (§4.3): turns a parsed tree into
//! an ordered sequence of [`Value`]s, honoring lexical scoping,
//! cancellation, and ordinary/special callable semantics.

use std::rc::Rc;

use async_recursion::async_recursion;
use futures::future::try_join_all;
use funcity_par::{Block, DotSegment, Expr};
use funcity_util::{LogEntry, Range};
use funcity_lex::NumberLiteral;
use tokio_util::sync::CancellationToken;

use crate::context::{FunctionContext, Runtime};
use crate::error::{ReduceFailure, ReduceResult};
use crate::scope::{Scope, VariableMap};
use crate::value::Value;

const NOT_CALLABLE: &str = "could not apply it for function";

fn number_to_value(n: &NumberLiteral) -> Value {
    match n {
        NumberLiteral::Int(i) => Value::Int(i.clone()),
        NumberLiteral::Float(f) => Value::Float(*f),
    }
}

/// Strips a single trailing `?` (conditional combine), reporting whether
/// one was present.
fn split_conditional(name: &str) -> (&str, bool) {
    match name.strip_suffix('?') {
        Some(bare) => (bare, true),
        None => (name, false),
    }
}

#[async_recursion(?Send)]
pub(crate) async fn reduce_expr(rt: Rc<Runtime>, scope: Rc<Scope>, node: &Expr) -> ReduceResult<Value> {
    rt.check_cancel()?;
    match node {
        Expr::Number(n, _) => Ok(number_to_value(n)),
        Expr::Str(s, _) => Ok(Value::str(s.clone())),
        Expr::Variable(name, range) => reduce_variable(&rt, &scope, name, *range),
        Expr::Dot { base, segments, .. } => reduce_dot(rt, scope, base, segments).await,
        Expr::Apply { func, args, range } => reduce_apply(rt, scope, func, args, *range).await,
        Expr::List { items, .. } => {
            let futures = items.iter().map(|item| reduce_expr(Rc::clone(&rt), Rc::clone(&scope), item));
            let values = try_join_all(futures).await?;
            Ok(Value::list(values))
        }
        Expr::Scope { nodes, .. } => {
            let mut last = Value::Undefined;
            for n in nodes {
                last = reduce_expr(Rc::clone(&rt), Rc::clone(&scope), n).await?;
            }
            Ok(last)
        }
    }
}

/// A bare `variable(name)` (§4.3 "Identifier traversal"): a trailing `?`
/// on the name itself performs a single silent lookup.
fn reduce_variable(rt: &Rc<Runtime>, scope: &Rc<Scope>, name: &str, range: Range) -> ReduceResult<Value> {
    let (bare, conditional) = split_conditional(name);
    match scope.lookup(bare) {
        Some(v) => Ok(v),
        None if conditional => Ok(Value::Undefined),
        None => Err(rt.fail(LogEntry::error(format!("variable is not bound: {bare}"), range))),
    }
}

#[async_recursion(?Send)]
async fn reduce_dot(rt: Rc<Runtime>, scope: Rc<Scope>, base: &Expr, segments: &[DotSegment]) -> ReduceResult<Value> {
    let mut current = reduce_expr(Rc::clone(&rt), Rc::clone(&scope), base).await?;

    for segment in segments {
        rt.check_cancel()?;
        let Some(record) = current.as_record() else {
            return if segment.optional {
                Ok(Value::Undefined)
            } else {
                Err(rt.fail(LogEntry::error(format!("variable is not bound: {}", segment.name), segment.range)))
            };
        };
        let (bare, name_conditional) = split_conditional(&segment.name);
        match record.get(bare) {
            Some(v) => current = v.clone(),
            None if segment.optional || name_conditional => return Ok(Value::Undefined),
            None => {
                return Err(rt.fail(LogEntry::error(format!("variable is not bound: {bare}"), segment.range)));
            }
        }
    }
    Ok(current)
}

#[async_recursion(?Send)]
async fn reduce_apply(rt: Rc<Runtime>, scope: Rc<Scope>, func: &Expr, args: &[Expr], range: Range) -> ReduceResult<Value> {
    let func_value = reduce_expr(Rc::clone(&rt), Rc::clone(&scope), func).await?;
    let Some(callable) = func_value.as_callable().cloned() else {
        return Err(rt.fail(LogEntry::error(NOT_CALLABLE, range)));
    };
    let ctx = FunctionContext::new(Rc::clone(&rt), Rc::clone(&scope), range);

    if let Some(special) = callable.special_body() {
        return special.call(ctx, args).await;
    }

    rt.check_cancel()?;
    let futures = args.iter().map(|a| reduce_expr(Rc::clone(&rt), Rc::clone(&scope), a));
    let values = try_join_all(futures).await?;
    let ordinary = callable.ordinary_body().expect("non-special callable has an ordinary body");
    ordinary.call(ctx, values).await
}

#[async_recursion(?Send)]
pub(crate) async fn reduce_block(rt: Rc<Runtime>, scope: Rc<Scope>, block: &Block) -> ReduceResult<Vec<Value>> {
    rt.check_cancel()?;
    match block {
        Block::Text(text, _) => Ok(vec![Value::str(text.clone())]),
        Block::Expr(expr) => Ok(vec![reduce_expr(rt, scope, expr).await?]),
        Block::If { condition, then_branch, else_branch, .. } => {
            let cond = reduce_expr(Rc::clone(&rt), Rc::clone(&scope), condition).await?;
            let branch = if cond.is_truthy() { then_branch } else { else_branch };
            reduce_blocks(rt, scope, branch).await
        }
        Block::While { condition, body, .. } => {
            let mut out = Vec::new();
            loop {
                rt.check_cancel()?;
                let cond = reduce_expr(Rc::clone(&rt), Rc::clone(&scope), condition).await?;
                if !cond.is_truthy() {
                    break;
                }
                out.extend(reduce_blocks(Rc::clone(&rt), Rc::clone(&scope), body).await?);
            }
            Ok(out)
        }
        Block::For { bind, iterable, body, .. } => {
            let bind_name = match bind {
                Expr::Variable(name, _) => name.clone(),
                _ => unreachable!("parser guarantees for.bind is a variable node"),
            };
            let iterable_value = reduce_expr(Rc::clone(&rt), Rc::clone(&scope), iterable).await?;
            let Some(items) = iterable_value.iter_items() else {
                return Err(rt.fail(LogEntry::error(NOT_CALLABLE, iterable.range())));
            };
            let mut out = Vec::new();
            for item in items {
                rt.check_cancel()?;
                scope.write(bind_name.clone(), item);
                out.extend(reduce_blocks(Rc::clone(&rt), Rc::clone(&scope), body).await?);
            }
            Ok(out)
        }
    }
}

#[async_recursion(?Send)]
pub(crate) async fn reduce_blocks(rt: Rc<Runtime>, scope: Rc<Scope>, blocks: &[Block]) -> ReduceResult<Vec<Value>> {
    let mut out = Vec::new();
    for block in blocks {
        out.extend(reduce_block(Rc::clone(&rt), Rc::clone(&scope), block).await?);
    }
    Ok(out)
}

/// Outcome of a complete run: either a value sequence (possibly empty, if
/// a fatal error was recorded) plus the accumulated diagnostic log, or a
/// cancellation that the host must handle itself (§7: "Cancellation
/// propagates out unaltered").
pub async fn reduce_program(
    blocks: &[Block],
    variables: VariableMap,
    cancel: Option<CancellationToken>,
) -> Result<(Vec<Value>, Vec<LogEntry>), ReduceFailure> {
    let (rt, outcome) = run_blocks(blocks, variables, cancel).await?;
    match outcome {
        Ok(values) => Ok((values, rt.take_log())),
        Err(()) => Ok((Vec::new(), rt.take_log())),
    }
}

/// Same run as [`reduce_program`], but joins the resulting sequence into
/// one string via §4.3's value-to-text rendering (`runOnceToText`).
/// Shares one [`Runtime`] between reduction and rendering so a callable
/// that appears more than once in the result gets the same `#id` both
/// times.
pub async fn reduce_program_to_text(
    blocks: &[Block],
    variables: VariableMap,
    cancel: Option<CancellationToken>,
) -> Result<(String, Vec<LogEntry>), ReduceFailure> {
    let (rt, outcome) = run_blocks(blocks, variables, cancel).await?;
    match outcome {
        Ok(values) => {
            let text = values.iter().map(|v| crate::convert::convert_to_string(&rt, v)).collect();
            Ok((text, rt.take_log()))
        }
        Err(()) => Ok((String::new(), rt.take_log())),
    }
}

/// Runs the tree and returns the live `Runtime` alongside the outcome:
/// `Ok(values)` on success, `Err(())` if a fatal error was recorded (the
/// log already carries its `LogEntry`). Cancellation is the only case
/// that propagates as the outer `Result`'s `Err`.
async fn run_blocks(
    blocks: &[Block],
    variables: VariableMap,
    cancel: Option<CancellationToken>,
) -> Result<(Rc<Runtime>, Result<Vec<Value>, ()>), ReduceFailure> {
    let rt = Runtime::new(cancel);
    let root = Scope::root(variables);
    // `set` at the template's outermost level needs somewhere to write:
    // the root itself stays read-only (§3.5, §8.1 scope isolation), so the
    // run always opens one mutable top-level scope first.
    let top = root.new_child();

    match reduce_blocks(Rc::clone(&rt), top, blocks).await {
        Ok(values) => Ok((rt, Ok(values))),
        Err(ReduceFailure::Cancelled) => Err(ReduceFailure::Cancelled),
        Err(ReduceFailure::Fatal(_)) => Ok((rt, Err(()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{BoxFuture, Callable, OrdinaryFn};
    use funcity_par::parse_template;

    struct Add;
    impl OrdinaryFn for Add {
        fn call<'a>(&'a self, _ctx: FunctionContext, args: Vec<Value>) -> BoxFuture<'a, ReduceResult<Value>> {
            Box::pin(async move {
                let (Value::Int(a), Value::Int(b)) = (&args[0], &args[1]) else {
                    return Ok(Value::Undefined);
                };
                Ok(Value::Int(a + b))
            })
        }
    }

    async fn run(source: &str, variables: VariableMap) -> (Vec<Value>, Vec<LogEntry>) {
        let parsed = parse_template(source);
        assert!(parsed.log.iter().all(|e| !e.is_error()), "{:?}", parsed.log);
        reduce_program(&parsed.blocks, variables, None).await.expect("not cancelled")
    }

    #[tokio::test(flavor = "current_thread")]
    async fn template_splicing_scenario() {
        let mut vars = VariableMap::new();
        vars.insert("add", Value::Callable(Callable::ordinary("add".to_string(), Add)));
        let (values, log) = run("Hello{{add 123 456}}World", vars).await;
        assert!(log.iter().all(|e| !e.is_error()));
        assert_eq!(values, vec![
            Value::str("Hello"),
            Value::Int(579.into()),
            Value::str("World"),
        ]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn if_else_with_conditional_combine_on_unbound_flag() {
        let (values, log) = run("{{if flag?}}THEN{{else}}ELSE{{end}}", VariableMap::new()).await;
        assert!(log.iter().all(|e| !e.is_error()));
        assert_eq!(values, vec![Value::str("ELSE")]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn for_over_list_literal_repeats_body() {
        let (values, _log) = run("{{for i [1 2 3 4 5]}}ABC{{end}}", VariableMap::new()).await;
        assert_eq!(values, vec![
            Value::str("ABC"), Value::str("ABC"), Value::str("ABC"), Value::str("ABC"), Value::str("ABC"),
        ]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unbound_non_conditional_variable_is_fatal_and_empties_result() {
        let (values, log) = run("{{missing}}", VariableMap::new()).await;
        assert!(log.iter().any(|e| e.is_error()));
        assert!(values.is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn scope_isolation_leaves_injected_variables_untouched() {
        let mut vars = VariableMap::new();
        vars.insert("count", Value::Int(10.into()));
        let (values, log) = run("{{count}}", vars.clone()).await;
        assert!(log.iter().all(|e| !e.is_error()));
        assert_eq!(values, vec![Value::Int(10.into())]);
        // `vars` itself was passed by value into `reduce_program`, which
        // only ever layers a child scope over it — the original binding
        // is untouched.
        assert_eq!(vars.get("count"), Some(&Value::Int(10.into())));
    }
}

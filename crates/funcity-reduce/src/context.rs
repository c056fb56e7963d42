//! Shared run state and the `FunctionContext` receiver passed to every
//! invoked callable (§4.3 "Function context").

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use funcity_par::Expr;
use funcity_util::{LogEntry, LogKind, Range};
use tokio_util::sync::CancellationToken;

use crate::error::{ReduceFailure, ReduceResult};
use crate::scope::Scope;
use crate::value::{BoxFuture, Value};

/// State shared by every scope and callable invocation in one run: the
/// diagnostic log, the failed flag, the optional cancel signal, and the
/// per-run callable-naming counter used by string rendering.
pub(crate) struct Runtime {
    log: RefCell<Vec<LogEntry>>,
    failed: Cell<bool>,
    cancel: Option<CancellationToken>,
    fn_ids: RefCell<HashMap<usize, u64>>,
    next_fn_id: Cell<u64>,
}

impl Runtime {
    pub(crate) fn new(cancel: Option<CancellationToken>) -> Rc<Runtime> {
        Rc::new(Runtime {
            log: RefCell::new(Vec::new()),
            failed: Cell::new(false),
            cancel,
            fn_ids: RefCell::new(HashMap::new()),
            next_fn_id: Cell::new(0),
        })
    }

    /// A cooperative check point (§4.3 "Cancellation"): before each
    /// application, loop iteration, scope creation, and variable read or
    /// write.
    pub(crate) fn check_cancel(&self) -> ReduceResult<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(ReduceFailure::Cancelled),
            _ => Ok(()),
        }
    }

    pub(crate) fn push_warning(&self, entry: LogEntry) {
        debug_assert_eq!(entry.kind, LogKind::Warning);
        self.log.borrow_mut().push(entry);
    }

    /// Records an error-kind entry and raises the typed failure that
    /// terminates the run.
    pub(crate) fn fail(&self, entry: LogEntry) -> ReduceFailure {
        debug_assert_eq!(entry.kind, LogKind::Error);
        self.failed.set(true);
        self.log.borrow_mut().push(entry.clone());
        ReduceFailure::Fatal(entry)
    }

    pub(crate) fn is_failed(&self) -> bool {
        self.failed.get()
    }

    pub(crate) fn take_log(&self) -> Vec<LogEntry> {
        std::mem::take(&mut self.log.borrow_mut())
    }

    /// Assigns (or recalls) the per-run sequence number used to render a
    /// callable as `fun<name:#id>` / `fun<#id>`.
    pub(crate) fn fn_id(&self, identity: usize) -> u64 {
        if let Some(id) = self.fn_ids.borrow().get(&identity) {
            return *id;
        }
        let id = self.next_fn_id.get();
        self.next_fn_id.set(id + 1);
        self.fn_ids.borrow_mut().insert(identity, id);
        id
    }
}

/// The receiver every invoked callable is given (§4.3). Cheap to clone:
/// everything behind it is reference-counted or `Copy`.
#[derive(Clone)]
pub struct FunctionContext {
    pub(crate) runtime: Rc<Runtime>,
    pub(crate) scope: Rc<Scope>,
    apply_range: Range,
}

impl FunctionContext {
    pub(crate) fn new(runtime: Rc<Runtime>, scope: Rc<Scope>, apply_range: Range) -> FunctionContext {
        FunctionContext { runtime, scope, apply_range }
    }

    /// The current `apply` node's range, for diagnostics.
    pub fn apply_range(&self) -> Range {
        self.apply_range
    }

    pub fn lookup(&self, name: &str) -> ReduceResult<Option<Value>> {
        self.runtime.check_cancel()?;
        Ok(self.scope.lookup(name))
    }

    pub fn write(&self, name: impl Into<String>, value: Value) -> ReduceResult<()> {
        self.runtime.check_cancel()?;
        self.scope.write(name, value);
        Ok(())
    }

    /// Records a warning, or raises the typed failure for an error-kind
    /// entry. Mirrors "`appendLog(entry)` — warnings are recorded; errors
    /// raise the failure type" (§4.3).
    pub fn append_log(&self, entry: LogEntry) -> ReduceResult<()> {
        match entry.kind {
            LogKind::Warning => {
                self.runtime.push_warning(entry);
                Ok(())
            }
            LogKind::Error => Err(self.runtime.fail(entry)),
        }
    }

    /// True once a recoverable error has been recorded anywhere in this
    /// run (useful for a special callable that wants to check state
    /// instead of propagating a `Result` from a sub-step).
    pub fn is_failed(&self) -> bool {
        self.runtime.is_failed()
    }

    /// A fresh child scope (used by `fun` to give each invocation its own
    /// environment).
    pub fn new_scope(&self) -> ReduceResult<FunctionContext> {
        self.runtime.check_cancel()?;
        Ok(FunctionContext {
            runtime: Rc::clone(&self.runtime),
            scope: self.scope.new_child(),
            apply_range: self.apply_range,
        })
    }

    /// Uniform value-to-text conversion (§4.3 "Value concatenation for
    /// string output"), exposed so the standard library can reuse it.
    pub fn convert_to_string(&self, value: &Value) -> String {
        crate::convert::convert_to_string(&self.runtime, value)
    }

    /// Reduces an expression AST node in this context's scope — the hook
    /// special callables use to evaluate arguments on their own terms.
    pub fn reduce<'a>(&'a self, node: &'a Expr) -> BoxFuture<'a, ReduceResult<Value>> {
        Box::pin(crate::reducer::reduce_expr(Rc::clone(&self.runtime), Rc::clone(&self.scope), node))
    }
}

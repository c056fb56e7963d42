//! Asynchronous tree-walking reducer for the FunCity template language.
//!
//! Runs single-threaded and cooperatively (§5): embed with a
//! `tokio::runtime::Builder::new_current_thread()` runtime and a
//! `tokio::task::LocalSet`, since [`Value`] and [`Scope`] are `Rc`-based
//! and therefore `!Send`.

mod context;
mod convert;
mod error;
mod reducer;
mod scope;
mod value;

pub use context::FunctionContext;
pub use error::{ReduceFailure, ReduceResult};
pub use reducer::{reduce_program, reduce_program_to_text};
pub use scope::{Scope, VariableMap};
pub use value::{BoxFuture, Callable, OpaqueHost, OrdinaryFn, SpecialFn, Value};

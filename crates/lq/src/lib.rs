//! lq - lazy, LINQ-style sequences over dynamic values.
//!
//! This crate is the public face of the workspace. It re-exports the
//! sequence engine (`lq_core`), the value model (`lq_value`) and the
//! micro-lambda compiler (`lq_lambda`), and hosts the `lq` command-line
//! tool.
//!
//! ```
//! use lq::{Enumerable, LinqResult, Value};
//!
//! # fn main() -> LinqResult<()> {
//! let total = Enumerable::range(1, 10)?
//!     .where_("$x => $x % 2 == 0")?
//!     .select("$x => $x * $x")?
//!     .sum(None)?;
//! assert_eq!(total, Value::Int(220));
//! # Ok(())
//! # }
//! ```

pub mod cli;

use std::sync::Once;

pub use lq_core::{
    Comparer, Cursor, Enumerable, EqualityComparer, Grouping, IntoEnumerable, IntoInvocable,
    Invocable, Iter, IterSource, IterationContext, Lookahead, Lookup, OrderedEnumerable, Pair,
    SeqCursor,
};
pub use lq_lambda::LambdaExpression;
pub use lq_value::{
    from_json_text, to_json_text, ArrayValue, Heap, LinqError, LinqErrorKind, LinqResult, Object,
    Value, ValueKind,
};

static TRACING_INIT: Once = Once::new();

/// Install a stderr subscriber filtered by `LQ_LOG` (or `RUST_LOG`).
///
/// Does nothing when neither variable is set. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let directives = std::env::var("LQ_LOG").or_else(|_| std::env::var("RUST_LOG"));
        if let Ok(directives) = directives {
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
                .with(EnvFilter::new(directives))
                .try_init();
        }
    });
}

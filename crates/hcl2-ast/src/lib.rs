//! HCL2 documents as a typed AST, and an interpreter that replays them as
//! configuration events on host objects.
//!
//! `parse` turns source text into a `Module`; `execute` walks it against a
//! root `Configurable`. Both stages can be customised through
//! `runtime::interpreter::Interpreter` and `runtime::evaluator::Evaluator`.

pub mod syntax;
pub mod runtime;
pub mod error;

pub use error::{ConfigurationError, Error, ErrorCode, LowerError, ParseError, RuntimeError};
pub use runtime::configurable::{Bare, Configurable, Fallback, Function};
pub use runtime::evaluator::{BaseEvaluator, Evaluator};
pub use runtime::interpreter::{BlockFilter, Interpreter};
pub use runtime::operators::OperatorEvaluator;
pub use runtime::value::{PlainValue, Value};
pub use syntax::ast::Module;
pub use syntax::pretty::{pformat, PrettyOptions};

use tracing::debug;

use syntax::cst::Rule;
use syntax::lower::{Lowered, ToAst};

// ─── Public API ───────────────────────────────────────────────────────────────

/// Parse source text into a module. Syntax errors are collected and returned
/// together; a lowering failure means the grammar and lowering disagree.
pub fn parse(text: &str) -> Result<Module, ParseError> {
    let tokens = syntax::lexer::Lexer::new(text).tokenize()?;
    let cst = syntax::grammar::Grammar::new(tokens).parse()?;
    match cst.transform(&mut ToAst)? {
        Lowered::Module(module) => {
            debug!(statements = module.body.len(), "parsed module");
            Ok(module)
        }
        other => Err(LowerError::new(Rule::Start, 1, format!("expected module, found {}", other.describe())).into()),
    }
}

/// Run `module` against `root` with the base evaluator and no block filter.
pub fn execute(module: &Module, root: &mut dyn Configurable) -> Result<(), RuntimeError> {
    Interpreter::new(BaseEvaluator).execute(module, root)
}

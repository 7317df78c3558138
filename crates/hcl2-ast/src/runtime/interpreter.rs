//! Statement interpreter. Walks a `Module` and turns it into configuration
//! events on a context tree.
//!
//! Attributes become `set_attribute` calls on the current context. A block
//! asks the current context for a child with `start_block`, feeds the body
//! into that child and hands it back through `end_block`. Statements run in
//! source order and the first error aborts the walk.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::error::RuntimeError;
use crate::runtime::configurable::Configurable;
use crate::runtime::evaluator::{BaseEvaluator, Evaluator};
use crate::runtime::value::Value;
use crate::syntax::ast::{Attribute, Block, Module, Stmt};

// ─── Filter ───────────────────────────────────────────────────────────────────

/// Allow/deny lists on block names, checked at every depth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockFilter {
    pub enabled: Option<HashSet<String>>,
    pub disabled: Option<HashSet<String>>,
}

impl BlockFilter {
    pub fn allows(&self, name: &str) -> bool {
        self.enabled.as_ref().is_none_or(|set| set.contains(name))
            && self.disabled.as_ref().is_none_or(|set| !set.contains(name))
    }
}

fn name_set<I, S>(names: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

// ─── Interpreter ──────────────────────────────────────────────────────────────

pub struct Interpreter<E = BaseEvaluator> {
    evaluator: E,
    filter: BlockFilter,
}

impl Default for Interpreter<BaseEvaluator> {
    fn default() -> Self {
        Self::new(BaseEvaluator)
    }
}

impl<E: Evaluator> Interpreter<E> {
    pub fn new(evaluator: E) -> Self {
        Self { evaluator, filter: BlockFilter::default() }
    }

    /// Only blocks with these names run (subject to the deny list).
    pub fn with_enabled_blocks<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter.enabled = Some(name_set(names));
        self
    }

    /// Blocks with these names are skipped along with their bodies.
    pub fn with_disabled_blocks<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter.disabled = Some(name_set(names));
        self
    }

    pub fn with_filter(mut self, filter: BlockFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn filter(&self) -> &BlockFilter {
        &self.filter
    }

    // ─── Entry points ─────────────────────────────────────────────────────────

    pub fn execute(&self, module: &Module, ctx: &mut dyn Configurable) -> Result<(), RuntimeError> {
        self.execute_body(&module.body, ctx)
    }

    pub fn execute_stmt(&self, stmt: &Stmt, ctx: &mut dyn Configurable) -> Result<(), RuntimeError> {
        match stmt {
            Stmt::Attribute(attr) => self.execute_attribute(attr, ctx),
            Stmt::Block(block) => self.execute_block(block, ctx),
        }
    }

    fn execute_body(&self, body: &[Stmt], ctx: &mut dyn Configurable) -> Result<(), RuntimeError> {
        for stmt in body {
            self.execute_stmt(stmt, ctx)?;
        }
        Ok(())
    }

    // ─── Statements ───────────────────────────────────────────────────────────

    fn execute_attribute(&self, attr: &Attribute, ctx: &mut dyn Configurable) -> Result<(), RuntimeError> {
        let value = self.evaluator.evaluate(&attr.value, &*ctx)?;
        trace!(key = %attr.key, value = %value, "set attribute");
        ctx.set_attribute(&attr.key, value)?;
        Ok(())
    }

    /// Arguments are evaluated in the enclosing context, before the child exists.
    fn execute_block(&self, block: &Block, ctx: &mut dyn Configurable) -> Result<(), RuntimeError> {
        if !self.filter.allows(&block.name) {
            debug!(name = %block.name, "block skipped by filter");
            return Ok(());
        }

        let args = block.args
            .iter()
            .map(|a| self.evaluator.evaluate(a, &*ctx))
            .collect::<Result<Vec<Value>, _>>()?;

        trace!(name = %block.name, args = args.len(), "enter block");
        let mut child = ctx.start_block(&block.name, &args)?;
        self.execute_body(&block.body, child.as_mut())?;
        ctx.end_block(&block.name, &args, child)?;
        trace!(name = %block.name, "exit block");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationError;
    use crate::runtime::configurable::{Bare, Fallback, Function};
    use crate::syntax::ast::Expression;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Accepts anything and records every event.
    #[derive(Debug)]
    struct Recorder {
        path: String,
        log: Log,
    }

    impl Recorder {
        fn root(log: &Log) -> Self {
            Self { path: "root".into(), log: log.clone() }
        }

        fn push(&self, event: String) {
            self.log.borrow_mut().push(format!("{}: {event}", self.path));
        }
    }

    fn render(args: &[Value]) -> String {
        args.iter().map(Value::to_string).collect::<Vec<_>>().join(" ")
    }

    impl Configurable for Recorder {
        fn set_attribute(&mut self, attr: &str, value: Value) -> Result<(), ConfigurationError> {
            self.push(format!("set {attr} = {value}"));
            Ok(())
        }
        fn get_attribute(&self, attr: &str) -> Result<Value, ConfigurationError> {
            match attr {
                "depth" => Ok(Value::from(self.path.matches('/').count() as i64)),
                _ => Fallback::of(self).get_attribute(attr),
            }
        }
        fn start_block(&mut self, name: &str, args: &[Value]) -> Result<Box<dyn Configurable>, ConfigurationError> {
            self.push(format!("start {name} [{}]", render(args)));
            Ok(Box::new(Recorder { path: format!("{}/{name}", self.path), log: self.log.clone() }))
        }
        fn end_block(&mut self, name: &str, args: &[Value], block: Box<dyn Configurable>) -> Result<(), ConfigurationError> {
            block.validate()?;
            self.push(format!("end {name} [{}]", render(args)));
            Ok(())
        }
        fn get_function(&self, name: &str) -> Result<&dyn Function, ConfigurationError> {
            Fallback::of(self).get_function(name)
        }
        fn validate(&self) -> Result<(), ConfigurationError> {
            Ok(())
        }
    }

    fn nested() -> Module {
        Module::new(vec![
            Stmt::attribute("a", Expression::literal(1)),
            Stmt::block("outer", vec![Expression::literal("x")], vec![
                Stmt::attribute("d", Expression::ident("depth")),
                Stmt::block("inner", vec![], vec![Stmt::attribute("d", Expression::ident("depth"))]),
            ]),
            Stmt::block("skip", vec![], vec![Stmt::attribute("never", Expression::literal(true))]),
        ])
    }

    fn run(interp: &Interpreter, module: &Module) -> (Result<(), RuntimeError>, Vec<String>) {
        let log = Log::default();
        let result = interp.execute(module, &mut Recorder::root(&log));
        let events = log.borrow().clone();
        (result, events)
    }

    #[test]
    fn events_in_source_order() {
        let (result, events) = run(&Interpreter::default(), &nested());
        assert_eq!(result, Ok(()));
        assert_eq!(events, vec![
            "root: set a = 1",
            "root: start outer [\"x\"]",
            "root/outer: set d = 1",
            "root/outer: start inner []",
            "root/outer/inner: set d = 2",
            "root/outer: end inner []",
            "root: end outer [\"x\"]",
            "root: start skip []",
            "root/skip: set never = true",
            "root: end skip []",
        ]);
    }

    #[test]
    fn disabled_blocks_are_skipped_with_their_body() {
        let interp = Interpreter::default().with_disabled_blocks(["skip", "inner"]);
        let (result, events) = run(&interp, &nested());
        assert_eq!(result, Ok(()));
        assert_eq!(events, vec![
            "root: set a = 1",
            "root: start outer [\"x\"]",
            "root/outer: set d = 1",
            "root: end outer [\"x\"]",
        ]);
    }

    #[test]
    fn enabled_list_applies_at_every_depth() {
        let interp = Interpreter::default().with_enabled_blocks(["outer"]);
        let (_, events) = run(&interp, &nested());
        assert!(events.iter().all(|e| !e.contains("inner") && !e.contains("skip")));
        assert!(events.contains(&"root/outer: set d = 1".to_string()));
    }

    #[test]
    fn filter_combines_allow_and_deny() {
        let filter = BlockFilter {
            enabled: Some(name_set(["a", "b"])),
            disabled: Some(name_set(["b"])),
        };
        assert!(filter.allows("a"));
        assert!(!filter.allows("b"));
        assert!(!filter.allows("c"));
        assert!(BlockFilter::default().allows("anything"));
    }

    #[test]
    fn builders_are_visible_through_accessors() {
        use crate::runtime::operators::OperatorEvaluator;

        let interp = Interpreter::new(OperatorEvaluator::new())
            .with_enabled_blocks(["a"])
            .with_disabled_blocks(["b"]);
        assert!(interp.filter().allows("a"));
        assert!(!interp.filter().allows("b"));

        let sum = Expression::binary(crate::syntax::ast::BinaryOperator::Add, Expression::literal(1), Expression::literal(2));
        assert_eq!(interp.evaluator().evaluate(&sum, &Bare), Ok(Value::from(3)));

        let replaced = interp.with_filter(BlockFilter::default());
        assert_eq!(replaced.filter(), &BlockFilter::default());
    }

    #[test]
    fn first_error_aborts() {
        let module = Module::new(vec![
            Stmt::attribute("ok", Expression::literal(1)),
            Stmt::block("b", vec![], vec![Stmt::attribute("x", Expression::ident("ghost"))]),
            Stmt::attribute("after", Expression::literal(2)),
        ]);
        let (result, events) = run(&Interpreter::default(), &module);
        let err = result.unwrap_err();
        assert_eq!(err.as_configuration().map(|e| e.message.as_str()), Some("attribute \"ghost\" does not exist"));
        assert_eq!(events, vec!["root: set ok = 1", "root: start b []"]);
    }

    #[test]
    fn block_args_use_enclosing_context() {
        let module = Module::new(vec![Stmt::block("b", vec![Expression::ident("depth")], vec![])]);
        let (_, events) = run(&Interpreter::default(), &module);
        assert_eq!(events[0], "root: start b [0]");
    }

    #[test]
    fn bare_root_rejects_first_statement() {
        let module = Module::new(vec![Stmt::block("server", vec![], vec![])]);
        let err = Interpreter::default().execute(&module, &mut Bare).unwrap_err();
        assert_eq!(err.to_string(), "in context of object Bare: block \"server\" does not exist");
    }

    #[test]
    fn empty_module_is_a_no_op() {
        assert_eq!(Interpreter::default().execute(&Module::default(), &mut Bare), Ok(()));
    }
}

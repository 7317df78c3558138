pub mod value;
pub mod configurable;
pub mod evaluator;
pub mod operators;
pub mod interpreter;

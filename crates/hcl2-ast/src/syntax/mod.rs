pub mod token;
pub mod lexer;
pub mod cst;
pub mod grammar;
pub mod ast;
pub mod lower;
pub mod pretty;

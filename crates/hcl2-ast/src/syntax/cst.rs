//! Generic concrete syntax tree produced by the grammar.
//!
//! The tree mirrors grammar productions one to one: every rule the grammar
//! reduces becomes a `Rule` node holding its children in source order.
//! Consumers walk it through the `Transformer` interface, which is keyed by
//! rule name.

use std::fmt;

use crate::syntax::token::Token;

/// Every production the grammar can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Start,
    Body,
    NewLineOrComment,
    Attribute,
    Block,
    Identifier,
    ExprTerm,
    IntLit,
    FloatLit,
    StringLit,
    Tuple,
    Object,
    ObjectElem,
    FunctionCall,
    Arguments,
    GetAttr,
    GetAttrExprTerm,
    Index,
    IndexExprTerm,
    AttrSplat,
    AttrSplatExprTerm,
    FullSplat,
    FullSplatExprTerm,
    UnaryOp,
    BinaryOp,
    BinaryTerm,
    BinaryOperator,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Body => "body",
            Self::NewLineOrComment => "new_line_or_comment",
            Self::Attribute => "attribute",
            Self::Block => "block",
            Self::Identifier => "identifier",
            Self::ExprTerm => "expr_term",
            Self::IntLit => "int_lit",
            Self::FloatLit => "float_lit",
            Self::StringLit => "string_lit",
            Self::Tuple => "tuple",
            Self::Object => "object",
            Self::ObjectElem => "object_elem",
            Self::FunctionCall => "function_call",
            Self::Arguments => "arguments",
            Self::GetAttr => "get_attr",
            Self::GetAttrExprTerm => "get_attr_expr_term",
            Self::Index => "index",
            Self::IndexExprTerm => "index_expr_term",
            Self::AttrSplat => "attr_splat",
            Self::AttrSplatExprTerm => "attr_splat_expr_term",
            Self::FullSplat => "full_splat",
            Self::FullSplatExprTerm => "full_splat_expr_term",
            Self::UnaryOp => "unary_op",
            Self::BinaryOp => "binary_op",
            Self::BinaryTerm => "binary_term",
            Self::BinaryOperator => "binary_operator",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Tree ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Cst {
    Token(Token),
    Rule(RuleNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleNode {
    pub rule: Rule,
    pub children: Vec<Cst>,
    /// Line where the production starts.
    pub line: usize,
}

impl Cst {
    pub fn rule(rule: Rule, line: usize, children: Vec<Cst>) -> Self {
        Cst::Rule(RuleNode { rule, children, line })
    }

    pub fn line(&self) -> usize {
        match self {
            Cst::Token(t) => t.line,
            Cst::Rule(r) => r.line,
        }
    }

    /// Levels from this node down to its deepest leaf, counted without
    /// recursion.
    pub fn height(&self) -> usize {
        let mut tallest = 0;
        let mut pending = vec![(self, 1)];
        while let Some((node, level)) = pending.pop() {
            tallest = tallest.max(level);
            if let Cst::Rule(r) = node {
                pending.extend(r.children.iter().map(|c| (c, level + 1)));
            }
        }
        tallest
    }

    /// Bottom-up walk: children are transformed before their parent's
    /// callback sees them.
    pub fn transform<T: Transformer>(self, t: &mut T) -> Result<T::Output, T::Error> {
        match self {
            Cst::Token(tok) => t.token(tok),
            Cst::Rule(node) => {
                let children = node.children
                    .into_iter()
                    .map(|c| c.transform(t))
                    .collect::<Result<Vec<_>, _>>()?;
                t.rule(node.rule, node.line, children)
            }
        }
    }
}

// ─── Callback interface ───────────────────────────────────────────────────────

/// Rule-keyed callbacks invoked by `Cst::transform`.
pub trait Transformer {
    type Output;
    type Error;

    fn token(&mut self, token: Token) -> Result<Self::Output, Self::Error>;

    fn rule(
        &mut self,
        rule: Rule,
        line: usize,
        children: Vec<Self::Output>,
    ) -> Result<Self::Output, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::token::TokenKind;

    /// Renders the tree as nested s-expressions of rule names.
    struct Shape;

    impl Transformer for Shape {
        type Output = String;
        type Error = ();

        fn token(&mut self, token: Token) -> Result<String, ()> {
            Ok(format!("{:?}", token.kind))
        }

        fn rule(&mut self, rule: Rule, _line: usize, children: Vec<String>) -> Result<String, ()> {
            Ok(format!("({} {})", rule, children.join(" ")))
        }
    }

    #[test]
    fn transform_is_bottom_up_in_order() {
        let tree = Cst::rule(Rule::ExprTerm, 1, vec![
            Cst::rule(Rule::Identifier, 1, vec![Cst::Token(Token::new(TokenKind::Ident("a".into()), 1, 1))]),
            Cst::Token(Token::new(TokenKind::Dot, 1, 2)),
        ]);
        assert_eq!(tree.transform(&mut Shape), Ok("(expr_term (identifier Ident(\"a\")) Dot)".to_string()));
    }

    #[test]
    fn height_counts_levels_to_deepest_leaf() {
        let leaf = || Cst::Token(Token::new(TokenKind::Dot, 1, 1));
        assert_eq!(leaf().height(), 1);
        let tree = Cst::rule(Rule::ExprTerm, 1, vec![
            leaf(),
            Cst::rule(Rule::GetAttr, 1, vec![Cst::rule(Rule::Identifier, 1, vec![leaf()])]),
        ]);
        assert_eq!(tree.height(), 4);
        assert_eq!(Cst::rule(Rule::Start, 1, vec![]).height(), 1);
    }

    #[test]
    fn rule_names_match_grammar_productions() {
        assert_eq!(Rule::GetAttrExprTerm.to_string(), "get_attr_expr_term");
        assert_eq!(Rule::NewLineOrComment.as_str(), "new_line_or_comment");
    }
}

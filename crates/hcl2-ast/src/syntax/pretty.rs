//! Deterministic debug rendering of AST nodes, used by golden tests.
//!
//! Nodes render as `Name(field=value, ...)`. Flat nodes stay on one line; a
//! node with several fields, one of which spans lines, puts each field on
//! its own indented line. Collections put one element per line.

use crate::syntax::ast::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrettyOptions {
    /// Wrap names and values in ANSI colors.
    pub color: bool,
    /// Spaces per nesting level.
    pub indent: usize,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self { color: false, indent: 2 }
    }
}

impl PrettyOptions {
    pub fn colored() -> Self {
        Self { color: true, ..Self::default() }
    }
}

pub fn pformat<P: Pretty + ?Sized>(node: &P, opts: &PrettyOptions) -> String {
    node.pretty(&Printer { opts })
}

pub trait Pretty {
    fn pretty(&self, p: &Printer<'_>) -> String;
}

// ─── Printer ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Color {
    Blue,
    Cyan,
    Yellow,
}

pub struct Printer<'a> {
    opts: &'a PrettyOptions,
}

impl Printer<'_> {
    fn paint(&self, text: &str, color: Color) -> String {
        if !self.opts.color {
            return text.to_string();
        }
        let code = match color {
            Color::Blue => 34,
            Color::Cyan => 36,
            Color::Yellow => 33,
        };
        format!("\x1b[{code}m{text}\x1b[0m")
    }

    fn indent(&self, text: &str) -> String {
        let pad = " ".repeat(self.opts.indent);
        text.lines()
            .map(|line| if line.trim().is_empty() { line.to_string() } else { format!("{pad}{line}") })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn string(&self, s: &str) -> String {
        self.paint(&format!("{s:?}"), Color::Yellow)
    }

    fn value(&self, v: &LiteralValue) -> String {
        let text = match v {
            LiteralValue::String(s) => return self.string(s),
            LiteralValue::Null => "null".to_string(),
            LiteralValue::Bool(b) => b.to_string(),
            LiteralValue::Int(i) => i.to_string(),
            LiteralValue::Float(f) => format!("{f:?}"),
        };
        self.paint(&text, Color::Cyan)
    }

    fn list<P: Pretty>(&self, items: &[P]) -> String {
        if items.is_empty() {
            return "[]".to_string();
        }
        let mut out = String::from("[");
        for item in items {
            out.push('\n');
            out.push_str(&self.indent(&item.pretty(self)));
            out.push(',');
        }
        out.push_str("\n]");
        out
    }

    fn fields(&self, fields: &indexmap::IndexMap<String, Expression>) -> String {
        if fields.is_empty() {
            return "{}".to_string();
        }
        let mut out = String::from("{");
        for (key, value) in fields {
            out.push('\n');
            out.push_str(&self.indent(&format!("{}: {}", self.string(key), value.pretty(self))));
            out.push(',');
        }
        out.push_str("\n}");
        out
    }

    fn node(&self, name: &str, fields: &[(&str, String)]) -> String {
        let args: Vec<String> = fields
            .iter()
            .map(|(field, value)| format!("{}={}", self.paint(field, Color::Cyan), value))
            .collect();
        let body = if args.len() > 1 && args.iter().any(|a| a.contains('\n')) {
            let lines: Vec<String> = args.iter().map(|a| self.indent(a)).collect();
            format!("(\n{}\n)", lines.join(",\n"))
        } else {
            format!("({})", args.join(", "))
        };
        format!("{}{}", self.paint(name, Color::Blue), body)
    }
}

// ─── Nodes ────────────────────────────────────────────────────────────────────

impl Pretty for Module {
    fn pretty(&self, p: &Printer<'_>) -> String {
        p.node("Module", &[("body", p.list(&self.body))])
    }
}

impl Pretty for Stmt {
    fn pretty(&self, p: &Printer<'_>) -> String {
        match self {
            Stmt::Attribute(a) => p.node("Attribute", &[
                ("key", p.string(&a.key)),
                ("value", a.value.pretty(p)),
            ]),
            Stmt::Block(b) => p.node("Block", &[
                ("name", p.string(&b.name)),
                ("args", p.list(&b.args)),
                ("body", p.list(&b.body)),
            ]),
        }
    }
}

impl Pretty for Literal {
    fn pretty(&self, p: &Printer<'_>) -> String {
        p.node("Literal", &[("value", p.value(&self.value))])
    }
}

impl Pretty for Expression {
    fn pretty(&self, p: &Printer<'_>) -> String {
        let kind = self.kind();
        match self {
            Expression::Literal(lit) => lit.pretty(p),
            Expression::Array(a) => p.node(kind, &[("values", p.list(&a.values))]),
            Expression::Object(o) => p.node(kind, &[("fields", p.fields(&o.fields))]),
            Expression::FunctionCall(c) => p.node(kind, &[
                ("name", p.string(&c.name)),
                ("args", p.list(&c.args)),
            ]),
            Expression::Identifier(i) => p.node(kind, &[("name", p.string(&i.name))]),
            Expression::GetAttr(g) => p.node(kind, &[
                ("on", g.on.pretty(p)),
                ("name", p.string(&g.name)),
            ]),
            Expression::GetIndex(g) => p.node(kind, &[
                ("on", g.on.pretty(p)),
                ("index", g.index.pretty(p)),
            ]),
            Expression::AttrSplat(s) => p.node(kind, &[("on", s.on.pretty(p))]),
            Expression::IndexSplat(s) => p.node(kind, &[("on", s.on.pretty(p))]),
            Expression::UnaryOp(u) => p.node(kind, &[
                ("op", p.string(u.op.as_str())),
                ("expr", u.expr.pretty(p)),
            ]),
            Expression::BinaryOp(b) => p.node(kind, &[
                ("op", p.string(b.op.as_str())),
                ("left", b.left.pretty(p)),
                ("right", b.right.pretty(p)),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flat_node_is_inline() {
        let e = Expression::get_attr(Expression::ident("foo"), "bar");
        assert_eq!(
            pformat(&e, &PrettyOptions::default()),
            r#"GetAttr(on=Identifier(name="foo"), name="bar")"#
        );
    }

    #[test]
    fn scalars() {
        let opts = PrettyOptions::default();
        assert_eq!(pformat(&Expression::null(), &opts), "Literal(value=null)");
        assert_eq!(pformat(&Expression::literal(42.0), &opts), "Literal(value=42.0)");
        assert_eq!(pformat(&Expression::literal(-3), &opts), "Literal(value=-3)");
        assert_eq!(pformat(&Expression::literal(true), &opts), "Literal(value=true)");
    }

    #[test]
    fn color_wraps_names_and_values() {
        let out = pformat(&Expression::literal("x"), &PrettyOptions::colored());
        assert_eq!(out, "\x1b[34mLiteral\x1b[0m(\x1b[36mvalue\x1b[0m=\x1b[33m\"x\"\x1b[0m)");
    }

    #[test]
    fn custom_indent() {
        let e = Expression::array(vec![Expression::literal(1)]);
        let opts = PrettyOptions { indent: 4, ..PrettyOptions::default() };
        assert_eq!(pformat(&e, &opts), "Array(values=[\n    Literal(value=1),\n])");
    }
}

//! Owned expression tree with source ranges
//!
//! [hcl_edit] keeps the exact source representation of an expression, which is more than style rules need and less
//! convenient to walk. Expressions are lowered into [Expr] once per file. The shape follows the HCL native syntax
//! tree: a quoted string is a template with a single literal part, `"${x}"` is a template wrapper, and attribute
//! access on a variable extends a scope traversal.
use super::position::{LineIndex, Range};
use hcl_edit::expr::{Expression, ObjectKey, TraversalOperator};
use hcl_edit::template::{Directive, Element, Template};
use hcl_edit::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    /// quoted string or heredoc
    Template(Vec<Expr>),
    /// a template consisting of a single interpolation
    TemplateWrap(Box<Expr>),
    /// `root.path.to.attr`
    ScopeTraversal {
        root: String,
        path: Vec<String>,
    },
    FuncCall(Vec<Expr>),
    Tuple(Vec<Expr>),
    Object(Vec<(Expr, Expr)>),
    Conditional {
        cond: Box<Expr>,
        true_expr: Box<Expr>,
        false_expr: Box<Expr>,
    },
    For {
        collection: Box<Expr>,
        key: Option<Box<Expr>>,
        value: Box<Expr>,
        cond: Option<Box<Expr>>,
    },
    Splat(Box<Expr>),
    GetAttr {
        source: Box<Expr>,
        name: String,
    },
    Index {
        collection: Box<Expr>,
        key: Box<Expr>,
    },
    Parens(Box<Expr>),
    Unary(Box<Expr>),
    Binary {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Source text covered by this expression
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        self.range.slice(source).unwrap_or_default()
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.kind {
            ExprKind::Literal(Literal::Number(number)) => Some(number),
            _ => None,
        }
    }

    /// Direct children, in source order
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Literal(_) | ExprKind::ScopeTraversal { .. } => vec![],
            ExprKind::Template(parts) | ExprKind::FuncCall(parts) | ExprKind::Tuple(parts) => {
                parts.iter().collect()
            }
            ExprKind::Object(items) => items.iter().flat_map(|(k, v)| [k, v]).collect(),
            ExprKind::TemplateWrap(inner)
            | ExprKind::Splat(inner)
            | ExprKind::Parens(inner)
            | ExprKind::Unary(inner)
            | ExprKind::GetAttr { source: inner, .. } => vec![inner.as_ref()],
            ExprKind::Conditional {
                cond,
                true_expr,
                false_expr,
            } => vec![cond.as_ref(), true_expr.as_ref(), false_expr.as_ref()],
            ExprKind::For {
                collection,
                key,
                value,
                cond,
            } => std::iter::once(collection)
                .chain(key)
                .chain(std::iter::once(value))
                .chain(cond)
                .map(|expr| expr.as_ref())
                .collect(),
            ExprKind::Index { collection, key } => vec![collection.as_ref(), key.as_ref()],
            ExprKind::Binary { lhs, rhs } => vec![lhs.as_ref(), rhs.as_ref()],
        }
    }

    /// Whether this expression or any nested expression matches
    pub fn any(&self, predicate: &mut dyn FnMut(&Expr) -> bool) -> bool {
        predicate(self) || self.children().into_iter().any(|child| child.any(predicate))
    }

    /// Whether any scope traversal starts at `root_name` (`var`, `count`, `each`, ...)
    pub fn references(&self, root_name: &str) -> bool {
        self.any(&mut |expr| {
            matches!(&expr.kind, ExprKind::ScopeTraversal { root, .. } if root == root_name)
        })
    }
}

/// Converts [hcl_edit] nodes of one file into owned trees
pub(crate) struct Lowering<'s> {
    pub source: &'s str,
    pub index: &'s LineIndex,
}

impl<'s> Lowering<'s> {
    pub fn range(&self, span: Option<std::ops::Range<usize>>) -> Range {
        self.index.range(self.source, span.unwrap_or(0..0))
    }

    fn node(&self, kind: ExprKind, span: Option<std::ops::Range<usize>>) -> Expr {
        Expr {
            kind,
            range: self.range(span),
        }
    }

    pub fn expr(&self, expr: &Expression) -> Expr {
        let span = expr.span();
        let kind = match expr {
            Expression::Null(_) => ExprKind::Literal(Literal::Null),
            Expression::Bool(value) => ExprKind::Literal(Literal::Bool(*value.value())),
            Expression::Number(number) => ExprKind::Literal(Literal::Number(
                number.value().as_f64().unwrap_or_default(),
            )),
            Expression::String(value) => {
                // the literal part excludes the quotes
                let inner = span
                    .clone()
                    .filter(|span| span.len() >= 2)
                    .map(|span| span.start + 1..span.end - 1);
                ExprKind::Template(vec![self.node(
                    ExprKind::Literal(Literal::String(value.value().to_string())),
                    inner,
                )])
            }
            Expression::Array(array) => {
                ExprKind::Tuple(array.iter().map(|item| self.expr(item)).collect())
            }
            Expression::Object(object) => ExprKind::Object(
                object
                    .iter()
                    .map(|(key, value)| (self.object_key(key), self.expr(value.expr())))
                    .collect(),
            ),
            Expression::StringTemplate(template) => {
                let parts = self.template(template.iter());
                match parts.as_slice() {
                    [single] if is_interpolation(template.iter()) => {
                        ExprKind::TemplateWrap(Box::new(single.clone()))
                    }
                    _ => ExprKind::Template(parts),
                }
            }
            Expression::HeredocTemplate(heredoc) => {
                ExprKind::Template(self.template(heredoc.template.iter()))
            }
            Expression::Parenthesis(parens) => {
                ExprKind::Parens(Box::new(self.expr(parens.inner())))
            }
            Expression::Variable(name) => ExprKind::ScopeTraversal {
                root: name.value().to_string(),
                path: vec![],
            },
            Expression::Conditional(cond) => ExprKind::Conditional {
                cond: Box::new(self.expr(&cond.cond_expr)),
                true_expr: Box::new(self.expr(&cond.true_expr)),
                false_expr: Box::new(self.expr(&cond.false_expr)),
            },
            Expression::FuncCall(call) => {
                ExprKind::FuncCall(call.args.iter().map(|arg| self.expr(arg)).collect())
            }
            Expression::Traversal(traversal) => {
                return self.traversal(&traversal.expr, &traversal.operators, span)
            }
            Expression::UnaryOp(op) => ExprKind::Unary(Box::new(self.expr(&op.expr))),
            Expression::BinaryOp(op) => ExprKind::Binary {
                lhs: Box::new(self.expr(&op.lhs_expr)),
                rhs: Box::new(self.expr(&op.rhs_expr)),
            },
            Expression::ForExpr(for_expr) => ExprKind::For {
                collection: Box::new(self.expr(&for_expr.intro.collection_expr)),
                key: for_expr
                    .key_expr
                    .as_ref()
                    .map(|key| Box::new(self.expr(key))),
                value: Box::new(self.expr(&for_expr.value_expr)),
                cond: for_expr
                    .cond
                    .as_ref()
                    .map(|cond| Box::new(self.expr(&cond.expr))),
            },
        };

        self.node(kind, span)
    }

    fn object_key(&self, key: &ObjectKey) -> Expr {
        match key {
            ObjectKey::Ident(ident) => self.node(
                ExprKind::Literal(Literal::String(ident.value().to_string())),
                ident.span(),
            ),
            ObjectKey::Expression(expr) => self.expr(expr),
        }
    }

    fn traversal(
        &self,
        root: &Expression,
        operators: &[hcl_edit::Decorated<TraversalOperator>],
        span: Option<std::ops::Range<usize>>,
    ) -> Expr {
        let start = root.span().map(|span| span.start).unwrap_or_default();
        let mut current = self.expr(root);

        for operator in operators {
            let end = operator
                .span()
                .or_else(|| span.clone())
                .map(|span| span.end)
                .unwrap_or(start);
            let range = self.range(Some(start..end));

            let kind = match (operator.value(), current.kind) {
                (TraversalOperator::GetAttr(name), ExprKind::ScopeTraversal { root, mut path }) => {
                    path.push(name.value().to_string());
                    ExprKind::ScopeTraversal { root, path }
                }
                (TraversalOperator::GetAttr(name), kind) => ExprKind::GetAttr {
                    source: Box::new(Expr {
                        kind,
                        range: current.range,
                    }),
                    name: name.value().to_string(),
                },
                (TraversalOperator::Index(key), kind) => ExprKind::Index {
                    collection: Box::new(Expr {
                        kind,
                        range: current.range,
                    }),
                    key: Box::new(self.expr(key)),
                },
                (TraversalOperator::LegacyIndex(index), kind) => ExprKind::Index {
                    collection: Box::new(Expr {
                        kind,
                        range: current.range,
                    }),
                    key: Box::new(self.node(
                        ExprKind::Literal(Literal::Number(*index.value() as f64)),
                        index.span(),
                    )),
                },
                (TraversalOperator::AttrSplat(_) | TraversalOperator::FullSplat(_), kind) => {
                    ExprKind::Splat(Box::new(Expr {
                        kind,
                        range: current.range,
                    }))
                }
            };

            current = Expr { kind, range };
        }

        current
    }

    fn template<'t>(&self, elements: impl Iterator<Item = &'t Element>) -> Vec<Expr> {
        let mut parts = vec![];
        for element in elements {
            match element {
                Element::Literal(literal) => parts.push(self.node(
                    ExprKind::Literal(Literal::String(literal.value().to_string())),
                    literal.span(),
                )),
                Element::Interpolation(interpolation) => parts.push(self.expr(&interpolation.expr)),
                Element::Directive(directive) => self.directive(directive, &mut parts),
            }
        }
        parts
    }

    /// Directive contents are flattened into the surrounding template
    fn directive(&self, directive: &Directive, parts: &mut Vec<Expr>) {
        match directive {
            Directive::If(if_directive) => {
                parts.push(self.expr(&if_directive.if_expr.cond_expr));
                parts.extend(self.template_of(&if_directive.if_expr.template));
                if let Some(else_expr) = &if_directive.else_expr {
                    parts.extend(self.template_of(&else_expr.template));
                }
            }
            Directive::For(for_directive) => {
                parts.push(self.expr(&for_directive.for_expr.collection_expr));
                parts.extend(self.template_of(&for_directive.for_expr.template));
            }
        }
    }

    fn template_of(&self, template: &Template) -> Vec<Expr> {
        self.template(template.iter())
    }
}

fn is_interpolation<'t>(mut elements: impl Iterator<Item = &'t Element>) -> bool {
    matches!(
        (elements.next(), elements.next()),
        (Some(Element::Interpolation(_)), None)
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lower(source: &str) -> Expr {
        let body = hcl_edit::parser::parse_body(source).expect("body must parse");
        let index = LineIndex::new("test.tf", source);
        let lowering = Lowering {
            source,
            index: &index,
        };
        let attribute = body.attributes().next().expect("attribute");
        lowering.expr(&attribute.value)
    }

    #[test]
    fn quoted_string_is_template() {
        let source = "a = \"abc\"\n";
        let expr = lower(source);
        let ExprKind::Template(parts) = &expr.kind else {
            panic!("expected template, got {expr:?}");
        };
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].text(source), "abc");
        assert_eq!(expr.text(source), "\"abc\"");
    }

    #[test]
    fn template_wrap() {
        let expr = lower("a = \"${var.x}\"\n");
        let ExprKind::TemplateWrap(inner) = &expr.kind else {
            panic!("expected template wrap, got {expr:?}");
        };
        assert_eq!(
            inner.kind,
            ExprKind::ScopeTraversal {
                root: "var".into(),
                path: vec!["x".into()]
            }
        );
    }

    #[test]
    fn traversal_ranges() {
        let source = "a = local.items[0].name\n";
        let expr = lower(source);
        assert_eq!(expr.text(source), "local.items[0].name");

        let ExprKind::GetAttr { source: inner, name } = &expr.kind else {
            panic!("expected attribute access, got {expr:?}");
        };
        assert_eq!(name, "name");
        assert_eq!(inner.text(source), "local.items[0]");
    }

    #[test]
    fn references() {
        assert!(lower("a = \"web-${count.index}\"\n").references("count"));
        assert!(lower("a = [for k, v in x : each.key]\n").references("each"));
        assert!(!lower("a = { b = var.c }\n").references("count"));
    }
}

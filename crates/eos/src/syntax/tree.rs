//! Owned structure tree: bodies, blocks and attributes
use super::expr::{Expr, Lowering};
use super::position::Range;
use hcl::eval::Evaluate;
use hcl_edit::structure::{BlockLabel, Structure};
use hcl_edit::Span;

#[derive(Debug, Clone, Default)]
pub struct Body {
    pub attributes: Vec<Attribute>,
    pub blocks: Vec<Block>,
}

impl Body {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub expr: Expr,
    /// from the start of the name to the end of the value
    pub range: Range,
    /// the value as an evaluable expression
    pub value: hcl::Expression,
}

impl Attribute {
    /// Evaluate the value without any variables or functions in scope
    ///
    /// Returns `None` if the value depends on anything but literals.
    pub fn evaluate(&self) -> Option<hcl::Value> {
        self.value.evaluate(&hcl::eval::Context::new()).ok()
    }

    /// The value if it evaluates to a string
    pub fn as_string(&self) -> Option<String> {
        match self.evaluate()? {
            hcl::Value::String(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub value: String,
    pub range: Range,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub kind: String,
    pub kind_range: Range,
    pub labels: Vec<Label>,
    pub body: Body,
    /// from the keyword to the closing brace
    pub range: Range,
}

impl Block {
    /// From the keyword to the end of the last label
    pub fn header_range(&self) -> Range {
        match self.labels.last() {
            Some(label) => self.kind_range.to(&label.range),
            None => self.kind_range.clone(),
        }
    }
}

impl Lowering<'_> {
    pub fn body(&self, body: &hcl_edit::structure::Body) -> Body {
        let mut lowered = Body::default();
        for structure in body.iter() {
            match structure {
                Structure::Attribute(attribute) => {
                    lowered.attributes.push(self.attribute(attribute))
                }
                Structure::Block(block) => lowered.blocks.push(self.block(block)),
            }
        }
        lowered
    }

    fn attribute(&self, attribute: &hcl_edit::structure::Attribute) -> Attribute {
        let name_span = attribute.key.span();
        let expr = self.expr(&attribute.value);
        let span = match (&name_span, attribute.value.span()) {
            (Some(name), Some(value)) => Some(name.start..value.end),
            _ => attribute.span(),
        };

        Attribute {
            name: attribute.key.as_str().to_string(),
            expr,
            range: self.range(span),
            value: attribute.value.clone().into(),
        }
    }

    fn block(&self, block: &hcl_edit::structure::Block) -> Block {
        let kind_range = self.range(block.ident.span());
        let labels: Vec<Label> = block
            .labels
            .iter()
            .map(|label| {
                let span = match label {
                    BlockLabel::Ident(ident) => ident.span(),
                    BlockLabel::String(string) => string.span(),
                };
                Label {
                    value: label.as_str().to_string(),
                    range: self.range(span),
                }
            })
            .collect();

        let range = match block.span() {
            Some(span) => self.range(Some(span)),
            None => match labels.last() {
                Some(label) => kind_range.to(&label.range),
                None => kind_range.clone(),
            },
        };

        Block {
            kind: block.ident.as_str().to_string(),
            kind_range,
            labels,
            body: self.body(&block.body),
            range,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::syntax::position::LineIndex;
    use pretty_assertions::assert_eq;

    fn lower(source: &str) -> Body {
        let body = hcl_edit::parser::parse_body(source).expect("body must parse");
        let index = LineIndex::new("test.tf", source);
        Lowering {
            source,
            index: &index,
        }
        .body(&body)
    }

    #[test]
    fn block_ranges() {
        let source = "resource \"aws_instance\" \"web\" {\n  ami = \"abc\"\n}\n";
        let body = lower(source);
        let block = &body.blocks[0];

        assert_eq!(block.kind, "resource");
        assert_eq!(
            block.labels.iter().map(|l| l.value.as_str()).collect::<Vec<_>>(),
            vec!["aws_instance", "web"]
        );
        assert_eq!(
            block.header_range().slice(source),
            Some("resource \"aws_instance\" \"web\"")
        );
        assert_eq!(
            block.range.slice(source).map(str::trim_end),
            Some(source.trim_end())
        );

        let ami = block.body.attribute("ami").expect("ami");
        assert_eq!(ami.range.slice(source), Some("ami = \"abc\""));
        assert_eq!(ami.range.start.line, 2);
        assert_eq!(ami.range.start.column, 3);
    }

    #[test]
    fn evaluate_literals() {
        let body = lower("a = \"x\"\nb = \"${var.c}\"\nc = 1\n");
        assert_eq!(body.attribute("a").and_then(Attribute::as_string), Some("x".into()));
        assert_eq!(body.attribute("b").and_then(Attribute::as_string), None);
        assert_eq!(body.attribute("c").and_then(Attribute::as_string), None);
    }
}

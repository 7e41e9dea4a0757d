//! Token stream of a configuration file
//!
//! The lexer follows the token model of the HCL native syntax: line comments (`#`, `//`) include their terminating
//! newline, newlines outside of comments are tokens of their own, heredoc openers include the newline after the
//! delimiter, and template strings are split into literal and interpolation tokens.
//!
//! Only what style rules need is modelled. Number and identifier tokens are not validated beyond their shape.
use super::position::{LineIndex, Pos, Range};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Comment,
    Newline,
    Eof,
    Identifier,
    Number,

    OQuote,
    CQuote,
    QuotedLit,
    HeredocOpen,
    HeredocClose,
    StringLit,
    TemplateInterp,
    TemplateControl,
    TemplateSeqEnd,

    OBrace,
    CBrace,
    OBrack,
    CBrack,
    OParen,
    CParen,
    Comma,
    Dot,
    Ellipsis,
    Question,
    Colon,
    FatArrow,

    Equal,
    EqualOp,
    NotEqual,
    LessThan,
    LessThanEq,
    GreaterThan,
    GreaterThanEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    And,
    Or,
    Bang,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub range: Range,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("{filename}:{}:{}: invalid character {found:?}", .pos.line, .pos.column)]
    InvalidCharacter {
        filename: String,
        pos: Pos,
        found: char,
    },
    #[error("{filename}:{}:{}: unterminated {what}", .pos.line, .pos.column)]
    Unterminated {
        filename: String,
        pos: Pos,
        what: &'static str,
    },
}

/// Lex a whole file
///
/// The returned stream always ends with a single [TokenKind::Eof] token.
pub fn lex(source: &str, filename: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source, filename).run()
}

#[derive(Debug)]
enum Mode {
    /// Inside `"..."`
    Quoted,
    /// Inside a heredoc body, `at_line_start` tracks whether the closing delimiter may follow
    Heredoc {
        delimiter: String,
        at_line_start: bool,
    },
    /// Inside `${ ... }` or `%{ ... }`, counting nested braces
    Interpolation { depth: usize },
}

struct Lexer<'s> {
    source: &'s str,
    bytes: &'s [u8],
    index: LineIndex,
    offset: usize,
    modes: Vec<Mode>,
    tokens: Vec<Token>,
}

impl<'s> Lexer<'s> {
    fn new(source: &'s str, filename: &str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            index: LineIndex::new(filename, source),
            offset: 0,
            modes: Vec::new(),
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        while self.offset < self.bytes.len() {
            match self.modes.last() {
                Some(Mode::Quoted) => self.quoted()?,
                Some(Mode::Heredoc { .. }) => self.heredoc()?,
                Some(Mode::Interpolation { .. }) | None => self.expression()?,
            }
        }

        if let Some(mode) = self.modes.last() {
            let what = match mode {
                Mode::Quoted => "string",
                Mode::Heredoc { .. } => "heredoc",
                Mode::Interpolation { .. } => "template interpolation",
            };
            return Err(self.unterminated(self.bytes.len(), what));
        }

        self.push(TokenKind::Eof, self.bytes.len(), self.bytes.len());
        tracing::trace!(
            filename = self.index.filename(),
            count = self.tokens.len(),
            "lexed"
        );
        Ok(self.tokens)
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            text: self.source[start..end].to_string(),
            range: self.index.range(self.source, start..end),
        });
        self.offset = end;
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.offset + ahead).copied()
    }

    fn unterminated(&self, at: usize, what: &'static str) -> LexError {
        LexError::Unterminated {
            filename: self.index.filename().to_string(),
            pos: self.index.pos(self.source, at),
            what,
        }
    }

    /// Byte offset just past the end of the current line, including the newline
    fn line_end(&self, from: usize) -> usize {
        self.source[from..]
            .find('\n')
            .map(|idx| from + idx + 1)
            .unwrap_or(self.bytes.len())
    }

    fn expression(&mut self) -> Result<(), LexError> {
        let start = self.offset;
        let Some(current) = self.source[start..].chars().next() else {
            return Ok(());
        };

        match current {
            ' ' | '\t' => {
                self.offset += 1;
            }
            '\r' if self.peek(1) == Some(b'\n') => self.push(TokenKind::Newline, start, start + 2),
            '\n' => self.push(TokenKind::Newline, start, start + 1),
            '#' => self.push(TokenKind::Comment, start, self.line_end(start)),
            '/' if self.peek(1) == Some(b'/') => {
                self.push(TokenKind::Comment, start, self.line_end(start))
            }
            '/' if self.peek(1) == Some(b'*') => {
                let Some(close) = self.source[start + 2..].find("*/") else {
                    return Err(self.unterminated(start, "block comment"));
                };
                self.push(TokenKind::Comment, start, start + 2 + close + 2);
            }
            '"' => {
                self.push(TokenKind::OQuote, start, start + 1);
                self.modes.push(Mode::Quoted);
            }
            '<' if self.peek(1) == Some(b'<') => self.heredoc_open(start)?,
            '{' => {
                if let Some(Mode::Interpolation { depth }) = self.modes.last_mut() {
                    *depth += 1;
                }
                self.push(TokenKind::OBrace, start, start + 1);
            }
            '~' if self.peek(1) == Some(b'}')
                && matches!(self.modes.last(), Some(Mode::Interpolation { depth: 0 })) =>
            {
                self.modes.pop();
                self.push(TokenKind::TemplateSeqEnd, start, start + 2);
            }
            '}' => match self.modes.last_mut() {
                Some(Mode::Interpolation { depth: 0 }) => {
                    self.modes.pop();
                    self.push(TokenKind::TemplateSeqEnd, start, start + 1);
                }
                Some(Mode::Interpolation { depth }) => {
                    *depth -= 1;
                    self.push(TokenKind::CBrace, start, start + 1);
                }
                _ => self.push(TokenKind::CBrace, start, start + 1),
            },
            c if c.is_ascii_digit() => self.number(start),
            c if c.is_alphabetic() || c == '_' => {
                let len = self.source[start..]
                    .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
                    .unwrap_or(self.source.len() - start);
                self.push(TokenKind::Identifier, start, start + len);
            }
            _ => self.punctuation(start, current)?,
        }

        Ok(())
    }

    fn number(&mut self, start: usize) {
        let digits = |from: usize| {
            self.source[from..]
                .find(|c: char| !c.is_ascii_digit())
                .map(|idx| from + idx)
                .unwrap_or(self.bytes.len())
        };

        let mut end = digits(start);
        if self.bytes.get(end) == Some(&b'.')
            && self.bytes.get(end + 1).is_some_and(u8::is_ascii_digit)
        {
            end = digits(end + 1);
        }
        if matches!(self.bytes.get(end), Some(b'e' | b'E')) {
            let mut exponent = end + 1;
            if matches!(self.bytes.get(exponent), Some(b'+' | b'-')) {
                exponent += 1;
            }
            if self.bytes.get(exponent).is_some_and(u8::is_ascii_digit) {
                end = digits(exponent);
            }
        }

        self.push(TokenKind::Number, start, end);
    }

    fn punctuation(&mut self, start: usize, current: char) -> Result<(), LexError> {
        let next = self.peek(1);
        let (kind, len) = match (current, next) {
            ('=', Some(b'=')) => (TokenKind::EqualOp, 2),
            ('=', Some(b'>')) => (TokenKind::FatArrow, 2),
            ('=', _) => (TokenKind::Equal, 1),
            ('!', Some(b'=')) => (TokenKind::NotEqual, 2),
            ('!', _) => (TokenKind::Bang, 1),
            ('<', Some(b'=')) => (TokenKind::LessThanEq, 2),
            ('<', _) => (TokenKind::LessThan, 1),
            ('>', Some(b'=')) => (TokenKind::GreaterThanEq, 2),
            ('>', _) => (TokenKind::GreaterThan, 1),
            ('&', Some(b'&')) => (TokenKind::And, 2),
            ('|', Some(b'|')) => (TokenKind::Or, 2),
            ('.', Some(b'.')) if self.peek(2) == Some(b'.') => (TokenKind::Ellipsis, 3),
            ('.', _) => (TokenKind::Dot, 1),
            ('[', _) => (TokenKind::OBrack, 1),
            (']', _) => (TokenKind::CBrack, 1),
            ('(', _) => (TokenKind::OParen, 1),
            (')', _) => (TokenKind::CParen, 1),
            (',', _) => (TokenKind::Comma, 1),
            ('?', _) => (TokenKind::Question, 1),
            (':', _) => (TokenKind::Colon, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('%', _) => (TokenKind::Percent, 1),
            (found, _) => {
                return Err(LexError::InvalidCharacter {
                    filename: self.index.filename().to_string(),
                    pos: self.index.pos(self.source, start),
                    found,
                })
            }
        };

        self.push(kind, start, start + len);
        Ok(())
    }

    /// `<<EOF` or `<<-EOF`, the token includes the rest of the line
    fn heredoc_open(&mut self, start: usize) -> Result<(), LexError> {
        let mut cursor = start + 2;
        if self.bytes.get(cursor) == Some(&b'-') {
            cursor += 1;
        }

        let name_len = self.source[cursor..]
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(self.source.len() - cursor);
        let delimiter = &self.source[cursor..cursor + name_len];

        let end = self.line_end(cursor + name_len);
        let trailing = &self.source[cursor + name_len..end];
        if delimiter.is_empty() || !trailing.trim().is_empty() || !trailing.ends_with('\n') {
            return Err(LexError::InvalidCharacter {
                filename: self.index.filename().to_string(),
                pos: self.index.pos(self.source, start),
                found: '<',
            });
        }

        let delimiter = delimiter.to_string();
        self.push(TokenKind::HeredocOpen, start, end);
        self.modes.push(Mode::Heredoc {
            delimiter,
            at_line_start: true,
        });
        Ok(())
    }

    fn quoted(&mut self) -> Result<(), LexError> {
        let start = self.offset;
        let mut cursor = start;

        while cursor < self.bytes.len() {
            match self.bytes[cursor] {
                b'"' => {
                    if cursor > start {
                        self.push(TokenKind::QuotedLit, start, cursor);
                    }
                    self.modes.pop();
                    self.push(TokenKind::CQuote, cursor, cursor + 1);
                    return Ok(());
                }
                b'\\' => cursor += 2,
                b'\n' => return Err(self.unterminated(start, "string")),
                b'$' | b'%' if self.bytes.get(cursor + 1) == Some(&b'{') => {
                    if cursor > start {
                        self.push(TokenKind::QuotedLit, start, cursor);
                    }
                    self.template_open(cursor);
                    return Ok(());
                }
                // `$${` and `%%{` are escapes
                b'$' | b'%' if self.bytes.get(cursor + 1) == Some(&self.bytes[cursor]) => {
                    cursor += 2
                }
                _ => cursor += 1,
            }
        }

        Err(self.unterminated(start, "string"))
    }

    fn heredoc(&mut self) -> Result<(), LexError> {
        let start = self.offset;
        let Some(Mode::Heredoc {
            delimiter,
            at_line_start,
        }) = self.modes.last()
        else {
            return Ok(());
        };

        if *at_line_start {
            let line_end = self.line_end(start);
            let line = self.source[start..line_end].trim_end_matches(['\r', '\n']);
            if line.trim() == delimiter {
                let close_start = start + (line.len() - line.trim_start().len());
                let close_end = close_start + delimiter.len();
                self.modes.pop();
                self.push(TokenKind::HeredocClose, close_start, close_end);
                return Ok(());
            }
        }

        let line_end = self.line_end(start);
        let mut cursor = start;
        while cursor < line_end {
            match self.bytes[cursor] {
                b'$' | b'%' if self.bytes.get(cursor + 1) == Some(&b'{') => {
                    if cursor > start {
                        self.push(TokenKind::StringLit, start, cursor);
                    }
                    self.set_line_start(false);
                    self.template_open(cursor);
                    return Ok(());
                }
                b'$' | b'%' if self.bytes.get(cursor + 1) == Some(&self.bytes[cursor]) => {
                    cursor += 2
                }
                _ => cursor += 1,
            }
        }

        self.push(TokenKind::StringLit, start, line_end);
        self.set_line_start(self.source[..line_end].ends_with('\n'));
        Ok(())
    }

    fn set_line_start(&mut self, value: bool) {
        if let Some(Mode::Heredoc { at_line_start, .. }) = self.modes.last_mut() {
            *at_line_start = value;
        }
    }

    fn template_open(&mut self, at: usize) {
        let kind = if self.bytes[at] == b'$' {
            TokenKind::TemplateInterp
        } else {
            TokenKind::TemplateControl
        };
        // `${~` and `%{~` strip whitespace before the template
        let len = if self.bytes.get(at + 2) == Some(&b'~') { 3 } else { 2 };
        self.push(kind, at, at + len);
        self.modes.push(Mode::Interpolation { depth: 0 });
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source, "test.tf")
            .expect("must lex")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn attribute() {
        use TokenKind::*;
        assert_eq!(
            kinds("a = \"b\"\n"),
            vec![Identifier, Equal, OQuote, QuotedLit, CQuote, Newline, Eof]
        );
    }

    #[test]
    fn line_comments_include_newline() {
        let tokens = lex("# one\n// two\nx = 1 # three\n", "test.tf").unwrap();

        let comments: Vec<_> = tokens
            .iter()
            .filter(|token| token.is(TokenKind::Comment))
            .collect();
        assert_eq!(comments.len(), 3);
        assert_eq!(comments[0].text, "# one\n");
        assert_eq!(comments[0].range.end.line, 2);
        assert_eq!(comments[0].range.end.column, 1);
        assert_eq!(comments[2].range.start.column, 7);

        // no newline token follows a line comment
        assert_eq!(tokens[1].kind, TokenKind::Comment);
    }

    #[test]
    fn block_comment() {
        use TokenKind::*;
        assert_eq!(kinds("/* a\n b */\n"), vec![Comment, Newline, Eof]);
        assert!(matches!(
            lex("/* open", "test.tf"),
            Err(LexError::Unterminated { .. })
        ));
    }

    #[test]
    fn interpolation() {
        use TokenKind::*;
        assert_eq!(
            kinds("a = \"x-${var.y[\"k\"]}-${ { b = 1 }.b }\""),
            vec![
                Identifier, Equal, OQuote, QuotedLit, TemplateInterp, Identifier, Dot, Identifier,
                OBrack, OQuote, QuotedLit, CQuote, CBrack, TemplateSeqEnd, QuotedLit,
                TemplateInterp, OBrace, Identifier, Equal, Number, CBrace, Dot, Identifier,
                TemplateSeqEnd, CQuote, Eof
            ]
        );
    }

    #[test]
    fn heredoc() {
        use TokenKind::*;
        let source = "a = <<-EOT\n  hello ${name}\n  EOT\nb = 1\n";
        let tokens = lex(source, "test.tf").unwrap();
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                Identifier, Equal, HeredocOpen, StringLit, TemplateInterp, Identifier,
                TemplateSeqEnd, StringLit, HeredocClose, Newline, Identifier, Equal, Number,
                Newline, Eof
            ]
        );
        assert_eq!(tokens[2].text, "<<-EOT\n");
        assert_eq!(tokens[8].text, "EOT");
    }

    #[test]
    fn strip_markers() {
        use TokenKind::*;
        let tokens = lex("a = \"%{ for x in var.l ~}${~ x ~}%{ endfor ~}\"\n", "test.tf").unwrap();
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                Identifier, Equal, OQuote, TemplateControl, Identifier, Identifier, Identifier,
                Identifier, Dot, Identifier, TemplateSeqEnd, TemplateInterp, Identifier,
                TemplateSeqEnd, TemplateControl, Identifier, TemplateSeqEnd, CQuote, Newline, Eof
            ]
        );
        assert_eq!(tokens[10].text, "~}");
        assert_eq!(tokens[11].text, "${~");
    }

    #[test]
    fn heredoc_close_with_trailing_blanks() {
        use TokenKind::*;
        let tokens = lex("a = <<-EOT\n  hi\n  EOT  \nb = 1\n", "test.tf").unwrap();
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                Identifier, Equal, HeredocOpen, StringLit, HeredocClose, Newline, Identifier,
                Equal, Number, Newline, Eof
            ]
        );
        assert_eq!(tokens[4].text, "EOT");
    }

    #[test]
    fn invalid_character() {
        assert!(matches!(
            lex("a = 1;\n", "test.tf"),
            Err(LexError::InvalidCharacter { found: ';', .. })
        ));
    }
}

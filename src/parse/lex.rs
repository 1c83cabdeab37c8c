//! Hand-rolled tokenizer over byte offsets. Every token carries its span so
//! parse errors can point at the offending source range.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokKind {
    Ident,
    Lt,        // <
    Gt,        // >
    Colon,     // :
    ColonColon,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    /// Anything the lexer does not recognize; surfaced by the parser as a
    /// grammar error rather than a lex failure, so spans stay intact.
    Unknown,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Tok {
    pub kind: TokKind,
    pub span: Span,
}

impl Tok {
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.span.start..self.span.end]
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Tokenize the whole input. Never fails: unrecognized bytes become
/// `Unknown` tokens. Comments (`# ...` to end of line) are skipped.
pub fn tokenize(src: &str) -> Vec<Tok> {
    let mut toks = Vec::new();
    let mut it = src.char_indices().peekable();

    while let Some(&(i, c)) = it.peek() {
        if c.is_whitespace() {
            it.next();
            continue;
        }
        if c == '#' {
            // line comment
            while let Some(&(_, c)) = it.peek() {
                if c == '\n' { break; }
                it.next();
            }
            continue;
        }
        if is_ident_start(c) {
            let start = i;
            let mut end = i + c.len_utf8();
            it.next();
            while let Some(&(j, c)) = it.peek() {
                if is_ident_continue(c) {
                    end = j + c.len_utf8();
                    it.next();
                } else {
                    break;
                }
            }
            toks.push(Tok { kind: TokKind::Ident, span: Span::new(start, end) });
            continue;
        }

        let kind = match c {
            '<' => TokKind::Lt,
            '>' => TokKind::Gt,
            ':' => TokKind::Colon,
            ',' => TokKind::Comma,
            '(' => TokKind::LParen,
            ')' => TokKind::RParen,
            '[' => TokKind::LBracket,
            ']' => TokKind::RBracket,
            '{' => TokKind::LBrace,
            '}' => TokKind::RBrace,
            _ => TokKind::Unknown,
        };
        let mut end = i + c.len_utf8();
        it.next();

        // fuse `::`
        let kind = if kind == TokKind::Colon {
            if let Some(&(j, ':')) = it.peek() {
                end = j + 1;
                it.next();
                TokKind::ColonColon
            } else {
                TokKind::Colon
            }
        } else {
            kind
        };

        toks.push(Tok { kind, span: Span::new(i, end) });
    }

    toks.push(Tok { kind: TokKind::Eof, span: Span::new(src.len(), src.len()) });
    toks
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_full_declaration_shape() {
        let src = "sealed pub Drone<S: DroneState>(state_mod::StateLimit)[Idle]{x: float}";
        let toks = tokenize(src);
        let kinds: Vec<TokKind> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![
            TokKind::Ident, TokKind::Ident, TokKind::Ident,
            TokKind::Lt, TokKind::Ident, TokKind::Colon, TokKind::Ident, TokKind::Gt,
            TokKind::LParen, TokKind::Ident, TokKind::ColonColon, TokKind::Ident, TokKind::RParen,
            TokKind::LBracket, TokKind::Ident, TokKind::RBracket,
            TokKind::LBrace, TokKind::Ident, TokKind::Colon, TokKind::Ident, TokKind::RBrace,
            TokKind::Eof,
        ]);
        assert_eq!(toks[2].text(src), "Drone");
    }

    #[test]
    fn double_colon_fuses_single_colon_does_not() {
        let toks = tokenize("a::b:c");
        let kinds: Vec<TokKind> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![
            TokKind::Ident, TokKind::ColonColon, TokKind::Ident,
            TokKind::Colon, TokKind::Ident, TokKind::Eof,
        ]);
    }

    #[test]
    fn comments_and_whitespace_are_skipped() {
        let toks = tokenize("  # a comment\n  Foo \n");
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[0].kind, TokKind::Ident);
    }

    #[test]
    fn unknown_bytes_become_unknown_tokens() {
        let toks = tokenize("Foo @ Bar");
        assert_eq!(toks[1].kind, TokKind::Unknown);
        // spans survive so the parser can point at the '@'
        assert_eq!(toks[1].span, Span::new(4, 5));
    }

    #[test]
    fn spans_survive_multibyte_whitespace() {
        // U+00A0 no-break space before the ident
        let src = "\u{a0}Foo";
        let toks = tokenize(src);
        assert_eq!(toks[0].kind, TokKind::Ident);
        assert_eq!(toks[0].text(src), "Foo");
    }
}

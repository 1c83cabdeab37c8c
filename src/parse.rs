//! Recursive-descent parser for typestate declarations (single-file).
//!
//! Turns raw declaration text into `ast::StateSchema` values. Grammar:
//!
//! ```text
//! decl       := strictness? visibility? IDENT '<' IDENT bound? '>' seal? states fields
//! strictness := 'constrained' | 'sealed'        (absent => Unconstrained)
//! visibility := 'pub'                           (absent => Private)
//! bound      := ':' IDENT
//! seal       := '(' IDENT '::' IDENT ')'
//! states     := '[' IDENT (',' IDENT)* ','? ']'
//! fields     := '{' (field (',' field)* ','?)? '}'
//! field      := IDENT ':' TYPE
//! ```
//!
//! Design goals:
//! - Pure transform: text in, schema or `MalformedDeclaration` out.
//! - Errors name the first grammar rule that failed plus the token span.
//! - Defaulting (bound/seal names) is a post-parse pass, not grammar magic.
//! - An input may hold several declarations; each parses independently and
//!   a failure skips ahead so siblings still come through.
pub mod lex;

use thiserror::Error;

use crate::ast::{FieldDecl, FieldTy, StateSchema, Strictness, Visibility};
use lex::{Span, Tok, TokKind};

// ------------------------------- Errors ----------------------------------- //

/// Grammar rules, used to identify where a parse gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseRule {
    CarrierName,
    StateParamClause,
    StateParamName,
    BoundName,
    SealClause,
    StateList,
    StateName,
    FieldList,
    FieldName,
    FieldType,
    DeclarationEnd,
}

impl std::fmt::Display for ParseRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParseRule::CarrierName => "carrier name",
            ParseRule::StateParamClause => "state-parameter clause `<..>`",
            ParseRule::StateParamName => "state parameter name",
            ParseRule::BoundName => "bound name after `:`",
            ParseRule::SealClause => "sealing clause `(module::Trait)`",
            ParseRule::StateList => "state list `[..]`",
            ParseRule::StateName => "state name",
            ParseRule::FieldList => "field list `{..}`",
            ParseRule::FieldName => "field name",
            ParseRule::FieldType => "field type",
            ParseRule::DeclarationEnd => "end of declaration",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed declaration: expected {rule}, found `{found}` at {span}")]
pub struct MalformedDeclaration {
    pub rule: ParseRule,
    pub span: Span,
    pub found: String,
}

// ------------------------------- Cursor ----------------------------------- //

struct Cursor<'a> {
    src: &'a str,
    toks: Vec<Tok>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, toks: lex::tokenize(src), pos: 0 }
    }

    fn peek(&self) -> &Tok {
        &self.toks[self.pos.min(self.toks.len() - 1)]
    }

    fn bump(&mut self) -> Tok {
        let t = self.peek().clone();
        if self.pos < self.toks.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn at(&self, kind: TokKind) -> bool {
        self.peek().kind == kind
    }

    fn at_eof(&self) -> bool {
        self.at(TokKind::Eof)
    }

    fn err(&self, rule: ParseRule) -> MalformedDeclaration {
        let t = self.peek();
        MalformedDeclaration {
            rule,
            span: t.span,
            found: t.text(self.src).to_string(),
        }
    }

    fn expect(&mut self, kind: TokKind, rule: ParseRule) -> Result<Tok, MalformedDeclaration> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.err(rule))
        }
    }

    fn expect_ident(&mut self, rule: ParseRule) -> Result<String, MalformedDeclaration> {
        let t = self.expect(TokKind::Ident, rule)?;
        Ok(t.text(self.src).to_string())
    }

    /// Consume an ident only if it equals `kw`.
    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.at(TokKind::Ident) && self.peek().text(self.src) == kw {
            self.bump();
            true
        } else {
            false
        }
    }
}

// ------------------------------- Parsing ---------------------------------- //

/// Parse exactly one declaration; trailing input is an error.
pub fn parse_one(src: &str) -> Result<StateSchema, MalformedDeclaration> {
    let mut cur = Cursor::new(src);
    let schema = parse_decl(&mut cur)?;
    if !cur.at_eof() {
        return Err(cur.err(ParseRule::DeclarationEnd));
    }
    Ok(schema)
}

/// Parse every declaration in the input. One declaration's failure does not
/// affect its siblings: on error we skip past the next `}` (the end of the
/// broken declaration in practice) and resume.
pub fn parse_all(src: &str) -> Vec<Result<StateSchema, MalformedDeclaration>> {
    let mut cur = Cursor::new(src);
    let mut out = Vec::new();
    while !cur.at_eof() {
        match parse_decl(&mut cur) {
            Ok(schema) => out.push(Ok(schema)),
            Err(e) => {
                out.push(Err(e));
                recover(&mut cur);
            }
        }
    }
    out
}

fn parse_decl(cur: &mut Cursor) -> Result<StateSchema, MalformedDeclaration> {
    // strictness keyword, absent => Unconstrained
    let strictness = if cur.eat_keyword("sealed") {
        Strictness::Sealed
    } else if cur.eat_keyword("constrained") {
        Strictness::Constrained
    } else {
        Strictness::Unconstrained
    };

    let visibility = if cur.eat_keyword("pub") {
        Visibility::Public
    } else {
        Visibility::Private
    };

    let carrier_name = cur.expect_ident(ParseRule::CarrierName)?;

    // state-parameter clause
    cur.expect(TokKind::Lt, ParseRule::StateParamClause)?;
    let state_param = cur.expect_ident(ParseRule::StateParamName)?;
    let bound_name = if cur.at(TokKind::Colon) {
        cur.bump();
        Some(cur.expect_ident(ParseRule::BoundName)?)
    } else {
        None
    };
    cur.expect(TokKind::Gt, ParseRule::StateParamClause)?;

    // optional sealing clause
    let (seal_module, seal_trait) = if cur.at(TokKind::LParen) {
        cur.bump();
        let module = cur.expect_ident(ParseRule::SealClause)?;
        cur.expect(TokKind::ColonColon, ParseRule::SealClause)?;
        let trait_ = cur.expect_ident(ParseRule::SealClause)?;
        cur.expect(TokKind::RParen, ParseRule::SealClause)?;
        (Some(module), Some(trait_))
    } else {
        (None, None)
    };

    let states = parse_states(cur)?;
    let fields = parse_fields(cur)?;

    let mut schema = StateSchema {
        carrier_name,
        state_param,
        visibility,
        strictness,
        states,
        fields,
        bound_name,
        seal_module,
        seal_trait,
    };
    // Emptiness/uniqueness/strictness consistency are the validator's job;
    // the parser only fills documented defaults.
    schema.apply_defaults();
    Ok(schema)
}

fn parse_states(cur: &mut Cursor) -> Result<Vec<String>, MalformedDeclaration> {
    cur.expect(TokKind::LBracket, ParseRule::StateList)?;
    let mut states = Vec::new();
    loop {
        if cur.at(TokKind::RBracket) {
            cur.bump();
            break;
        }
        states.push(cur.expect_ident(ParseRule::StateName)?);
        if cur.at(TokKind::Comma) {
            cur.bump();
            continue;
        }
        cur.expect(TokKind::RBracket, ParseRule::StateList)?;
        break;
    }
    Ok(states)
}

fn parse_fields(cur: &mut Cursor) -> Result<Vec<FieldDecl>, MalformedDeclaration> {
    cur.expect(TokKind::LBrace, ParseRule::FieldList)?;
    let mut fields = Vec::new();
    loop {
        if cur.at(TokKind::RBrace) {
            cur.bump();
            break;
        }
        let name = cur.expect_ident(ParseRule::FieldName)?;
        cur.expect(TokKind::Colon, ParseRule::FieldType)?;
        let ty = parse_field_type(cur)?;
        fields.push(FieldDecl { name, ty });
        if cur.at(TokKind::Comma) {
            cur.bump();
            continue;
        }
        cur.expect(TokKind::RBrace, ParseRule::FieldList)?;
        break;
    }
    Ok(fields)
}

/// Field types are captured verbatim: a raw token run at bracket depth 0,
/// ending at `,` or `}`. This keeps the grammar open to arbitrary target
/// types (`Vec<f64>`, `std::path::PathBuf`) without modeling them.
fn parse_field_type(cur: &mut Cursor) -> Result<FieldTy, MalformedDeclaration> {
    let start_tok = cur.peek().clone();
    let start = start_tok.span.start;
    let mut end = start;
    let mut depth: u32 = 0;

    loop {
        let t = cur.peek();
        match t.kind {
            TokKind::Eof => break,
            TokKind::Comma | TokKind::RBrace if depth == 0 => break,
            TokKind::Lt | TokKind::LParen | TokKind::LBracket => depth += 1,
            TokKind::Gt | TokKind::RParen | TokKind::RBracket => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            TokKind::Unknown => {
                return Err(cur.err(ParseRule::FieldType));
            }
            _ => {}
        }
        end = t.span.end;
        cur.bump();
    }

    if end == start {
        return Err(MalformedDeclaration {
            rule: ParseRule::FieldType,
            span: start_tok.span,
            found: start_tok.text(cur.src).to_string(),
        });
    }
    Ok(FieldTy(cur.src[start..end].trim().to_string()))
}

/// Skip ahead so the following declaration can parse: stop after a `}` (the
/// end of the broken declaration in practice) or right before something that
/// looks like a fresh declaration head.
fn recover(cur: &mut Cursor) {
    while !cur.at_eof() {
        let t = cur.peek();
        if t.kind == TokKind::Ident {
            let text = t.text(cur.src);
            if matches!(text, "sealed" | "constrained" | "pub") {
                return;
            }
            // `Ident <` is a plausible carrier + state-parameter clause
            if cur.toks.get(cur.pos + 1).map(|n| n.kind) == Some(TokKind::Lt) {
                return;
            }
        }
        let t = cur.bump();
        if t.kind == TokKind::RBrace {
            return;
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

use sprig_core::{intern, Heap, ObjId, Object, Span, SprigError};

use crate::lexer::{tokenize, SpannedToken, Token};

/// Read exactly one expression from `input`, allocating its object graph in
/// the heap. Anything after the first complete form is a parse error: the
/// driver feeds one balanced expression per call.
///
/// Reading happens outside the collection bracket, where the collector is
/// suppressed; the partially-built graph needs no roots.
pub fn read(heap: &mut Heap, input: &str) -> Result<ObjId, SprigError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expr(heap)?;
    if let Some(extra) = parser.peek_spanned() {
        return Err(SprigError::parse(
            "multiple top-level forms in one input",
            extra.span,
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn peek_spanned(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|t| t.span)
            .unwrap_or_else(|| {
                self.tokens
                    .last()
                    .map(|t| t.span)
                    .unwrap_or(Span::new(0, 0))
            })
    }

    fn advance(&mut self) -> Option<&SpannedToken> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn parse_expr(&mut self, heap: &mut Heap) -> Result<ObjId, SprigError> {
        let span = self.span();
        let token = match self.advance() {
            Some(t) => t.token.clone(),
            None => return Err(SprigError::parse("unexpected end of input", span)),
        };
        match token {
            Token::LParen => self.parse_list(heap, span),
            Token::Int(n) => heap.alloc_int(n),
            Token::Str(s) => heap.alloc_str(s),
            Token::Bool(b) => heap.alloc_bool(b),
            Token::Nil => Ok(heap.nil()),
            Token::Symbol(name) => heap.alloc(Object::Symbol(intern(&name))),
            Token::RParen => Err(SprigError::parse("unexpected )", span)),
            Token::Dot => Err(SprigError::parse("unexpected . outside a list", span)),
        }
    }

    /// Parse the remainder of a list after its opening paren. Elements are
    /// gathered first, then the pair chain is built right to left so a
    /// dotted tail slots in naturally.
    fn parse_list(&mut self, heap: &mut Heap, open: Span) -> Result<ObjId, SprigError> {
        let mut items = Vec::new();
        let mut tail = heap.nil();
        loop {
            match self.peek() {
                None => {
                    return Err(SprigError::parse("unbalanced parentheses", open));
                }
                Some(Token::RParen) => {
                    self.advance();
                    break;
                }
                Some(Token::Dot) => {
                    let dot_span = self.span();
                    if items.is_empty() {
                        return Err(SprigError::parse("dotted tail needs a head", dot_span));
                    }
                    self.advance();
                    tail = self.parse_expr(heap)?;
                    match self.peek() {
                        Some(Token::RParen) => {
                            self.advance();
                            break;
                        }
                        _ => {
                            return Err(SprigError::parse(
                                "dotted tail must be the final element",
                                dot_span,
                            ));
                        }
                    }
                }
                Some(_) => items.push(self.parse_expr(heap)?),
            }
        }

        let mut list = tail;
        for item in items.into_iter().rev() {
            list = heap.alloc_pair(item, list)?;
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_core::printer;

    fn heap() -> Heap {
        Heap::new(4096)
    }

    fn roundtrip(input: &str) -> String {
        let mut h = heap();
        let id = read(&mut h, input).unwrap();
        printer::print(&h, id)
    }

    #[test]
    fn atoms() {
        assert_eq!(roundtrip("42"), "42");
        assert_eq!(roundtrip("-3"), "-3");
        assert_eq!(roundtrip("#true"), "#true");
        assert_eq!(roundtrip("#nil"), "#nil");
        assert_eq!(roundtrip("\"hi\""), "\"hi\"");
        assert_eq!(roundtrip("'hi'"), "\"hi\"");
        assert_eq!(roundtrip("foo"), "foo");
    }

    #[test]
    fn proper_lists() {
        assert_eq!(roundtrip("(+ 1 2)"), "(+ 1 2)");
        assert_eq!(roundtrip("(a (b c) d)"), "(a (b c) d)");
        assert_eq!(roundtrip("()"), "#nil");
    }

    #[test]
    fn dotted_pairs() {
        assert_eq!(roundtrip("(1 . 2)"), "(1 . 2)");
        assert_eq!(roundtrip("(1 2 . 3)"), "(1 2 . 3)");
    }

    #[test]
    fn nil_literal_is_the_singleton() {
        let mut h = heap();
        let a = read(&mut h, "#nil").unwrap();
        assert_eq!(a, h.nil());
    }

    #[test]
    fn multiple_top_level_forms_rejected() {
        let mut h = heap();
        let err = read(&mut h, "(+ 1 2) (+ 3 4)").unwrap_err();
        assert!(matches!(
            err,
            SprigError::Parse { message, .. } if message.contains("multiple top-level forms")
        ));
    }

    #[test]
    fn unbalanced_input_rejected() {
        let mut h = heap();
        assert!(read(&mut h, "(+ 1").is_err());
        assert!(read(&mut h, ")").is_err());
        assert!(read(&mut h, "").is_err());
    }

    #[test]
    fn misplaced_dots_rejected() {
        let mut h = heap();
        assert!(read(&mut h, "(. 1)").is_err());
        assert!(read(&mut h, "(1 . 2 3)").is_err());
        assert!(read(&mut h, ".").is_err());
    }

    #[test]
    fn literal_round_trip_is_stable() {
        // parse(print(parse(x))) == parse(x) for every literal kind.
        for input in ["7", "-19", "#true", "#false", "\"text\""] {
            let mut h = heap();
            let first = read(&mut h, input).unwrap();
            let printed = printer::print(&h, first);
            let second = read(&mut h, &printed).unwrap();
            assert_eq!(printer::print(&h, second), printed, "for input {input}");
        }
    }
}

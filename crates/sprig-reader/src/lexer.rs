use sprig_core::{Span, SprigError};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    Dot,
    Int(i64),
    Str(String),
    Symbol(String),
    Bool(bool),
    Nil,
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

fn is_delimiter(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')' | '"' | '\'' | ';')
}

pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, SprigError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    let mut line = 1;
    let mut col = 1;

    while i < chars.len() {
        let ch = chars[i];
        let span = Span::new(line, col);

        match ch {
            ' ' | '\t' | '\r' => {
                col += 1;
                i += 1;
            }
            '\n' => {
                line += 1;
                col = 1;
                i += 1;
            }

            ';' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }

            '(' => {
                tokens.push(SpannedToken {
                    token: Token::LParen,
                    span,
                });
                col += 1;
                i += 1;
            }
            ')' => {
                tokens.push(SpannedToken {
                    token: Token::RParen,
                    span,
                });
                col += 1;
                i += 1;
            }

            // Strings take either quote style; the closing quote must match
            // the opening one.
            '"' | '\'' => {
                let delim = ch;
                let mut s = String::new();
                i += 1;
                col += 1;
                loop {
                    match chars.get(i).copied() {
                        None => {
                            return Err(SprigError::parse("unterminated string literal", span))
                        }
                        Some(c) if c == delim => {
                            i += 1;
                            col += 1;
                            break;
                        }
                        Some('\\') => {
                            i += 1;
                            col += 1;
                            match chars.get(i).copied() {
                                Some('n') => s.push('\n'),
                                Some('t') => s.push('\t'),
                                Some('\\') => s.push('\\'),
                                Some('"') => s.push('"'),
                                Some('\'') => s.push('\''),
                                Some(other) => {
                                    return Err(SprigError::parse(
                                        format!("unknown escape \\{other}"),
                                        span,
                                    ))
                                }
                                None => {
                                    return Err(SprigError::parse(
                                        "unterminated string literal",
                                        span,
                                    ))
                                }
                            }
                            i += 1;
                            col += 1;
                        }
                        Some(c) => {
                            if c == '\n' {
                                line += 1;
                                col = 1;
                            } else {
                                col += 1;
                            }
                            s.push(c);
                            i += 1;
                        }
                    }
                }
                tokens.push(SpannedToken {
                    token: Token::Str(s),
                    span,
                });
            }

            // #-prefixed literals: #nil, #true, #false.
            '#' => {
                let start = i;
                i += 1;
                while i < chars.len() && !is_delimiter(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                col += i - start;
                let token = match word.as_str() {
                    "#nil" => Token::Nil,
                    "#true" => Token::Bool(true),
                    "#false" => Token::Bool(false),
                    _ => {
                        return Err(SprigError::parse(
                            format!("unknown literal {word}"),
                            span,
                        ))
                    }
                };
                tokens.push(SpannedToken { token, span });
            }

            _ => {
                // Bareword: integer, lone dot, or symbol, split after the
                // fact so `-` stays a symbol while `-7` is a number.
                let start = i;
                while i < chars.len() && !is_delimiter(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                col += i - start;
                let token = classify_bareword(&word, span)?;
                tokens.push(SpannedToken { token, span });
            }
        }
    }

    Ok(tokens)
}

fn classify_bareword(word: &str, span: Span) -> Result<Token, SprigError> {
    if word == "." {
        return Ok(Token::Dot);
    }
    let digits = word.strip_prefix('-').unwrap_or(word);
    let leads_numeric = digits.starts_with(|c: char| c.is_ascii_digit());
    if leads_numeric {
        if digits.chars().all(|c| c.is_ascii_digit()) {
            return word
                .parse::<i64>()
                .map(Token::Int)
                .map_err(|_| SprigError::parse(format!("integer out of range: {word}"), span));
        }
        return Err(SprigError::parse(
            format!("malformed integer literal: {word}"),
            span,
        ));
    }
    Ok(Token::Symbol(word.to_string()))
}

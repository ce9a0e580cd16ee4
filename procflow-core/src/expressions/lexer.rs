use super::ExpressionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// A function name: text immediately preceding `(`.
    Call(String),
    Open,
    Close,
    Comma,
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Split a prefix-call expression into a flat token stream by scanning for
/// `(`, `)` and `,`. Text between delimiters becomes a literal (trimmed) or, if
/// followed by `(`, a call name. Single- or double-quoted literals keep their
/// inner text verbatim and may contain delimiters.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut pending = String::new();
    let mut pending_start = 0;
    let mut after_quote = false;
    let mut chars = input.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match c {
            '(' | ')' | ',' => {
                if c == '(' {
                    let name = pending.trim();
                    if name.is_empty() || after_quote {
                        return Err(ExpressionError::syntax(offset, "'(' must follow a function name"));
                    }
                    tokens.push(Token {
                        kind: TokenKind::Call(name.to_string()),
                        offset: pending_start,
                    });
                } else if !pending.trim().is_empty() {
                    tokens.push(Token {
                        kind: TokenKind::Literal(pending.trim().to_string()),
                        offset: pending_start,
                    });
                }
                pending.clear();
                after_quote = false;
                let kind = match c {
                    '(' => TokenKind::Open,
                    ')' => TokenKind::Close,
                    _ => TokenKind::Comma,
                };
                tokens.push(Token { kind, offset });
            }
            '"' | '\'' if pending.trim().is_empty() && !after_quote => {
                let mut text = String::new();
                let mut closed = false;
                while let Some((_, q)) = chars.next() {
                    if q == '\\' {
                        if let Some((_, escaped)) = chars.next() {
                            text.push(escaped);
                        }
                        continue;
                    }
                    if q == c {
                        closed = true;
                        break;
                    }
                    text.push(q);
                }
                if !closed {
                    return Err(ExpressionError::syntax(offset, "unterminated string literal"));
                }
                tokens.push(Token {
                    kind: TokenKind::Literal(text),
                    offset,
                });
                pending.clear();
                after_quote = true;
            }
            c if after_quote => {
                if !c.is_whitespace() {
                    return Err(ExpressionError::syntax(offset, "unexpected text after string literal"));
                }
            }
            c => {
                if pending.trim().is_empty() {
                    pending_start = offset;
                }
                pending.push(c);
            }
        }
    }

    if !pending.trim().is_empty() {
        tokens.push(Token {
            kind: TokenKind::Literal(pending.trim().to_string()),
            offset: pending_start,
        });
    }
    Ok(tokens)
}

use super::functions::{apply, Function};
use super::lexer::{tokenize, Token, TokenKind};
use super::ExpressionError;
use crate::types::Record;

/// Parsed form of a prefix-call expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Literal(String),
    Call { function: Function, args: Vec<Node> },
}

impl Node {
    /// Evaluate depth-first: arguments are resolved before the call itself.
    pub(crate) fn eval(&self, data: &Record) -> Result<String, ExpressionError> {
        match self {
            Node::Literal(s) => Ok(s.clone()),
            Node::Call { function, args } => {
                let values = args
                    .iter()
                    .map(|a| a.eval(data))
                    .collect::<Result<Vec<_>, _>>()?;
                apply(*function, &values, data)
            }
        }
    }
}

pub(crate) fn parse(input: &str) -> Result<Node, ExpressionError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ExpressionError::syntax(0, "empty expression"));
    }
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        end: input.len(),
    };
    let node = parser.expr()?;
    if let Some(extra) = parser.peek() {
        return Err(ExpressionError::syntax(extra.offset, "unexpected trailing input"));
    }
    Ok(node)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    end: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<&'a Token, ExpressionError> {
        let token = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| ExpressionError::syntax(self.end, "unexpected end of expression"))?;
        self.pos += 1;
        Ok(token)
    }

    fn expr(&mut self) -> Result<Node, ExpressionError> {
        let token = self.next()?;
        match &token.kind {
            TokenKind::Literal(s) => Ok(Node::Literal(s.clone())),
            TokenKind::Call(name) => {
                let function = Function::from_name(name)
                    .ok_or_else(|| ExpressionError::Unimplemented(name.clone()))?;
                let open = self.next()?;
                if open.kind != TokenKind::Open {
                    return Err(ExpressionError::syntax(open.offset, "expected '('"));
                }
                let args = self.args()?;
                Ok(Node::Call { function, args })
            }
            TokenKind::Open => Err(ExpressionError::syntax(token.offset, "unexpected '('")),
            TokenKind::Close => Err(ExpressionError::syntax(token.offset, "unexpected ')'")),
            TokenKind::Comma => Err(ExpressionError::syntax(token.offset, "missing argument")),
        }
    }

    fn args(&mut self) -> Result<Vec<Node>, ExpressionError> {
        let mut args = Vec::new();
        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Close)) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            let sep = self.next()?;
            match sep.kind {
                TokenKind::Comma => continue,
                TokenKind::Close => return Ok(args),
                _ => return Err(ExpressionError::syntax(sep.offset, "expected ',' or ')'")),
            }
        }
    }
}

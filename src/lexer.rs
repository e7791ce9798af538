//! Filter的词法分析器与顶层切分器
//!
//! The lexer only distinguishes parentheses, the `AND` / `OR` keywords and
//! opaque words. A word that opens with a quote runs to the matching closing
//! quote, so parentheses and keywords inside quotes are plain text. Condition
//! syntax (operators, value lists, quote removal) is left to the condition
//! parser, which works on the original text of a segment.

use crate::ast::LogicalOp;
use crate::error::FilterError;
use crate::token::{Span, Token, TokenKind};

pub struct Lexer<'a> {
    input: &'a str,
    /// 输入字符串中的当前位置（字节索引）
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    /// 返回当前位置的字符，不推进位置
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// 推进位置一个字符并返回该字符
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    /// 跳过空白字符
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// 跳过引号内的内容; 没有闭合引号时不跳过, 引号按普通字符处理
    fn skip_quoted(&mut self, quote: char) {
        if let Some(len) = self.input[self.position..].find(quote) {
            self.position += len + quote.len_utf8();
        }
    }

    /// 读取一个单词: 直到空白或括号为止
    fn read_word(&mut self, start: usize) -> Token<'a> {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '(' || c == ')' {
                break;
            }
            self.bump();
        }
        let literal = &self.input[start..self.position];
        Token {
            kind: match_keyword(literal),
            span: Span::new(start, self.position),
        }
    }
}

/// Logical keywords are upper-case only, so `research and development` stays a value.
fn match_keyword(s: &str) -> TokenKind<'_> {
    match s {
        "AND" => TokenKind::And,
        "OR" => TokenKind::Or,
        _ => TokenKind::Word(s),
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        let start = self.position;

        let c = self.bump()?;

        let token = match c {
            '(' => Token { kind: TokenKind::LParen, span: Span::new(start, self.position) },
            ')' => Token { kind: TokenKind::RParen, span: Span::new(start, self.position) },
            '\'' | '"' => {
                self.skip_quoted(c);
                self.read_word(start)
            }
            _ => self.read_word(start),
        };
        Some(token)
    }
}

/// Top-level segments of one nesting level and the operator joining them.
#[derive(Debug, Clone, PartialEq)]
pub struct Split<'a> {
    /// Original text of each segment, trimmed, parentheses kept.
    pub segments: Vec<&'a str>,
    /// `None` when the level holds a single segment (or nothing at all).
    pub operator: Option<LogicalOp>,
}

/// Splits `input` on the `AND` / `OR` keywords found outside any parentheses.
///
/// Only one operator may appear per level; `A AND B OR C` is rejected.
pub fn split_top_level(input: &str) -> Result<Split<'_>, FilterError> {
    let mut segments = Vec::new();
    let mut operator: Option<LogicalOp> = None;
    let mut depth = 0usize;
    let mut current: Option<Span> = None;

    for token in Lexer::new(input) {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    FilterError::syntax("Unbalanced ')'", input[..token.span.end].trim())
                })?;
            }
            TokenKind::And | TokenKind::Or if depth == 0 => {
                let found = if token.kind == TokenKind::And { LogicalOp::And } else { LogicalOp::Or };
                match operator {
                    None => operator = Some(found),
                    Some(op) if op != found => {
                        return Err(FilterError::syntax(
                            "Mixed AND/OR operators at the same level are not supported",
                            input.trim(),
                        ));
                    }
                    Some(_) => {}
                }
                let span = current.take().ok_or_else(|| {
                    FilterError::syntax(format!("Missing condition before {found}"), input.trim())
                })?;
                segments.push(&input[span.start..span.end]);
                continue;
            }
            _ => {}
        }
        current = Some(match current {
            Some(span) => span.to(token.span),
            None => token.span,
        });
    }

    if depth != 0 {
        return Err(FilterError::syntax("Unbalanced '('", input.trim()));
    }

    match (current, operator) {
        (Some(span), _) => segments.push(&input[span.start..span.end]),
        (None, Some(op)) => {
            return Err(FilterError::syntax(format!("Missing condition after {op}"), input.trim()));
        }
        (None, None) => {}
    }

    Ok(Split { segments, operator })
}

/// Returns the inside of `text` when one pair of parentheses encloses all of it.
///
/// `(A AND B)` yields `A AND B`; `(A) AND (B)` yields `None` because the first
/// group closes before the end of the text.
pub fn strip_enclosing_group(text: &str) -> Option<&str> {
    let text = text.trim();
    let mut tokens = Lexer::new(text);
    let first = tokens.next()?;
    if first.kind != TokenKind::LParen {
        return None;
    }

    let mut depth = 1usize;
    for token in tokens {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth -= 1;
                if depth == 0 {
                    return (token.span.end == text.len()).then(|| &text[1..token.span.start]);
                }
            }
            _ => {}
        }
    }
    None
}

use std::{iter::Peekable, str::CharIndices};

use crate::token::{Span, Token, TokenKind};

mod error;

pub use error::{LexError, LexResult};

/// Longest letter run the lexer buffers before giving up on it.
pub const MAX_IDENTIFIER_LEN: usize = 100;

/// Produces one token at a time from program text.
///
/// The lexer holds no lookahead tokens of its own; the parser keeps the single
/// current token and asks for the next one when it consumes it.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            line: 1,
            column: 0,
        }
    }

    pub fn next_token(&mut self) -> LexResult<Token> {
        self.skip_whitespace();

        let Some(&(start, ch)) = self.chars.peek() else {
            let index = self.input.len();
            return Ok(Token::new(
                TokenKind::End,
                Span {
                    start: index,
                    end: index,
                    line: self.line,
                    column: self.column,
                },
            ));
        };

        let line = self.line;
        let column = self.column;
        let kind = match ch {
            '-' => TokenKind::Minus,
            '+' => TokenKind::Plus,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '<' => TokenKind::Less,
            ';' => TokenKind::Semicolon,
            '=' => TokenKind::Equal,
            c if c.is_ascii_digit() => return self.read_integer(start, line, column),
            c if c.is_ascii_alphabetic() => return self.read_word(start, line, column),
            _ => {
                return Err(LexError::UnexpectedCharacter {
                    character: ch,
                    line,
                    column,
                });
            }
        };
        self.advance_char();
        Ok(Token::new(
            kind,
            Span {
                start,
                end: start + 1,
                line,
                column,
            },
        ))
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_whitespace() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn read_word(&mut self, start: usize, line: usize, column: usize) -> LexResult<Token> {
        let mut length = 0;
        while let Some(&(_, c)) = self.chars.peek() {
            if !c.is_ascii_alphabetic() {
                break;
            }
            length += 1;
            if length > MAX_IDENTIFIER_LEN {
                return Err(LexError::IdentifierTooLong {
                    limit: MAX_IDENTIFIER_LEN,
                    line,
                    column,
                });
            }
            self.advance_char();
        }

        let end = self.current_index();
        let word = &self.input[start..end];
        let kind = match word {
            "do" => TokenKind::Do,
            "else" => TokenKind::Else,
            "if" => TokenKind::If,
            "while" => TokenKind::While,
            _ => match word.as_bytes() {
                [letter] if letter.is_ascii_lowercase() => TokenKind::Ident(letter - b'a'),
                _ => {
                    return Err(LexError::InvalidIdentifier {
                        identifier: word.to_string(),
                        line,
                        column,
                    });
                }
            },
        };
        Ok(Token::new(
            kind,
            Span {
                start,
                end,
                line,
                column,
            },
        ))
    }

    fn read_integer(&mut self, start: usize, line: usize, column: usize) -> LexResult<Token> {
        let mut value: Option<i32> = Some(0);
        while let Some(&(_, c)) = self.chars.peek() {
            let Some(digit) = c.to_digit(10) else {
                break;
            };
            // Keep consuming after an overflow so the error reports the whole literal.
            value = value
                .and_then(|value| value.checked_mul(10))
                .and_then(|value| value.checked_add(digit as i32));
            self.advance_char();
        }

        let end = self.current_index();
        let Some(value) = value else {
            return Err(LexError::IntegerTooLarge {
                literal: self.input[start..end].to_string(),
                line,
                column,
            });
        };
        Ok(Token::new(
            TokenKind::Constant(value),
            Span {
                start,
                end,
                line,
                column,
            },
        ))
    }

    fn advance_char(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn current_index(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }
}

/// Lexes the whole input, including the trailing `End` token.
pub fn tokenize(input: &str) -> LexResult<Vec<Token>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_end = matches!(token.kind, TokenKind::End);
        tokens.push(token);
        if is_end {
            break;
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .expect("tokenize should succeed")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_simple_program() {
        let input = indoc! {"
            i = 1;
            while (i < 5) { i = i + i; }
        "};
        let expected = vec![
            TokenKind::Ident(8),
            TokenKind::Equal,
            TokenKind::Constant(1),
            TokenKind::Semicolon,
            TokenKind::While,
            TokenKind::LParen,
            TokenKind::Ident(8),
            TokenKind::Less,
            TokenKind::Constant(5),
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::Ident(8),
            TokenKind::Equal,
            TokenKind::Ident(8),
            TokenKind::Plus,
            TokenKind::Ident(8),
            TokenKind::Semicolon,
            TokenKind::RBrace,
            TokenKind::End,
        ];
        assert_eq!(kinds(input), expected);
    }

    #[test]
    fn recognizes_keywords_and_punctuation() {
        assert_eq!(
            kinds("do else if while-z"),
            vec![
                TokenKind::Do,
                TokenKind::Else,
                TokenKind::If,
                TokenKind::While,
                TokenKind::Minus,
                TokenKind::Ident(25),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn letters_and_digits_form_separate_tokens() {
        assert_eq!(
            kinds("a1"),
            vec![TokenKind::Ident(0), TokenKind::Constant(1), TokenKind::End]
        );
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = tokenize("a\n  = 7;").expect("tokenize should succeed");
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.column, 2);
        assert_eq!(tokens[2].span.start, 6);
        assert_eq!(tokens[2].span.end, 7);
    }

    #[test]
    fn end_is_repeated_after_input_is_exhausted() {
        let mut lexer = Lexer::new(" ");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::End);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::End);
    }

    #[test]
    fn errors_on_invalid_character() {
        let err = tokenize("a = 1 * 2;").expect_err("expected lexing failure");
        assert_eq!(
            err,
            LexError::UnexpectedCharacter {
                character: '*',
                line: 1,
                column: 6,
            }
        );
    }

    #[test]
    fn rejects_multi_letter_identifiers() {
        let err = tokenize("ab = 1;").expect_err("expected lexing failure");
        assert!(matches!(err, LexError::InvalidIdentifier { ref identifier, .. } if identifier == "ab"));
    }

    #[test]
    fn rejects_uppercase_identifiers() {
        let err = tokenize("A = 1;").expect_err("expected lexing failure");
        assert!(matches!(err, LexError::InvalidIdentifier { ref identifier, .. } if identifier == "A"));
        assert!(err.to_string().contains("single lowercase letters"));
    }

    #[test]
    fn keyword_match_is_case_sensitive() {
        let err = tokenize("While").expect_err("expected lexing failure");
        assert!(matches!(err, LexError::InvalidIdentifier { .. }));
    }

    #[test]
    fn rejects_overlong_identifiers() {
        let input = "x".repeat(MAX_IDENTIFIER_LEN + 1);
        let err = tokenize(&input).expect_err("expected lexing failure");
        assert!(matches!(err, LexError::IdentifierTooLong { limit: MAX_IDENTIFIER_LEN, .. }));
    }

    #[test]
    fn accepts_largest_integer() {
        assert_eq!(
            kinds("2147483647"),
            vec![TokenKind::Constant(i32::MAX), TokenKind::End]
        );
    }

    #[test]
    fn errors_on_integer_overflow() {
        let err = tokenize("n = 99999999999999999999;").expect_err("expected overflow");
        assert!(matches!(err, LexError::IntegerTooLarge { ref literal, .. } if literal == "99999999999999999999"));
    }
}

use logos::{Logos, SpannedIter};
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Default, Error, Debug, Clone, PartialEq)]
pub enum LexicalError {
    #[default]
    #[error("invalid token")]
    InvalidToken,
}

#[derive(Clone, Copy, Debug, Logos, PartialEq)]
#[logos(skip r"[ \t\n\f\r]+", error = LexicalError)]
enum RawToken<'source> {
    #[token(",")]
    Comma,
    #[regex(r#""[^"]*"|'[^']*'"#, |lex| strip_quotes(lex.slice()))]
    Quoted(&'source str),
    #[regex(r"[^\s,]+", |lex| lex.slice())]
    Word(&'source str),
}

#[inline]
fn strip_quotes(quoted: &str) -> &str {
    &quoted[1..quoted.len() - 1]
}

/// The boolean keywords of the filter language.
///
/// They are only recognised as whole upper-case words so that `ANDROID`, `cannot` or `and` stay
/// plain text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Keyword {
    And,
    Or,
    Xor,
    Not,
    NotAny,
    NotAll,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "XOR" => Some(Self::Xor),
            "NOT" => Some(Self::Not),
            "NOTANY" => Some(Self::NotAny),
            "NOTALL" => Some(Self::NotAll),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Not => "NOT",
            Self::NotAny => "NOTANY",
            Self::NotAll => "NOTALL",
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Token<'source> {
    Keyword(Keyword),
    Comma,
    Word(&'source str),
    Quoted(&'source str),
}

impl Token<'_> {
    /// The text this token contributes when it ends up inside a text leaf.
    pub fn literal(&self) -> &str {
        match self {
            Self::Keyword(keyword) => keyword.as_str(),
            Self::Comma => ",",
            Self::Word(word) => word,
            Self::Quoted(text) => text,
        }
    }
}

impl Display for Token<'_> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{:?}", self)
    }
}

/// Tokenizer for filter expressions.
///
/// It never fails: anything logos cannot classify is handed back as a plain word.
pub struct Lexer<'input> {
    input: &'input str,
    token_stream: SpannedIter<'input, RawToken<'input>>,
}

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str) -> Self {
        Self {
            input,
            token_stream: RawToken::lexer(input).spanned(),
        }
    }
}

impl<'input> Iterator for Lexer<'input> {
    type Item = Token<'input>;

    fn next(&mut self) -> Option<Self::Item> {
        self.token_stream.next().map(|(token, span)| match token {
            Ok(RawToken::Comma) => Token::Comma,
            Ok(RawToken::Quoted(text)) => Token::Quoted(text),
            Ok(RawToken::Word(word)) => {
                Keyword::from_word(word).map_or(Token::Word(word), Token::Keyword)
            }
            Err(_) => Token::Word(&self.input[span]),
        })
    }
}

use crate::{
    ast::{Term, TermNode},
    lexer::{Keyword, Lexer, Token},
};
use itertools::Itertools;

/// Operators from the loosest to the tightest binding.
const PRECEDENCE: [Keyword; 6] = [
    Keyword::And,
    Keyword::NotAny,
    Keyword::NotAll,
    Keyword::Not,
    Keyword::Xor,
    Keyword::Or,
];

const QUOTES: [char; 2] = ['"', '\''];

/// Parse a comma-separated filter string into its terms.
///
/// Each non-empty comma-separated piece becomes one term and the terms are meant to be combined
/// with an implicit `OR`. Parsing never fails: an operator missing one of its operands is kept as
/// literal text.
pub fn parse(input: &str) -> Vec<Term> {
    let tokens: Vec<Token> = Lexer::new(input).collect();
    tokens
        .split(|token| *token == Token::Comma)
        .filter(|piece| !piece.is_empty())
        .map(parse_expression)
        .collect()
}

fn parse_expression(tokens: &[Token]) -> Term {
    PRECEDENCE
        .iter()
        .find_map(|keyword| parse_operator(*keyword, tokens))
        .unwrap_or_else(|| parse_text(tokens))
}

fn parse_operator(keyword: Keyword, tokens: &[Token]) -> Option<Term> {
    match keyword {
        Keyword::And => parse_operands(keyword, tokens).map(Term::And),
        Keyword::Xor => parse_operands(keyword, tokens).map(Term::Xor),
        Keyword::Or => parse_operands(keyword, tokens).map(Term::Or),
        Keyword::Not | Keyword::NotAny => {
            parse_negation(keyword, tokens).map(|(incl, excl)| Term::NotAny { incl, excl })
        }
        Keyword::NotAll => {
            parse_negation(keyword, tokens).map(|(incl, excl)| Term::NotAll { incl, excl })
        }
    }
}

/// Split on every occurrence of the keyword; all the operands must be present.
fn parse_operands(keyword: Keyword, tokens: &[Token]) -> Option<Vec<Term>> {
    let separator = Token::Keyword(keyword);
    if !tokens.contains(&separator) {
        return None;
    }

    let operands = tokens.split(|token| *token == separator).collect_vec();
    if operands.iter().any(|operand| operand.is_empty()) {
        return None;
    }

    Some(operands.into_iter().map(parse_expression).collect())
}

/// Split on the first occurrence of the keyword; only the exclusion is mandatory.
fn parse_negation(keyword: Keyword, tokens: &[Token]) -> Option<(Option<TermNode>, TermNode)> {
    let separator = Token::Keyword(keyword);
    let position = tokens.iter().position(|token| *token == separator)?;
    let (incl, excl) = (&tokens[..position], &tokens[position + 1..]);
    if excl.is_empty() {
        return None;
    }

    let incl = (!incl.is_empty()).then(|| Box::new(parse_expression(incl)));
    Some((incl, Box::new(parse_expression(excl))))
}

fn parse_text(tokens: &[Token]) -> Term {
    let text = tokens
        .iter()
        .map(|token| match token {
            Token::Quoted(text) => text.split_whitespace().join(" "),
            other => other.literal().trim_matches(QUOTES).to_string(),
        })
        .filter(|piece| !piece.is_empty())
        .join(" ");
    Term::text(&text)
}

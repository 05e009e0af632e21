use std::fmt::{Display, Formatter};

pub type TermNode = Box<Term>;

/// A parsed boolean filter expression.
///
/// `NOT` and `NOTANY` are the same operator and both parse into [`Term::NotAny`].
#[derive(PartialEq, Clone, Debug)]
pub enum Term {
    And(Vec<Term>),
    Or(Vec<Term>),
    Xor(Vec<Term>),
    NotAny {
        incl: Option<TermNode>,
        excl: TermNode,
    },
    NotAll {
        incl: Option<TermNode>,
        excl: TermNode,
    },
    /// Lower-cased text without surrounding quotes.
    Text(String),
}

impl Term {
    pub fn text(text: &str) -> Self {
        Self::Text(text.to_lowercase())
    }

    /// The number of text leaves, used to order the cheap terms first.
    pub fn cost(&self) -> usize {
        match self {
            Self::And(terms) | Self::Or(terms) | Self::Xor(terms) => {
                terms.iter().map(Term::cost).sum()
            }
            Self::NotAny { incl, excl } | Self::NotAll { incl, excl } => {
                incl.as_ref().map_or(0, |incl| incl.cost()) + excl.cost()
            }
            Self::Text(_) => 1,
        }
    }
}

fn write_list(formatter: &mut Formatter, name: &str, terms: &[Term]) -> std::fmt::Result {
    write!(formatter, "{name}[")?;
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            write!(formatter, ", ")?;
        }
        write!(formatter, "{term}")?;
    }
    write!(formatter, "]")
}

fn write_negation(
    formatter: &mut Formatter,
    name: &str,
    incl: &Option<TermNode>,
    excl: &Term,
) -> std::fmt::Result {
    match incl {
        Some(incl) => write!(formatter, "{name}{{{incl}, {excl}}}"),
        None => write!(formatter, "{name}{{{excl}}}"),
    }
}

impl Display for Term {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::And(terms) => write_list(formatter, "AND", terms),
            Self::Or(terms) => write_list(formatter, "OR", terms),
            Self::Xor(terms) => write_list(formatter, "XOR", terms),
            Self::NotAny { incl, excl } => write_negation(formatter, "NOTANY", incl, excl),
            Self::NotAll { incl, excl } => write_negation(formatter, "NOTALL", incl, excl),
            Self::Text(text) => write!(formatter, "{text:?}"),
        }
    }
}

use std::collections::HashMap;

/// Interns item identifiers into dense IDs shared by both snapshots of a pass.
#[derive(Clone, Debug, Default)]
pub struct IdentifierTable {
    by_values: HashMap<String, IdentifierId>,
}

impl IdentifierTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identifiers<'a, I>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut table = Self::new();
        for identifier in identifiers {
            table.get_or_update(identifier);
        }
        table
    }

    #[inline]
    pub fn get(&self, value: &str) -> Option<IdentifierId> {
        self.by_values.get(value).copied()
    }

    pub fn get_or_update(&mut self, value: &str) -> IdentifierId {
        let next = IdentifierId(self.by_values.len());
        *self.by_values.entry(value.to_string()).or_insert(next)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.by_values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_values.is_empty()
    }
}

#[derive(Clone, Copy, Eq, Ord, PartialEq, PartialOrd, Debug, Hash)]
pub struct IdentifierId(pub(crate) usize);

impl IdentifierId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

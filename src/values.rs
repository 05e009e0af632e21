/// The lower-cased values an item exposes to a text filter, in their original order.
///
/// Collections, creators and subjects expose one value per tag; the title and the description
/// expose a single value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueSet(Vec<String>);

impl ValueSet {
    pub fn new<S: AsRef<str>>(values: &[S]) -> Self {
        Self(values.iter().map(|v| v.as_ref().to_lowercase()).collect())
    }

    pub fn single(value: &str) -> Self {
        Self(vec![value.to_lowercase()])
    }

    #[inline]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ValueSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(|v| v.as_ref().to_lowercase()).collect())
    }
}

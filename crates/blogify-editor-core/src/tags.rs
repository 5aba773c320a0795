//! Tag list editing.

use smol_str::SmolStr;

/// Ordered tags without duplicates or empty entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagList {
    tags: Vec<SmolStr>,
}

impl TagList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `raw` after trimming. Returns false if it was empty or already present.
    pub fn add(&mut self, raw: &str) -> bool {
        let tag = raw.trim();
        if tag.is_empty() || self.contains(tag) {
            return false;
        }
        self.tags.push(SmolStr::new(tag));
        true
    }

    /// Remove `tag`. Returns false if it was not present.
    pub fn remove(&mut self, tag: &str) -> bool {
        match self.tags.iter().position(|t| t == tag) {
            Some(index) => {
                self.tags.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(SmolStr::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(str::to_string).collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = TagList::new();
        for tag in iter {
            list.add(tag.as_ref());
        }
        list
    }
}

/// The tag text field and the list it feeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagInput {
    buffer: String,
}

impl TagInput {
    pub fn value(&self) -> &str {
        &self.buffer
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    /// Add the buffered text to `tags`. The buffer is only cleared when a tag
    /// was actually added.
    pub fn commit(&mut self, tags: &mut TagList) -> bool {
        let added = tags.add(&self.buffer);
        if added {
            self.buffer.clear();
        }
        added
    }
}

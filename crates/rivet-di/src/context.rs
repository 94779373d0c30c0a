//! Resolution history used in error messages

/// Chain of keys currently being resolved, outermost first.
///
/// Used only to explain failures; a key is pushed before its dependencies
/// resolve and popped once its value is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveContext {
    history: Vec<String>,
}

impl ResolveContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for an injection, rooted at a descriptive label such as
    /// `Foo.bar` or `Foo.setBar()`
    pub fn for_injection(label: impl Into<String>) -> Self {
        Self {
            history: vec![label.into()],
        }
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn depth(&self) -> usize {
        self.history.len()
    }

    pub(crate) fn push(&mut self, key: &str) {
        self.history.push(key.to_string());
    }

    pub(crate) fn pop(&mut self) {
        self.history.pop();
    }
}

use std::collections::BTreeMap;

/// System-generated key/value metadata attached to domain objects.
pub type Annotations = BTreeMap<String, String>;

/// Implemented by domain types that carry [`Annotations`].
pub trait Annotated {
    fn annotations(&self) -> &Annotations;

    fn annotations_mut(&mut self) -> &mut Annotations;

    /// Sets `key` to `value`, replacing any previous value.
    fn annotate(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.annotations_mut().insert(key.into(), value.into());
    }

    fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations().get(key).map(String::as_str)
    }
}

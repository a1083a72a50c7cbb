//! Fresh identifiers for newly generated actions.

/// Source of identifiers for actions built from scratch.
///
/// Compiling existing templates never needs one; only generators do.
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// Random v4 UUIDs in the uppercase form Shortcuts writes.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string().to_uppercase()
    }
}

/// Deterministic identifiers: `<prefix>-1`, `<prefix>-2`, …
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    counter: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("{}-{}", self.prefix, self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let mut ids = SequentialIds::new("ID");
        assert_eq!(ids.next_id(), "ID-1");
        assert_eq!(ids.next_id(), "ID-2");
    }

    #[test]
    fn test_uuid_generator_is_uppercase_and_unique() {
        let mut ids = UuidGenerator;
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
        assert_eq!(a, a.to_uppercase());
        assert_eq!(a.len(), 36);
    }
}

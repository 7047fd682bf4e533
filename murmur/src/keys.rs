/// Common key-construction helpers for the Redis store.
#[derive(Debug, Clone)]
pub struct KeyContext<'a> {
    pub prefix: &'a str,
    pub service: &'a str,
}

impl<'a> KeyContext<'a> {
    pub fn new(prefix: &'a str, service: &'a str) -> Self {
        Self { prefix, service }
    }

    pub fn entity(&self, collection: &str, entity_id: &str) -> String {
        format!("{}:{}:{}:{}", self.prefix, self.service, collection, entity_id)
    }

    /// Counter handing out insertion sequence numbers.
    pub fn sequence(&self, collection: &str) -> String {
        format!("{}:{}:{}:meta:seq", self.prefix, self.service, collection)
    }

    /// Sorted set of entity ids scored by insertion sequence.
    pub fn order(&self, collection: &str) -> String {
        format!("{}:{}:{}:meta:order", self.prefix, self.service, collection)
    }

    /// Owner lookup for a unique field value. Values are stored already normalized.
    pub fn unique(&self, collection: &str, field: &str, value: &str) -> String {
        format!("{}:{}:{}:unique:{}:{}", self.prefix, self.service, collection, field, value)
    }

    /// Key for reverse lookup - the set of entities in `collection` whose `field`
    /// holds (or contains) `value`.
    /// Format: prefix:service:collection:rev_rel:field:value
    pub fn reverse_relation(&self, collection: &str, field: &str, value: &str) -> String {
        format!(
            "{}:{}:{}:rev_rel:{}:{}",
            self.prefix, self.service, collection, field, value
        )
    }

    /// Everything under this prefix, for cleanup scans.
    pub fn pattern(&self) -> String {
        format!("{}:{}:*", self.prefix, self.service)
    }
}

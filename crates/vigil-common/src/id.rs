//! Process-wide Snowflake ID generation for row keys.

use snowflake::SnowflakeIdBucket;
use std::sync::Mutex;

static ID_GENERATOR: Mutex<Option<SnowflakeIdBucket>> = Mutex::new(None);

/// Configures the generator for this process.
///
/// Machine and node identifiers (0-31 each) keep IDs from colliding
/// across daemons sharing one database. Callers that never invoke
/// `init` fall back to a (1, 1) bucket on first use.
pub fn init(machine_id: i32, node_id: i32) {
    let mut generator = ID_GENERATOR.lock().unwrap();
    *generator = Some(SnowflakeIdBucket::new(machine_id, node_id));
}

/// Returns a fresh Snowflake ID, stringified for use as a row key.
pub fn next_id() -> String {
    let mut generator = ID_GENERATOR.lock().unwrap();
    generator
        .get_or_insert_with(|| SnowflakeIdBucket::new(1, 1))
        .get_id()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_numeric_and_unique_under_burst() {
        init(2, 3);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let id = next_id();
            assert!(id.parse::<i64>().is_ok(), "not an i64: {id}");
            assert!(seen.insert(id), "generator repeated an id");
        }
    }

    #[test]
    fn works_without_explicit_init() {
        let id = next_id();
        assert!(!id.is_empty());
    }
}

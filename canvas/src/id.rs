//! Object identity.

use uuid::Uuid;

use crate::doc::ObjectId;

/// Fresh random object id. Unique across replicas without coordination;
/// collisions are not checked for.
#[must_use]
pub fn new_id() -> ObjectId {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn ids_are_uuid_strings() {
        let id = new_id();
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn ids_do_not_repeat() {
        let ids: HashSet<ObjectId> = (0..1000).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}

use uuid::Uuid;

use crate::entities::EntityKind;

/// source of fresh entity identifiers
pub trait IdGenerator: Send + Sync {
    fn generate(&self, kind: EntityKind) -> String;
}

pub type IdGeneratorBox = Box<dyn IdGenerator>;

/// `<prefix>-<uuid v4>` identifiers, e.g. `loan-5f0c...`
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self, kind: EntityKind) -> String {
        format!("{}-{}", kind.id_prefix(), Uuid::new_v4().simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uuid_ids_are_prefixed_and_unique() {
        let ids = UuidIdGenerator;
        let generated: HashSet<String> = (0..1_000)
            .map(|_| ids.generate(EntityKind::Loan))
            .collect();
        assert_eq!(generated.len(), 1_000);
        assert!(generated.iter().all(|id| id.starts_with("loan-") && id.len() == 37));

        assert!(ids.generate(EntityKind::BorrowerRequest).starts_with("request-"));
    }
}

use uuid::Uuid;

/// Source of fresh entity identifiers.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Uuid;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4Generator;

impl IdGenerator for UuidV4Generator {
    fn generate(&self) -> Uuid {
        Uuid::new_v4()
    }
}

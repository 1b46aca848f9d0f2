use skirmish_core::entity::EntityId;

/// Failures surfaced by the world core.
///
/// Ordinary bad input (unknown ids, stale timers, collecting a hidden pickup)
/// is never an error; those operations report a no-op instead.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldError {
    /// An entity with this id is already live. Indicates an id allocation bug.
    DuplicateEntity(EntityId),
    InvalidConfig(String),
}

impl std::fmt::Display for WorldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEntity(id) => write!(f, "entity {id} already exists"),
            Self::InvalidConfig(msg) => write!(f, "invalid world config: {msg}"),
        }
    }
}

impl std::error::Error for WorldError {}

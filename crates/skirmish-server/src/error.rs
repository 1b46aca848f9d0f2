use skirmish_world::WorldError;

/// Fatal server startup and runtime errors.
#[derive(Debug)]
pub enum ServerError {
    Config(String),
    Bind(std::io::Error),
    Serve(std::io::Error),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(m) => write!(f, "invalid configuration: {m}"),
            Self::Bind(e) => write!(f, "failed to bind listener: {e}"),
            Self::Serve(e) => write!(f, "server error: {e}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(_) => None,
            Self::Bind(e) | Self::Serve(e) => Some(e),
        }
    }
}

/// Why the world task refused a join.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinError {
    World(WorldError),
    /// The initial snapshot could not be encoded for the joiner.
    Snapshot(String),
}

impl std::fmt::Display for JoinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::World(e) => write!(f, "{e}"),
            Self::Snapshot(m) => write!(f, "world snapshot unavailable: {m}"),
        }
    }
}

impl std::error::Error for JoinError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::World(e) => Some(e),
            Self::Snapshot(_) => None,
        }
    }
}

impl From<WorldError> for JoinError {
    fn from(e: WorldError) -> Self {
        Self::World(e)
    }
}

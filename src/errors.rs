use crate::piece::{Color, Coord};

/// Error types for the MicroChess engine, search, self-play and breeding.
///
/// All variants describe invalid usage. None of them is recovered from inside
/// the crate: a move reaching `apply_move` from search or self-play is always
/// generated by the engine, so any of these surfacing there is a bug.
#[derive(Debug, thiserror::Error)]
pub enum MicroChessError {
    /// Applying a move whose origin cell holds no piece
    #[error("invalid move: no piece at origin {origin}")]
    EmptyOrigin { origin: Coord },

    /// Applying a move with a piece that does not belong to the side to move
    #[error("invalid move: piece at {origin} is {found:?} but {expected:?} is to move")]
    WrongMover {
        origin: Coord,
        expected: Color,
        found: Color,
    },

    /// Applying a move onto a friendly piece or onto either King
    #[error("invalid move: the piece on {target} cannot be captured")]
    IllegalCapture { target: Coord },

    /// Requesting a selected subset larger than the population supplied
    #[error("cannot select {requested} individuals from a population of {available}")]
    SelectionTooLarge { requested: usize, available: usize },

    /// Querying with a color index outside the two recognized values
    #[error("invalid color index {0}")]
    InvalidColor(usize),

    /// Search visited more nodes than its configured budget
    #[error("search exceeded its node budget after {nodes} nodes")]
    SearchBudgetExhausted { nodes: u64 },

    /// Configuration or fixture value out of range
    #[error("invalid configuration for '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization of configs or reports failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MicroChessError {
    pub(crate) fn invalid_config(field: &str, reason: impl Into<String>) -> Self {
        MicroChessError::InvalidConfig {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// Convenience type alias
pub type Result<T> = std::result::Result<T, MicroChessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_fault() {
        let err = MicroChessError::EmptyOrigin {
            origin: Coord::new(2, 1),
        };
        assert_eq!(err.to_string(), "invalid move: no piece at origin (2, 1)");

        let err = MicroChessError::IllegalCapture {
            target: Coord::new(4, 3),
        };
        assert_eq!(
            err.to_string(),
            "invalid move: the piece on (4, 3) cannot be captured"
        );

        let err = MicroChessError::SelectionTooLarge {
            requested: 5,
            available: 3,
        };
        assert!(err.to_string().contains("select 5"));

        let err = MicroChessError::invalid_config("mutation_rate", "must be within [0, 1]");
        assert!(err.to_string().contains("mutation_rate"));
    }

    #[test]
    fn test_io_errors_convert() {
        fn open_missing() -> Result<std::fs::File> {
            Ok(std::fs::File::open("/definitely/not/here.json")?)
        }
        assert!(matches!(open_missing(), Err(MicroChessError::Io(_))));
    }
}

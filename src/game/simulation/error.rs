use super::arena::ObjectId;

/// Unrecoverable simulation faults.
///
/// Each of these means the grid or the object graph is corrupt. The tick is
/// abandoned and the caller is expected to stop the simulation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("adjacency delta {delta} out of range in proximity cell {cell}")]
    AdjacencyOutOfRange { cell: usize, delta: i32 },
    #[error("beam object {0:?} has no beam data")]
    MissingBeam(ObjectId),
    #[error("object {object:?} references missing sprite frame {shape}")]
    MissingFrame { object: ObjectId, shape: i32 },
}

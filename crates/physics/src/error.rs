use compute::ComputeError;
use thiserror::Error;

use crate::host::TransformHandle;
use crate::types::{ColliderId, InstanceId};

/// Rejected chain configuration. Nothing is registered when one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("chain root {0:?} has no parent transform to anchor to")]
    RootWithoutParent(TransformHandle),
    #[error("chain needs {count} particles but an instance holds at most {capacity}")]
    CapacityExceeded { count: usize, capacity: usize },
    #[error("joint {0:?} does not resolve in the host hierarchy")]
    UnknownJoint(TransformHandle),
    #[error("collider {0:?} is not registered")]
    UnknownCollider(ColliderId),
}

#[derive(Error, Debug)]
pub enum PhysicsError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("compute backend failed: {0}")]
    Backend(#[from] ComputeError),
    #[error("no chain registered as {0:?}")]
    UnknownInstance(InstanceId),
}

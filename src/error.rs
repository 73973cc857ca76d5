//! Error types for world mutation.

use thiserror::Error;

/// Errors raised by structural mutation of a [`PhysicsWorld`](crate::PhysicsWorld).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorldError {
    /// The world is in the middle of a time step.
    #[error("world is locked during a time step")]
    Locked,
    #[error("body handle does not refer to a live body")]
    InvalidBody,
    #[error("fixture handle does not refer to a live fixture")]
    InvalidFixture,
    #[error("joint handle does not refer to a live joint")]
    InvalidJoint,
    /// A joint was asked to connect a body to itself.
    #[error("joint must connect two different bodies")]
    SameBody,
}

pub type WorldResult<T> = Result<T, WorldError>;

use thiserror::Error;

use crate::{BodyId, ConstraintId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PhysError {
	#[error("unknown body {0:?}")]
	UnknownBody(BodyId),

	#[error("unknown constraint {0:?}")]
	UnknownConstraint(ConstraintId),

	#[error("body {body:?} is still referenced by {count} constraint(s)")]
	BodyInUse { body: BodyId, count: usize },

	#[error("template refers to body {index} but the model has {count}")]
	BadTemplate { index: usize, count: usize },
}

pub type Result<T> = std::result::Result<T, PhysError>;

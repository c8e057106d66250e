pub mod body;
pub mod body_group;
pub mod constraint;
pub mod constraint_group;
pub mod controller_message;
pub mod error;
pub mod physical_model;
pub mod pworld;
pub mod time_manager;
pub mod vector;

pub use protocol::V2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub(crate) usize);

impl BodyId {
	pub fn index(self) -> usize {
		self.0
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(pub(crate) usize);

impl ConstraintId {
	pub fn index(self) -> usize {
		self.0
	}
}

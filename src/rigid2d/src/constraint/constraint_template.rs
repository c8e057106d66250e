use super::contact::ContactConstraintTemplate;
use super::distance::DistanceConstraintTemplate;

// Constraints of a physical model, referring to bodies by model index.
#[derive(Clone, Debug)]
pub enum ConstraintTemplate {
	Distance(DistanceConstraintTemplate),
	Contact(ContactConstraintTemplate),
}

impl ConstraintTemplate {
	pub fn bodies(&self) -> [usize; 2] {
		match self {
			Self::Distance(ct) => ct.bodies,
			Self::Contact(ct) => ct.bodies,
		}
	}
}

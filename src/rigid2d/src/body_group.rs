use crate::body::RigidBody;
use crate::constraint::ImpulseData;
use crate::vector::V2Ext;
use crate::{BodyId, V2};
use protocol::pr_model::PrBody;

// slots are never reused
#[derive(Clone, Default)]
pub struct BodyGroup {
	data: Vec<Option<RigidBody>>,
}

impl BodyGroup {
	pub fn add_body(&mut self, body: RigidBody) -> BodyId {
		self.data.push(Some(body));
		BodyId(self.data.len() - 1)
	}

	pub fn remove_body(&mut self, id: BodyId) -> Option<RigidBody> {
		self.data.get_mut(id.0).and_then(Option::take)
	}

	pub fn get(&self, id: BodyId) -> Option<&RigidBody> {
		self.data.get(id.0).and_then(Option::as_ref)
	}

	pub fn get_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
		self.data.get_mut(id.0).and_then(Option::as_mut)
	}

	pub fn contains(&self, id: BodyId) -> bool {
		self.get(id).is_some()
	}

	pub fn len(&self) -> usize {
		self.data.iter().flatten().count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn iter(&self) -> impl Iterator<Item = (BodyId, &RigidBody)> {
		self.data
			.iter()
			.enumerate()
			.filter_map(|(idx, b)| b.as_ref().map(|b| (BodyId(idx), b)))
	}

	/// Applies the weight `gravity * mass` to every dynamic body.
	pub fn apply_gravity(&mut self, gravity: V2) {
		for b in self.data.iter_mut().flatten() {
			if !b.is_static() {
				let weight = gravity * b.mass();
				b.apply_force(weight, None);
			}
		}
	}

	pub fn update(&mut self, dt: f64) {
		for b in self.data.iter_mut().flatten() {
			b.step(dt);
		}
	}

	/// First dynamic body containing `point`, in insertion order.
	pub fn find_at(&self, point: V2) -> Option<BodyId> {
		self.iter()
			.find(|(_, b)| !b.is_static() && b.contains_point(point))
			.map(|(id, _)| id)
	}

	pub fn apply_impulse(&mut self, data: &ImpulseData) {
		if let Some(a) = self.get_mut(data.a) {
			if !a.is_static() {
				a.velocity -= data.impulse * data.inv_mass_a;
				a.angular_velocity -= data.inv_i_a * data.r_a.perp_dot(&data.impulse);
			}
		}
		if let Some(b) = self.get_mut(data.b) {
			if !b.is_static() {
				b.velocity += data.impulse * data.inv_mass_b;
				b.angular_velocity += data.inv_i_b * data.r_b.perp_dot(&data.impulse);
			}
		}
	}

	pub fn pr_bodies(&self) -> Vec<PrBody> {
		self.iter().map(|(id, b)| b.render(id.0)).collect()
	}
}

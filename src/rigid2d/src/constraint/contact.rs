use crate::body_group::BodyGroup;
use crate::constraint::{
	pair, relative_state, render_ends, CRef, Constraint, ConstraintData,
	ImpulseData, MassTerms, SolverParams,
};
use crate::vector::V2Ext;
use crate::{BodyId, ConstraintId, V2};
use protocol::pr_model::PrConstraint;

// closing speed above which restitution kicks in
const RESTITUTION_THRESHOLD: f64 = 1.0;

#[derive(Clone, Debug)]
pub struct ContactConstraintTemplate {
	pub bodies: [usize; 2],
	pub point: V2,
	pub normal: V2,
	pub restitution: f64,
}

/// One-sided, non-penetration constraint at a single contact point.
///
/// The normal is fixed in world space and points from A to B.
#[derive(Clone, Debug)]
pub struct ContactConstraint {
	a: BodyId,
	b: BodyId,
	local_a: V2,
	local_b: V2,
	normal: V2,
	restitution: f64,
	beta: f64,
}

impl ContactConstraint {
	/// Contact at world `point` between two bodies of `bodies`, `None` if
	/// either id is unknown.
	pub fn new(
		bodies: &BodyGroup,
		a: BodyId,
		b: BodyId,
		point: V2,
		normal: V2,
	) -> Option<Self> {
		let (body_a, body_b) = pair(bodies, [a, b])?;
		Some(Self {
			a,
			b,
			local_a: body_a.world_to_local(point),
			local_b: body_b.world_to_local(point),
			normal: normal.normalized_or_zero(),
			restitution: 0.2,
			beta: 0.2,
		})
	}

	pub fn with_restitution(mut self, restitution: f64) -> Self {
		self.restitution = restitution;
		self
	}

	pub fn with_beta(mut self, beta: f64) -> Self {
		self.beta = beta;
		self
	}

	pub fn build(self) -> CRef {
		Box::new(self)
	}

	pub fn normal(&self) -> V2 {
		self.normal
	}

	pub fn restitution(&self) -> f64 {
		self.restitution
	}

	pub fn beta(&self) -> f64 {
		self.beta
	}

	pub fn local_a(&self) -> V2 {
		self.local_a
	}

	pub fn local_b(&self) -> V2 {
		self.local_b
	}
}

impl Constraint for ContactConstraint {
	fn bodies(&self) -> [BodyId; 2] {
		[self.a, self.b]
	}

	fn calculate_constraint(&self, bodies: &BodyGroup) -> Option<ConstraintData> {
		let (body_a, body_b) = pair(bodies, [self.a, self.b])?;
		let (world_a, world_b, r_a, r_b, rel_vel) =
			relative_state(body_a, body_b, [self.local_a, self.local_b]);
		let delta = world_b - world_a;
		// negative is penetration
		let c = delta.dot(&self.normal);
		if c > 0. {
			return None;
		}
		Some(ConstraintData {
			world_a,
			world_b,
			r_a,
			r_b,
			normal: self.normal,
			c,
			rel_vel,
			current_dist: delta.magnitude(),
		})
	}

	fn calculate_impulse(
		&self,
		bodies: &BodyGroup,
		data: &ConstraintData,
		params: &SolverParams,
	) -> Option<ImpulseData> {
		let (body_a, body_b) = pair(bodies, [self.a, self.b])?;
		let terms = MassTerms::new(body_a, body_b, data)?;
		let jv = data.normal.dot(&data.rel_vel);
		let bias = if params.baumgarte {
			self.beta / params.dt * data.c.min(0.)
		} else {
			0.
		};
		// targets a separating speed of restitution * closing speed
		let bounce = if jv < -RESTITUTION_THRESHOLD {
			self.restitution * jv
		} else {
			0.
		};
		let lambda = -(jv + bias + bounce) / terms.k;
		if lambda < 0. {
			return None;
		}
		Some(terms.impulse([self.a, self.b], data.normal * lambda, data))
	}

	fn render(&self, id: ConstraintId, bodies: &BodyGroup) -> Option<PrConstraint> {
		render_ends(
			id,
			bodies,
			[self.a, self.b],
			[self.local_a, self.local_b],
			false,
		)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::body::RigidBody;

	// static floor with top edge at y = 0.5, unit box resting on it
	fn floor_and_box(vy: f64) -> (BodyGroup, ContactConstraint) {
		let mut group = BodyGroup::default();
		let floor = group.add_body(RigidBody::new_static_box(0., 0., 10., 1.));
		let mut body = RigidBody::new_box(0., 1., 1., 1.);
		body.velocity = V2::new(0., vy);
		let body = group.add_body(body);
		let con = ContactConstraint::new(
			&group,
			floor,
			body,
			V2::new(0., 0.5),
			V2::new(0., 1.),
		)
		.unwrap();
		(group, con)
	}

	#[test]
	fn test_new_reads_anchors_from_group() {
		let (group, con) = floor_and_box(0.);
		assert_eq!(con.local_a(), V2::new(0., 0.5));
		assert_eq!(con.local_b(), V2::new(0., -0.5));
		assert_eq!(con.normal(), V2::new(0., 1.));
		assert_eq!(con.restitution(), 0.2);
		assert_eq!(con.beta(), 0.2);
		assert!(ContactConstraint::new(
			&group,
			BodyId(0),
			BodyId(7),
			V2::zeros(),
			V2::new(0., 1.),
		)
		.is_none());
	}

	#[test]
	fn test_separated_contact_inactive() {
		let (mut group, con) = floor_and_box(0.);
		group.get_mut(BodyId(1)).unwrap().position[1] += 0.1;
		assert!(con.calculate_constraint(&group).is_none());
	}

	#[test]
	fn test_penetration_pushes_out() {
		let (mut group, con) = floor_and_box(0.);
		group.get_mut(BodyId(1)).unwrap().position[1] -= 0.1;
		let data = con.calculate_constraint(&group).unwrap();
		assert!((data.c + 0.1).abs() < 1e-12);
		let imp = con
			.calculate_impulse(&group, &data, &SolverParams::default())
			.unwrap();
		con.apply_impulse(&mut group, &imp);
		assert!(group.get(BodyId(1)).unwrap().velocity[1] > 0.);
		assert_eq!(group.get(BodyId(0)).unwrap().velocity, V2::zeros());
	}

	#[test]
	fn test_separating_velocity_not_pulled_back() {
		let (group, con) = floor_and_box(2.);
		assert!(con.evaluate(&group, &SolverParams::default()).is_none());
	}

	#[test]
	fn test_restitution_in_isolation() {
		let (mut group, con) = floor_and_box(-5.);
		let con = con.with_restitution(0.5);
		let imp = con.evaluate(&group, &SolverParams::default()).unwrap();
		con.apply_impulse(&mut group, &imp);
		let vy = group.get(BodyId(1)).unwrap().velocity[1];
		assert!((vy - 2.5).abs() < 1e-9);
	}

	#[test]
	fn test_slow_approach_no_bounce() {
		let (mut group, con) = floor_and_box(-0.5);
		let con = con.with_restitution(1.0);
		let imp = con.evaluate(&group, &SolverParams::default()).unwrap();
		con.apply_impulse(&mut group, &imp);
		let vy = group.get(BodyId(1)).unwrap().velocity[1];
		assert!(vy.abs() < 1e-9);
	}
}

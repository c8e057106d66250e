use crate::body_group::BodyGroup;
use crate::constraint::{
	pair, relative_state, render_ends, CRef, Constraint, ConstraintData,
	ImpulseData, MassTerms, SolverParams,
};
use crate::vector::V2Ext;
use crate::{BodyId, ConstraintId, V2};
use protocol::pr_model::PrConstraint;

// attachment points closer than this have no usable normal
const MIN_DISTANCE: f64 = 1e-6;

#[derive(Clone, Debug)]
pub struct DistanceConstraintTemplate {
	pub bodies: [usize; 2],
	pub locals: [V2; 2],
	pub distance: f64,
	pub stiffness: f64,
}

/// Keeps two attachment points `distance` apart.
///
/// With `distance == 0` this is a revolute joint (pin).
#[derive(Clone, Debug)]
pub struct DistanceConstraint {
	a: BodyId,
	b: BodyId,
	distance: f64,
	stiffness: f64,
	local_a: V2,
	local_b: V2,
	beta: f64,
}

impl DistanceConstraint {
	pub fn new(a: BodyId, b: BodyId, distance: f64) -> Self {
		Self {
			a,
			b,
			distance,
			stiffness: 1.,
			local_a: V2::zeros(),
			local_b: V2::zeros(),
			beta: 0.1,
		}
	}

	pub fn with_stiffness(mut self, stiffness: f64) -> Self {
		self.stiffness = stiffness;
		self
	}

	pub fn with_local(mut self, local_a: V2, local_b: V2) -> Self {
		self.local_a = local_a;
		self.local_b = local_b;
		self
	}

	pub fn with_beta(mut self, beta: f64) -> Self {
		self.beta = beta;
		self
	}

	pub fn build(self) -> CRef {
		Box::new(self)
	}

	pub fn distance(&self) -> f64 {
		self.distance
	}

	pub fn stiffness(&self) -> f64 {
		self.stiffness
	}

	pub fn local_a(&self) -> V2 {
		self.local_a
	}

	pub fn local_b(&self) -> V2 {
		self.local_b
	}

	pub fn is_joint(&self) -> bool {
		self.distance == 0.
	}
}

impl Constraint for DistanceConstraint {
	fn bodies(&self) -> [BodyId; 2] {
		[self.a, self.b]
	}

	fn calculate_constraint(&self, bodies: &BodyGroup) -> Option<ConstraintData> {
		let (body_a, body_b) = pair(bodies, [self.a, self.b])?;
		let (world_a, world_b, r_a, r_b, rel_vel) =
			relative_state(body_a, body_b, [self.local_a, self.local_b]);
		let delta = world_b - world_a;
		let current_dist = delta.magnitude();
		if current_dist < MIN_DISTANCE {
			return None;
		}
		Some(ConstraintData {
			world_a,
			world_b,
			r_a,
			r_b,
			normal: delta.normalized_or_zero(),
			c: current_dist - self.distance,
			rel_vel,
			current_dist,
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
		let bias = if params.baumgarte {
			self.beta / params.dt * data.c
		} else {
			0.
		};
		let jv = data.normal.dot(&data.rel_vel);
		let lambda = -(jv + bias) / terms.k * self.stiffness;
		Some(terms.impulse([self.a, self.b], data.normal * lambda, data))
	}

	fn render(&self, id: ConstraintId, bodies: &BodyGroup) -> Option<PrConstraint> {
		render_ends(
			id,
			bodies,
			[self.a, self.b],
			[self.local_a, self.local_b],
			self.is_joint(),
		)
	}
}

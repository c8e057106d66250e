pub mod constraint_template;
pub mod contact;
pub mod distance;

use dyn_clone::DynClone;

use crate::body::RigidBody;
use crate::body_group::BodyGroup;
use crate::vector::V2Ext;
use crate::{BodyId, ConstraintId, V2};
use protocol::pr_model::PrConstraint;

pub type CRef = Box<dyn Constraint>;

// effective mass below this means neither body can move along the axis
const MIN_EFFECTIVE_MASS: f64 = 1e-6;

#[derive(Clone, Copy, Debug)]
pub struct SolverParams {
	// nominal step used for the Baumgarte bias, not the integration step
	pub dt: f64,
	pub baumgarte: bool,
}

impl Default for SolverParams {
	fn default() -> Self {
		Self {
			dt: 1. / 60.,
			baumgarte: true,
		}
	}
}

/// Evaluated state of a constraint for one solver iteration.
#[derive(Clone, Copy, Debug)]
pub struct ConstraintData {
	pub world_a: V2,
	pub world_b: V2,
	pub r_a: V2,
	pub r_b: V2,
	pub normal: V2,
	pub c: f64,
	pub rel_vel: V2,
	pub current_dist: f64,
}

/// A resolved impulse, self-contained so it can be applied later (Jacobi).
#[derive(Clone, Copy, Debug)]
pub struct ImpulseData {
	pub a: BodyId,
	pub b: BodyId,
	pub impulse: V2,
	pub inv_mass_a: f64,
	pub inv_mass_b: f64,
	pub inv_i_a: f64,
	pub inv_i_b: f64,
	pub r_a: V2,
	pub r_b: V2,
}

pub(crate) struct MassTerms {
	inv_mass_a: f64,
	inv_mass_b: f64,
	inv_i_a: f64,
	inv_i_b: f64,
	pub k: f64,
}

impl MassTerms {
	pub(crate) fn new(
		body_a: &RigidBody,
		body_b: &RigidBody,
		data: &ConstraintData,
	) -> Option<Self> {
		let inv_mass_a = body_a.inv_mass();
		let inv_mass_b = body_b.inv_mass();
		let inv_i_a = body_a.inv_inertia();
		let inv_i_b = body_b.inv_inertia();
		let ra_n = data.r_a.perp_dot(&data.normal);
		let rb_n = data.r_b.perp_dot(&data.normal);
		let k = inv_mass_a
			+ inv_mass_b
			+ inv_i_a * ra_n * ra_n
			+ inv_i_b * rb_n * rb_n;
		if k < MIN_EFFECTIVE_MASS {
			return None;
		}
		Some(Self {
			inv_mass_a,
			inv_mass_b,
			inv_i_a,
			inv_i_b,
			k,
		})
	}

	pub(crate) fn impulse(
		&self,
		ids: [BodyId; 2],
		impulse: V2,
		data: &ConstraintData,
	) -> ImpulseData {
		ImpulseData {
			a: ids[0],
			b: ids[1],
			impulse,
			inv_mass_a: self.inv_mass_a,
			inv_mass_b: self.inv_mass_b,
			inv_i_a: self.inv_i_a,
			inv_i_b: self.inv_i_b,
			r_a: data.r_a,
			r_b: data.r_b,
		}
	}
}

/// Two-phase impulse constraint between two bodies of a world.
///
/// `calculate_constraint` and `calculate_impulse` only read body state, so a
/// whole batch can be evaluated before any impulse is applied.
pub trait Constraint: DynClone + Send + Sync {
	fn bodies(&self) -> [BodyId; 2];

	/// `None` when the constraint is inactive or degenerate this iteration.
	fn calculate_constraint(&self, bodies: &BodyGroup) -> Option<ConstraintData>;

	fn calculate_impulse(
		&self,
		bodies: &BodyGroup,
		data: &ConstraintData,
		params: &SolverParams,
	) -> Option<ImpulseData>;

	fn render(&self, id: ConstraintId, bodies: &BodyGroup) -> Option<PrConstraint>;

	fn evaluate(
		&self,
		bodies: &BodyGroup,
		params: &SolverParams,
	) -> Option<ImpulseData> {
		let data = self.calculate_constraint(bodies)?;
		self.calculate_impulse(bodies, &data, params)
	}

	fn apply_impulse(&self, bodies: &mut BodyGroup, data: &ImpulseData) {
		bodies.apply_impulse(data);
	}
}

dyn_clone::clone_trait_object!(Constraint);

pub(crate) fn pair<'a>(
	bodies: &'a BodyGroup,
	ids: [BodyId; 2],
) -> Option<(&'a RigidBody, &'a RigidBody)> {
	Some((bodies.get(ids[0])?, bodies.get(ids[1])?))
}

pub(crate) fn render_ends(
	id: ConstraintId,
	bodies: &BodyGroup,
	ids: [BodyId; 2],
	locals: [V2; 2],
	joint: bool,
) -> Option<PrConstraint> {
	let (body_a, body_b) = pair(bodies, ids)?;
	let wa = body_a.local_to_world(locals[0]);
	let wb = body_b.local_to_world(locals[1]);
	Some(PrConstraint {
		id: id.index(),
		bodies: [ids[0].index(), ids[1].index()],
		ends: [[wa[0], wa[1]], [wb[0], wb[1]]],
		joint,
	})
}

pub(crate) fn relative_state(
	body_a: &RigidBody,
	body_b: &RigidBody,
	locals: [V2; 2],
) -> (V2, V2, V2, V2, V2) {
	let world_a = body_a.local_to_world(locals[0]);
	let world_b = body_b.local_to_world(locals[1]);
	let r_a = locals[0].rotated(body_a.rotation);
	let r_b = locals[1].rotated(body_b.rotation);
	let rel_vel = body_b.point_velocity(r_b) - body_a.point_velocity(r_a);
	(world_a, world_b, r_a, r_b, rel_vel)
}

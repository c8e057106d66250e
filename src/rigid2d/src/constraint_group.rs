use crate::body_group::BodyGroup;
use crate::constraint::{CRef, Constraint, ImpulseData, SolverParams};
use crate::{BodyId, ConstraintId};
use protocol::pr_model::PrConstraint;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SolverMode {
	/// Evaluate every constraint against the same velocities, then apply.
	#[default]
	Jacobi,
	/// Apply each impulse before evaluating the next constraint.
	GaussSeidel,
}

// insertion order is the solve order
#[derive(Clone, Default)]
pub struct ConstraintGroup {
	id_alloc: usize,
	constraints: Vec<(ConstraintId, CRef)>,
}

impl ConstraintGroup {
	pub fn add_constraint(&mut self, constraint: CRef) -> ConstraintId {
		let id = ConstraintId(self.id_alloc);
		self.id_alloc += 1;
		self.constraints.push((id, constraint));
		id
	}

	pub fn remove_constraint(&mut self, id: ConstraintId) -> Option<CRef> {
		let idx = self.constraints.iter().position(|(k, _)| *k == id)?;
		Some(self.constraints.remove(idx).1)
	}

	pub fn get(&self, id: ConstraintId) -> Option<&dyn Constraint> {
		self.constraints
			.iter()
			.find(|(k, _)| *k == id)
			.map(|(_, v)| &**v)
	}

	pub fn len(&self) -> usize {
		self.constraints.len()
	}

	pub fn is_empty(&self) -> bool {
		self.constraints.is_empty()
	}

	pub fn ids(&self) -> impl Iterator<Item = ConstraintId> + '_ {
		self.constraints.iter().map(|(k, _)| *k)
	}

	/// Number of constraints attached to `body`.
	pub fn references(&self, body: BodyId) -> usize {
		self.constraints
			.iter()
			.filter(|(_, v)| v.bodies().contains(&body))
			.count()
	}

	pub fn solve(
		&self,
		mode: SolverMode,
		bodies: &mut BodyGroup,
		params: &SolverParams,
	) {
		match mode {
			SolverMode::Jacobi => self.solve_jacobi(bodies, params),
			SolverMode::GaussSeidel => self.solve_gauss_seidel(bodies, params),
		}
	}

	pub fn solve_gauss_seidel(&self, bodies: &mut BodyGroup, params: &SolverParams) {
		for (_, constraint) in self.constraints.iter() {
			if let Some(data) = constraint.evaluate(bodies, params) {
				constraint.apply_impulse(bodies, &data);
			}
		}
	}

	pub fn solve_jacobi(&self, bodies: &mut BodyGroup, params: &SolverParams) {
		let impulses = self.evaluate_all(bodies, params);
		for ((_, constraint), data) in self.constraints.iter().zip(impulses) {
			if let Some(data) = data {
				constraint.apply_impulse(bodies, &data);
			}
		}
	}

	#[cfg(not(debug_assertions))]
	fn evaluate_all(
		&self,
		bodies: &BodyGroup,
		params: &SolverParams,
	) -> Vec<Option<ImpulseData>> {
		use rayon::prelude::*;
		self.constraints
			.par_iter()
			.map(|(_, constraint)| constraint.evaluate(bodies, params))
			.collect()
	}

	#[cfg(debug_assertions)]
	fn evaluate_all(
		&self,
		bodies: &BodyGroup,
		params: &SolverParams,
	) -> Vec<Option<ImpulseData>> {
		self.constraints
			.iter()
			.map(|(_, constraint)| constraint.evaluate(bodies, params))
			.collect()
	}

	pub fn pr_constraints(&self, bodies: &BodyGroup) -> Vec<PrConstraint> {
		self.constraints
			.iter()
			.filter_map(|(k, v)| v.render(*k, bodies))
			.collect()
	}
}

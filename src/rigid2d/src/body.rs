use crate::vector::V2Ext;
use crate::V2;
use protocol::pr_model::PrBody;

/// An oriented rectangular box.
///
/// Shape and mass are fixed at construction. A static body has infinite mass
/// and inertia, so it contributes zero inverse terms to every impulse and is
/// never integrated.
#[derive(Clone, Debug)]
pub struct RigidBody {
	pub position: V2,
	pub velocity: V2,
	// force accumulator, cleared by `step`
	pub acceleration: V2,
	pub rotation: f64,
	pub angular_velocity: f64,
	// torque accumulator, cleared by `step`
	pub torque: f64,
	width: f64,
	height: f64,
	is_static: bool,
	mass: f64,
	inertia: f64,
}

impl RigidBody {
	pub fn new(pos: V2, width: f64, height: f64, is_static: bool) -> Self {
		let (mass, inertia) = if is_static {
			(f64::INFINITY, f64::INFINITY)
		} else {
			let mass = width * height;
			(mass, mass * (width * width + height * height) / 12.)
		};
		Self {
			position: pos,
			velocity: V2::zeros(),
			acceleration: V2::zeros(),
			rotation: 0.,
			angular_velocity: 0.,
			torque: 0.,
			width,
			height,
			is_static,
			mass,
			inertia,
		}
	}

	pub fn new_box(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self::new(V2::new(x, y), width, height, false)
	}

	pub fn new_static_box(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self::new(V2::new(x, y), width, height, true)
	}

	pub fn width(&self) -> f64 {
		self.width
	}

	pub fn height(&self) -> f64 {
		self.height
	}

	pub fn is_static(&self) -> bool {
		self.is_static
	}

	pub fn mass(&self) -> f64 {
		self.mass
	}

	pub fn inertia(&self) -> f64 {
		self.inertia
	}

	pub fn inv_mass(&self) -> f64 {
		if self.is_static {
			0.
		} else {
			1. / self.mass
		}
	}

	pub fn inv_inertia(&self) -> f64 {
		if self.is_static {
			0.
		} else {
			1. / self.inertia
		}
	}

	/// Semi-implicit Euler, then clears the accumulators.
	pub fn step(&mut self, dt: f64) {
		if self.is_static {
			return;
		}
		self.velocity += self.acceleration * dt;
		self.position += self.velocity * dt;
		self.angular_velocity += self.torque / self.inertia * dt;
		self.rotation += self.angular_velocity * dt;
		self.acceleration = V2::zeros();
		self.torque = 0.;
	}

	/// Accumulates a force, and its torque when applied off-center.
	pub fn apply_force(&mut self, force: V2, world_point: Option<V2>) {
		if self.is_static {
			return;
		}
		self.acceleration += force / self.mass;
		if let Some(p) = world_point {
			let r = p - self.position;
			self.torque += r.perp_dot(&force);
		}
	}

	pub fn local_to_world(&self, local_point: V2) -> V2 {
		self.position + local_point.rotated(self.rotation)
	}

	pub fn world_to_local(&self, world_point: V2) -> V2 {
		(world_point - self.position).rotated(-self.rotation)
	}

	/// Velocity of a point at lever arm `r` (world orientation).
	pub fn point_velocity(&self, r: V2) -> V2 {
		self.velocity + r.perpendicular() * self.angular_velocity
	}

	pub fn contains_point(&self, world_point: V2) -> bool {
		let local = self.world_to_local(world_point);
		let hw = self.width / 2.;
		let hh = self.height / 2.;
		local[0] >= -hw && local[0] <= hw && local[1] >= -hh && local[1] <= hh
	}

	pub fn render(&self, id: usize) -> PrBody {
		PrBody {
			id,
			pos: [self.position[0], self.position[1]],
			rotation: self.rotation,
			size: [self.width, self.height],
			fixed: self.is_static,
		}
	}
}

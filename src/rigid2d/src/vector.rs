use crate::V2;

// below this length a vector has no usable direction
const MIN_NORM: f64 = 1e-12;

pub trait V2Ext {
	fn rotated(&self, angle: f64) -> V2;

	/// 90 degree counter-clockwise rotation, `(-y, x)`.
	fn perpendicular(&self) -> V2;

	/// 2D cross product `a.x * b.y - a.y * b.x`.
	fn perp_dot(&self, other: &V2) -> f64;

	/// Unit vector, or zero for a (near) zero length input.
	fn normalized_or_zero(&self) -> V2;
}

impl V2Ext for V2 {
	fn rotated(&self, angle: f64) -> V2 {
		let (sin, cos) = angle.sin_cos();
		V2::new(self[0] * cos - self[1] * sin, self[0] * sin + self[1] * cos)
	}

	fn perpendicular(&self) -> V2 {
		V2::new(-self[1], self[0])
	}

	fn perp_dot(&self, other: &V2) -> f64 {
		self[0] * other[1] - self[1] * other[0]
	}

	fn normalized_or_zero(&self) -> V2 {
		self.try_normalize(MIN_NORM).unwrap_or_else(V2::zeros)
	}
}

// pr_model: Physical model for rendering

#[derive(Clone, Debug, PartialEq)]
pub struct PrBody {
	pub id: usize,
	pub pos: [f64; 2],
	pub rotation: f64,
	pub size: [f64; 2],
	pub fixed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PrConstraint {
	pub id: usize,
	pub bodies: [usize; 2],
	// world attachment points
	pub ends: [[f64; 2]; 2],
	// zero length distance constraint, drawn as a single point
	pub joint: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrModel {
	pub bodies: Vec<PrBody>,
	pub constraints: Vec<PrConstraint>,
}

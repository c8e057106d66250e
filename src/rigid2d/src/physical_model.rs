use crate::constraint::constraint_template::ConstraintTemplate;
use crate::constraint::contact::ContactConstraintTemplate;
use crate::constraint::distance::DistanceConstraintTemplate;
use crate::V2;

#[derive(Clone, Debug)]
pub struct BodyTemplate {
	pub pos: V2,
	pub size: V2,
	pub fixed: bool,
}

/// Bodies and constraints in model space, constraints referring to bodies
/// by index. Instantiated with `PWorld::add_model`.
#[derive(Clone, Debug, Default)]
pub struct PhysicalModel {
	pub bodies: Vec<BodyTemplate>,
	pub constraints: Vec<ConstraintTemplate>,
}

impl PhysicalModel {
	/// A static pin at the origin with `links` boxes hanging off it to the
	/// right, every joint a zero length distance constraint.
	pub fn new_chain(links: usize, link_len: f64, thickness: f64) -> Self {
		let mut bodies = vec![BodyTemplate {
			pos: V2::zeros(),
			size: V2::new(0.1, 0.1),
			fixed: true,
		}];
		let mut constraints = vec![];
		let half = link_len / 2.;
		for idx in 0..links {
			bodies.push(BodyTemplate {
				pos: V2::new(half + link_len * idx as f64, 0.),
				size: V2::new(link_len, thickness),
				fixed: false,
			});
			// the pin has no extent, links attach at their ends
			let local_a = if idx == 0 {
				V2::zeros()
			} else {
				V2::new(half, 0.)
			};
			constraints.push(ConstraintTemplate::Distance(
				DistanceConstraintTemplate {
					bodies: [idx, idx + 1],
					locals: [local_a, V2::new(-half, 0.)],
					distance: 0.,
					stiffness: 1.,
				},
			));
		}
		Self {
			bodies,
			constraints,
		}
	}

	/// A static floor with its top at y = 0 and `count` boxes stacked on it,
	/// each resting on the one below through a contact at its bottom center.
	pub fn new_stack(count: usize, size: f64) -> Self {
		let mut bodies = vec![BodyTemplate {
			pos: V2::new(0., -0.5),
			size: V2::new((size * 8.).max(10.), 1.),
			fixed: true,
		}];
		let mut constraints = vec![];
		for idx in 0..count {
			bodies.push(BodyTemplate {
				pos: V2::new(0., size * (idx as f64 + 0.5)),
				size: V2::new(size, size),
				fixed: false,
			});
			constraints.push(ConstraintTemplate::Contact(
				ContactConstraintTemplate {
					bodies: [idx, idx + 1],
					point: V2::new(0., size * idx as f64),
					normal: V2::new(0., 1.),
					restitution: 0.,
				},
			));
		}
		Self {
			bodies,
			constraints,
		}
	}
}

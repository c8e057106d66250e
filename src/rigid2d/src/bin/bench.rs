use std::time::Instant;

use rand::Rng;
use rigid2d::constraint_group::SolverMode;
use rigid2d::physical_model::PhysicalModel;
use rigid2d::pworld::PWorld;
use rigid2d::V2;

fn build(solver: SolverMode) -> PWorld {
	let mut rng = rand::thread_rng();
	let mut pworld = PWorld::default().with_solver(solver).with_ppr(10);
	for m in 0..8 {
		let links = rng.gen_range(4..12);
		let chain = PhysicalModel::new_chain(links, 0.5, 0.1);
		let offset = V2::new(-20. + 5. * m as f64, rng.gen_range(5.0..10.0));
		if let Err(e) = pworld.add_model(chain, offset) {
			eprintln!("ERROR: {}", e);
		}
	}
	for m in 0..4 {
		let stack = PhysicalModel::new_stack(rng.gen_range(3..8), 0.5);
		if let Err(e) = pworld.add_model(stack, V2::new(-15. + 10. * m as f64, 0.)) {
			eprintln!("ERROR: {}", e);
		}
	}
	pworld
}

fn main() {
	for solver in [SolverMode::Jacobi, SolverMode::GaussSeidel] {
		let mut pworld = build(solver);
		let start = Instant::now();
		let rframes = 100;
		for _ in 0..rframes {
			pworld.run();
		}
		let time = rframes as f64 * pworld.dt * pworld.ppr as f64;
		let duration = start.elapsed().as_secs_f64();
		eprintln!(
			"{:?}: {} bodies, {} constraints, {:.3}%",
			solver,
			pworld.body_count(),
			pworld.constraint_count(),
			duration / time * 100.
		);
	}
}

use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeModel {
	// as fast as possible, every frame counts as exactly one frame time
	VideoRender,
	RtFrameLock,
}

pub struct TimeManager {
	// seconds of wall time per frame
	pft: f64,
	model: TimeModel,
	start_time: Instant,
}

impl TimeManager {
	pub fn new(pft: f64, model: TimeModel) -> Self {
		Self {
			pft,
			model,
			start_time: Instant::now(),
		}
	}

	/// Starts a fresh frame, so time spent blocked while paused is not
	/// counted as load.
	pub fn reset(&mut self) {
		self.start_time = Instant::now();
	}

	/// Waits out the rest of the frame when frame locked and returns the
	/// load, the fraction of the frame time spent working.
	pub fn take_time(&mut self) -> f32 {
		let passed = self.start_time.elapsed().as_secs_f64();
		let load = if self.pft > 0. {
			(passed / self.pft) as f32
		} else {
			0.
		};
		if self.model == TimeModel::RtFrameLock && passed < self.pft {
			std::thread::sleep(Duration::from_secs_f64(self.pft - passed));
		}
		self.start_time = Instant::now();
		load
	}
}

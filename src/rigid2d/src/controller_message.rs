pub enum ControllerMessage {
	TogglePause,
	FrameForward,
	// world coordinates of the cursor
	Grab([f64; 2]),
	Drag([f64; 2]),
	Release,
}

/// Remote anchor store reachable from the Android emulator host loopback.
pub const DEFAULT_ENDPOINT: &str = "http://10.0.2.2:5000";

pub const DEFAULT_ROOM_ID: &str = "1";

pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Float count of an encoded anchor position (x, y, z).
pub const POSE_COMPONENTS: usize = 3;

/// Float count of an encoded column-major 4x4 model matrix.
pub const MODEL_MATRIX_COMPONENTS: usize = 16;

// Traffic light cycle bounds (milliseconds)
pub const MIN_CYCLE_MS: u64 = 4000;
pub const MAX_CYCLE_MS: u64 = 6000;

// Polling quanta for the background loops (milliseconds)
pub const LIGHT_POLL_MS: u64 = 1;
pub const ADMISSION_POLL_MS: u64 = 1;

// Artificial production delay before each phase publication (milliseconds).
// The reference light used 100 ms; zero keeps phase delivery immediate.
pub const PHASE_SEND_DELAY_MS: u64 = 0;

// Demo driver defaults
pub const DEFAULT_VEHICLE_COUNT: usize = 8;
pub const DEFAULT_CROSSING_MS: u64 = 500;
pub const DEFAULT_MAX_APPROACH_MS: u64 = 3000;

// Phase changes kept queued for waiters; older ones are stale and dropped
pub const MAX_PENDING_PHASES: usize = 2;

// control_system/mod.rs
pub mod phase_queue;
pub mod traffic_light_controller;

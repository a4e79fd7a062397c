// simulation_engine/mod.rs
pub mod admission_gate;
pub mod intersection;
pub mod streets;
pub mod vehicles;

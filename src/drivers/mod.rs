//! Actuator drivers, face frames, and hardware initialisation.

pub mod buzzer;
pub mod face;
pub mod hw_init;
pub mod motor;

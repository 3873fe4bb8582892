#[cfg(feature = "devel")]
pub mod debug;

pub mod camera;
pub mod config;
pub mod first_person_controller;
pub mod game;
pub mod grab;
pub mod input;
pub mod lerp;
pub mod physics;
pub mod portal;

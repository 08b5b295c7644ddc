//! Underwater ecosystem simulation: schooling fish with predator/prey
//! behavior, multi-view visibility, and a command-queue control surface.
//! Rendering and UI are collaborators; this crate owns only the world
//! state and its fixed-timestep evolution.

pub mod app;
pub mod command;
pub mod debug;
pub mod error;
pub mod location;
pub mod preset;
pub mod scene;
pub mod seabed;
pub mod sim;
pub mod spatial;
pub mod view;

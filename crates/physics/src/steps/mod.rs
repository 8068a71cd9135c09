//! # Frame passes
//!
//! One function per pass, each operating on a single instance: its
//! [`HeadInfo`](crate::HeadInfo) and its particle block. The passes run in
//! [`compute::Kernel::FRAME_ORDER`], with a barrier between any two.

mod constraint;
mod contact;
mod integration;
mod propagate;
mod root;
mod write_back;

pub use constraint::solve_constraints;
pub use contact::{resolve_collisions, update_orientations};
pub use integration::integrate;
pub use propagate::propagate_rest;
pub use root::capture_root;
pub use write_back::write_back;

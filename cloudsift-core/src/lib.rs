//! Core data structures and traits for cloudsift
//!
//! This crate provides the fundamental types shared by the cloudsift
//! pipeline: points, point clouds, and the traits the processing stages
//! are written against.

pub mod point;
pub mod point_cloud;
pub mod traits;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Vector4, Matrix3};

/// Common result type for cloudsift operations
pub type Result<T> = std::result::Result<T, Error>;

//! # HLSL2MSL
//!
//! This is a meta crate that re-exports all the sub libraries

pub use hlsl2msl_msl as msl;
pub use hlsl2msl_tree as tree;

pub use hlsl2msl_msl::{GenerateError, MslGenerator, Options, Target};

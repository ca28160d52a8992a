//! # HLSL2MSL - MSL Generator
//!
//! This library contains the logic to convert a resolved HLSL shader tree
//! into MSL source for the vertex and fragment pipeline stages.
//!
//! We assume the generated code will be built with:
//! * -std=metal2.0 or later
//!
//! The source language exposes buffers, textures and samplers as free
//! standing globals. Metal requires every resource reachable from an entry
//! point to be an explicit entry point argument, so the generator gathers
//! the reachable resources into a single argument buffer struct and threads
//! a reference to it through the call graph.

mod generator;

pub use generator::{GenerateError, MslGenerator, Options, Target};

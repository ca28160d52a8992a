//! # HLSL2MSL - Shader Tree
//!
//! The tree library contains all the definitions for the resolved abstract
//! syntax tree handed to the generator backend. The root of a tree is a
//! [Tree] instance.
//!
//! The tree is produced by an upstream parser and type checker: every
//! expression node carries its resolved type and all names are assumed to
//! resolve. The backend treats the tree as read-only.

mod declarations;
mod expressions;
mod module;
mod statements;
mod types;

pub use declarations::*;
pub use expressions::*;
pub use module::*;
pub use statements::*;
pub use types::*;

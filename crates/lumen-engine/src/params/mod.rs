//! Declarative parameters that let an external control surface mutate
//! session state.
//!
//! Each descriptor carries a `StateCommand` instead of a callback; every
//! command is applied by the same function, `apply_command`.

mod binding;
mod descriptor;

pub use binding::{apply_command, apply_defaults};
pub use descriptor::{
    Axis, ParameterDescriptor, ParameterError, ParameterKind, ParameterSet, ParameterValue,
    StateCommand, StateTarget,
};

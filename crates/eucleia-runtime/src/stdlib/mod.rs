//! Standard library modules
//!
//! Each module is a set of named native functions installed into the
//! importing scope by `import <name>`. Natives receive the unevaluated
//! argument nodes and the calling scope, and drive their own argument
//! evaluation.

pub mod io;
pub mod math;

use crate::value::NativeFunction;

/// Native functions for a stdlib module, or `None` for an unknown name
pub fn module(name: &str) -> Option<Vec<NativeFunction>> {
    match name {
        "io" => Some(io::natives()),
        "math" => Some(math::natives()),
        _ => None,
    }
}

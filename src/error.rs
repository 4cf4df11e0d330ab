use thiserror::Error;

use crate::object::Object;

/// Anything that unwinds the tree walk: genuine runtime errors plus the
/// `break`/`continue`/`return` control-flow signals. Loops catch `Break` and
/// `Continue`, call frames catch `Return`; everything else propagates to the
/// top-level `interpret`.
#[derive(Debug, Error, PartialEq)]
pub enum RuntimeInterrupt {
    #[error("[line {line}] {msg}")]
    Error { line: i32, msg: String },

    #[error("[line {line}] Unexpected break statement")]
    Break { line: i32 },

    #[error("[line {line}] Unexpected continue statement")]
    Continue { line: i32 },

    #[error("[line {line}] Unexpected return statement")]
    Return { line: i32, value: Object },
}

impl RuntimeInterrupt {
    pub fn error(line: i32, msg: impl AsRef<str>) -> Self {
        Self::Error { line, msg: msg.as_ref().to_owned() }
    }
}

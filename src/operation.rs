//! Compositing operations and the pending-operation selector.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

/// Operation applied between the accumulated result and the newest mask.
///
/// `None` means "skip the accumulation pass this frame" and has no shader code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    #[default]
    None,
    And,
    Or,
    Not,
    Silhouette,
    Grey,
}

impl Operation {
    pub const ACTIVE: [Operation; 5] = [
        Operation::And,
        Operation::Or,
        Operation::Not,
        Operation::Silhouette,
        Operation::Grey,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::None => "NONE",
            Operation::And => "AND",
            Operation::Or => "OR",
            Operation::Not => "NOT",
            Operation::Silhouette => "SILHOUETTE",
            Operation::Grey => "GREY",
        }
    }

    pub fn is_active(self) -> bool {
        self.shader_code().is_some()
    }

    /// The `uOperation` value for this operation, or `None` for [`Operation::None`].
    pub fn shader_code(self) -> Option<OpCode> {
        let code = match self {
            Operation::None => return None,
            Operation::And => 0,
            Operation::Or => 1,
            Operation::Not => 2,
            Operation::Silhouette => 3,
            Operation::Grey => 4,
        };
        Some(OpCode(code))
    }

    /// Maps a command token (a key name) to an operation.
    ///
    /// `x`/`X` are reserved for XOR, which has no shader implementation, and map to
    /// nothing like any other unknown token.
    pub fn from_token(token: &str) -> Option<Operation> {
        match token {
            "s" | "S" => Some(Operation::Silhouette),
            "g" | "G" => Some(Operation::Grey),
            "a" | "A" | "*" | "&" | "^" => Some(Operation::And),
            "o" | "O" | "+" | "|" => Some(Operation::Or),
            "n" | "N" | "-" | "!" => Some(Operation::Not),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shader code of an active operation. Only obtainable from an active
/// [`Operation`], so the accumulation pass can never be handed `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpCode(u32);

/// Red-channel value at or above which a texel counts as foreground (0.5 in the shader).
pub const FOREGROUND_THRESHOLD: u8 = 128;

impl OpCode {
    pub fn get(self) -> u32 {
        self.0
    }

    /// What `boolean.frag` writes for one RGBA8 texel, given the previous
    /// accumulated texel and the mask texel.
    pub fn shade(self, previous: [u8; 4], mask: [u8; 4]) -> [u8; 4] {
        let fg = |texel: [u8; 4]| texel[0] >= FOREGROUND_THRESHOLD;
        let binary = |on: bool| if on { 255 } else { 0 };
        let value = match self.0 {
            0 => binary(fg(previous) && fg(mask)),
            1 => binary(fg(previous) || fg(mask)),
            2 => binary(!fg(mask)),
            3 => binary(fg(mask)),
            _ => mask[0],
        };
        [value, value, value, 255]
    }
}

/// Holds the operation to apply on the next accumulation pass.
///
/// Clones share the same slot: the input handler keeps one and writes to it, the
/// frame pipeline keeps another and consumes from it. Both live on the same thread.
#[derive(Debug, Clone, Default)]
pub struct OperationSelector {
    pending: Rc<Cell<Operation>>,
}

impl OperationSelector {
    pub fn new(initial: Operation) -> Self {
        Self {
            pending: Rc::new(Cell::new(initial)),
        }
    }

    pub fn pending(&self) -> Operation {
        self.pending.get()
    }

    pub fn set(&self, operation: Operation) {
        self.pending.set(operation);
    }

    /// Applies a command token. Unknown tokens leave the pending operation alone.
    pub fn handle_token(&self, token: &str) -> Option<Operation> {
        let operation = Operation::from_token(token)?;
        self.set(operation);
        Some(operation)
    }

    /// Returns the pending operation and resets it to [`Operation::None`].
    pub fn consume(&self) -> Operation {
        self.pending.replace(Operation::None)
    }
}

//! Qubit, classical bit and control types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Unique identifier for a physical qubit (wire) within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QubitId(pub u32);

impl QubitId {
    /// Position of this qubit's lane in per-qubit tables.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u32> for QubitId {
    fn from(id: u32) -> Self {
        QubitId(id)
    }
}

/// Unique identifier for a classical bit within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClbitId(pub u32);

impl ClbitId {
    /// Position of this bit in per-bit tables.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClbitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl From<u32> for ClbitId {
    fn from(id: u32) -> Self {
        ClbitId(id)
    }
}

/// Polarity of a control qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ControlKind {
    /// Active when the control qubit is |0⟩.
    Neg,
    /// Active when the control qubit is |1⟩.
    Pos,
}

/// A control qubit together with its polarity.
///
/// Controls order by qubit first, so a [`Controls`] set iterates in
/// ascending qubit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Control {
    /// The controlling qubit.
    pub qubit: QubitId,
    /// Polarity of the control.
    pub kind: ControlKind,
}

impl Control {
    /// A positive control on `qubit`.
    pub fn pos(qubit: impl Into<QubitId>) -> Self {
        Self {
            qubit: qubit.into(),
            kind: ControlKind::Pos,
        }
    }

    /// A negative control on `qubit`.
    pub fn neg(qubit: impl Into<QubitId>) -> Self {
        Self {
            qubit: qubit.into(),
            kind: ControlKind::Neg,
        }
    }

    /// Whether this control is active on |1⟩.
    pub fn is_positive(&self) -> bool {
        self.kind == ControlKind::Pos
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ControlKind::Pos => write!(f, "{}", self.qubit),
            ControlKind::Neg => write!(f, "!{}", self.qubit),
        }
    }
}

/// Ordered set of controls attached to an operation.
pub type Controls = BTreeSet<Control>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qubit_display() {
        assert_eq!(format!("{}", QubitId(3)), "q3");
        assert_eq!(format!("{}", ClbitId(1)), "c1");
    }

    #[test]
    fn test_control_display() {
        assert_eq!(format!("{}", Control::pos(QubitId(0))), "q0");
        assert_eq!(format!("{}", Control::neg(QubitId(2))), "!q2");
    }

    #[test]
    fn test_controls_iterate_by_qubit() {
        let mut controls = Controls::new();
        controls.insert(Control::pos(QubitId(4)));
        controls.insert(Control::neg(QubitId(1)));
        controls.insert(Control::pos(QubitId(2)));

        let order: Vec<u32> = controls.iter().map(|c| c.qubit.0).collect();
        assert_eq!(order, vec![1, 2, 4]);
    }

    #[test]
    fn test_control_polarity() {
        assert!(Control::pos(QubitId(0)).is_positive());
        assert!(!Control::neg(QubitId(0)).is_positive());
        assert_ne!(Control::pos(QubitId(0)), Control::neg(QubitId(0)));
    }
}

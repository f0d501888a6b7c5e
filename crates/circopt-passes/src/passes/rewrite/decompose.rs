//! Gate decompositions into CNOT and Z based equivalents.

use circopt_ir::{Circuit, Control, Controls, OpType, Operation, QubitId, StandardOperation};
use tracing::debug;

use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

fn with_control(controls: &Controls, extra: Control) -> Controls {
    let mut all = controls.clone();
    all.insert(extra);
    all
}

/// CNOT sequence equivalent to a (possibly controlled) SWAP of `a` and `b`.
///
/// On a directed architecture the middle CNOT is flipped with Hadamards so
/// every CNOT runs from `a` to `b`.
fn swap_sequence(gate: &StandardOperation, directed: bool) -> Vec<Operation> {
    let (a, b) = (gate.targets[0], gate.targets[1]);
    let outer = || Operation::from(StandardOperation::cx(a, b));
    let h = |q: QubitId| Operation::gate(OpType::H, [q]);

    if directed {
        vec![
            outer(),
            h(a),
            h(b),
            StandardOperation::controlled(
                OpType::X,
                with_control(&gate.controls, Control::pos(a)),
                [b],
            )
            .into(),
            h(a),
            h(b),
            outer(),
        ]
    } else {
        vec![
            outer(),
            StandardOperation::controlled(
                OpType::X,
                with_control(&gate.controls, Control::pos(b)),
                [a],
            )
            .into(),
            outer(),
        ]
    }
}

/// A SWAP with any number of controls.
fn is_any_swap(gate: &StandardOperation) -> bool {
    gate.op_type == OpType::Swap && gate.targets.len() == 2
}

fn expand_swaps(ops: Vec<Operation>, directed: bool, count: &mut usize) -> Vec<Operation> {
    let mut out = Vec::with_capacity(ops.len());
    for op in ops {
        match op {
            Operation::Standard(gate) if is_any_swap(&gate) => {
                out.extend(swap_sequence(&gate, directed));
                *count += 1;
            }
            Operation::Compound(mut comp) => {
                comp.ops = expand_swaps(std::mem::take(&mut comp.ops), directed, count);
                out.push(Operation::Compound(comp));
            }
            other => out.push(other),
        }
    }
    out
}

/// Replace every SWAP, controlled or not, by three CNOTs.
///
/// With `directed` set, the middle CNOT is reversed using four Hadamards
/// so all CNOTs share one orientation.
pub fn decompose_swap(circuit: &mut Circuit, directed: bool) {
    let mut count = 0usize;
    let ops = circuit.take_ops();
    circuit.set_ops(expand_swaps(ops, directed, &mut count));
    debug!(swaps = count, directed, "decomposed swaps");
}

fn is_multi_controlled_x(gate: &StandardOperation) -> bool {
    gate.op_type == OpType::X && !gate.controls.is_empty() && gate.targets.len() == 1
}

fn expand_mcx(ops: Vec<Operation>, count: &mut usize) -> Vec<Operation> {
    let mut out = Vec::with_capacity(ops.len());
    for op in ops {
        match op {
            Operation::Standard(gate) if is_multi_controlled_x(&gate) => {
                let target = gate.targets[0];
                out.push(Operation::gate(OpType::H, [target]));
                out.push(StandardOperation::controlled(OpType::Z, gate.controls, [target]).into());
                out.push(Operation::gate(OpType::H, [target]));
                *count += 1;
            }
            Operation::Compound(mut comp) => {
                comp.ops = expand_mcx(std::mem::take(&mut comp.ops), count);
                out.push(Operation::Compound(comp));
            }
            other => out.push(other),
        }
    }
    out
}

/// Rewrite each controlled X as `H · C..Z · H` on its target, keeping the
/// controls and their polarity.
pub fn replace_mcx_with_mcz(circuit: &mut Circuit) {
    let mut count = 0usize;
    let ops = circuit.take_ops();
    circuit.set_ops(expand_mcx(ops, &mut count));
    debug!(replaced = count, "replaced controlled X with controlled Z");
}

/// Pass wrapper for [`decompose_swap`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DecomposeSwap {
    directed: bool,
}

impl DecomposeSwap {
    /// Create a new SWAP decomposition pass.
    pub fn new(directed: bool) -> Self {
        Self { directed }
    }

    /// Whether CNOTs are emitted in a single orientation.
    pub fn is_directed(&self) -> bool {
        self.directed
    }
}

impl Pass for DecomposeSwap {
    fn name(&self) -> &'static str {
        "decompose_swap"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, _properties: &mut PropertySet) -> CompileResult<()> {
        decompose_swap(circuit, self.directed);
        Ok(())
    }
}

/// Pass wrapper for [`replace_mcx_with_mcz`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceMcxWithMcz;

impl ReplaceMcxWithMcz {
    /// Create a new controlled-X rewriting pass.
    pub fn new() -> Self {
        Self
    }
}

impl Pass for ReplaceMcxWithMcz {
    fn name(&self) -> &'static str {
        "replace_mcx_with_mcz"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, _properties: &mut PropertySet) -> CompileResult<()> {
        replace_mcx_with_mcz(circuit);
        Ok(())
    }
}

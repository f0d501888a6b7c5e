//! Pass manager for orchestrating optimization.

use tracing::{debug, info, instrument};

use circopt_ir::Circuit;

use crate::config::OptimizerConfig;
use crate::error::CompileResult;
use crate::pass::Pass;
use crate::passes::{
    BackpropagateOutputPermutation, CancelCnots, CollectBlocks, DecomposeSwap, DeferMeasurements,
    DynamicCircuitAnalysis, EliminateResets, FlattenOperations, RemoveDiagonalGatesBeforeMeasure,
    RemoveFinalMeasurements, RemoveIdentities, SingleQubitGateFusion, SwapReconstruction,
};
use crate::property::PropertySet;

/// Manages and executes a sequence of optimization passes.
pub struct PassManager {
    /// The passes to execute, in order.
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Names of the scheduled passes, in execution order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Run all passes on the given circuit.
    ///
    /// Stops at the first failing pass; the circuit keeps the changes made
    /// by the passes that already completed.
    #[instrument(skip(self, circuit, properties), fields(circuit = circuit.name()))]
    pub fn run(&self, circuit: &mut Circuit, properties: &mut PropertySet) -> CompileResult<()> {
        info!(
            "Running pass manager with {} passes on circuit with {} qubits and {} ops",
            self.passes.len(),
            circuit.num_qubits(),
            circuit.num_ops()
        );

        for pass in &self.passes {
            if pass.should_run(circuit, properties) {
                debug!("Running pass: {}", pass.name());
                pass.run(circuit, properties)?;
                debug!("Pass {} completed, ops: {}", pass.name(), circuit.num_ops());
            } else {
                debug!("Skipping pass: {}", pass.name());
            }
        }

        info!(
            "Pass manager completed, qubits: {}, ops: {}",
            circuit.num_qubits(),
            circuit.num_ops()
        );

        Ok(())
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating pass managers with preset configurations.
pub struct PassManagerBuilder {
    /// Pass selection.
    config: OptimizerConfig,
    /// Initial properties.
    properties: PropertySet,
}

impl PassManagerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: OptimizerConfig::default(),
            properties: PropertySet::new(),
        }
    }

    /// Set the optimization level.
    ///
    /// - Level 0: Dynamic-circuit analysis and identity removal only
    /// - Level 1: + SWAP reconstruction, CNOT cancellation, single-qubit
    ///   fusion (default)
    /// - Level 2: + Diagonal gate removal before measurements
    /// - Level 3: + Block collection
    #[must_use]
    pub fn with_optimization_level(mut self, level: u8) -> Self {
        self.config.optimization_level = level.min(3);
        self
    }

    /// Use `config` for pass selection.
    #[must_use]
    pub fn with_config(mut self, config: OptimizerConfig) -> Self {
        let level = config.optimization_level.min(3);
        self.config = config;
        self.config.optimization_level = level;
        self
    }

    /// Set the initial properties.
    #[must_use]
    pub fn with_properties(mut self, properties: PropertySet) -> Self {
        self.properties = properties;
        self
    }

    /// Build the pass manager and return it with the properties.
    pub fn build(self) -> (PassManager, PropertySet) {
        let config = &self.config;
        let level = config.optimization_level;
        let mut pm = PassManager::new();

        pm.add_pass(DynamicCircuitAnalysis::new());

        // Dynamic-circuit rewrites go first so later passes see a unitary
        // prefix followed by measurements.
        if config.eliminate_resets {
            pm.add_pass(EliminateResets::new());
        }
        if config.defer_measurements {
            pm.add_pass(DeferMeasurements::new());
        }

        pm.add_pass(RemoveIdentities::new());

        if level >= 1 {
            pm.add_pass(SwapReconstruction::new());
            pm.add_pass(CancelCnots::new());
            pm.add_pass(SingleQubitGateFusion::new());
        }

        if config.decompose_swaps {
            pm.add_pass(DecomposeSwap::new(config.directed_architecture));
        }

        if level >= 2 {
            pm.add_pass(RemoveDiagonalGatesBeforeMeasure::new());
            if config.remove_final_measurements {
                pm.add_pass(RemoveFinalMeasurements::new());
            }
        }

        if level >= 3 {
            pm.add_pass(CollectBlocks::new(config.max_block_size.max(1)));
        }

        if config.flatten {
            pm.add_pass(FlattenOperations::new());
        }
        if config.backpropagate_output_permutation {
            pm.add_pass(BackpropagateOutputPermutation::new());
        }

        (pm, self.properties)
    }
}

impl Default for PassManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::DynamicCircuit;
    use circopt_ir::{ClbitId, QubitId};

    #[test]
    fn test_empty_pass_manager() {
        let pm = PassManager::new();
        assert!(pm.is_empty());
        assert_eq!(pm.len(), 0);
    }

    #[test]
    fn test_pass_manager_run() {
        let pm = PassManager::new();
        let mut props = PropertySet::new();

        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();

        pm.run(&mut circuit, &mut props).unwrap();
        assert_eq!(circuit.num_ops(), 2);
    }

    #[test]
    fn test_level_zero() {
        let (pm, _) = PassManagerBuilder::new()
            .with_optimization_level(0)
            .build();
        assert_eq!(
            pm.pass_names(),
            ["dynamic_circuit_analysis", "remove_identities"]
        );
    }

    #[test]
    fn test_levels_grow() {
        let lengths: Vec<usize> = (0..=3)
            .map(|level| {
                PassManagerBuilder::new()
                    .with_optimization_level(level)
                    .build()
                    .0
                    .len()
            })
            .collect();
        assert!(lengths.windows(2).all(|w| w[0] < w[1]), "{lengths:?}");
    }

    #[test]
    fn test_level_clamped() {
        let (pm, _) = PassManagerBuilder::new()
            .with_optimization_level(9)
            .build();
        assert_eq!(pm.pass_names().last(), Some(&"collect_blocks"));
    }

    #[test]
    fn test_config_flags_schedule_passes() {
        let config = OptimizerConfig {
            optimization_level: 2,
            eliminate_resets: true,
            defer_measurements: true,
            remove_final_measurements: true,
            decompose_swaps: true,
            flatten: true,
            backpropagate_output_permutation: true,
            ..OptimizerConfig::default()
        };
        let (pm, _) = PassManagerBuilder::new().with_config(config).build();
        let names = pm.pass_names();

        for expected in [
            "eliminate_resets",
            "defer_measurements",
            "decompose_swap",
            "remove_final_measurements",
            "flatten_operations",
            "backpropagate_output_permutation",
        ] {
            assert!(names.contains(&expected), "{expected} missing from {names:?}");
        }
        assert_eq!(names.last(), Some(&"backpropagate_output_permutation"));
    }

    #[test]
    fn test_properties_pass_through() {
        let mut props = PropertySet::new();
        props.insert(DynamicCircuit(true));
        let (pm, mut props) = PassManagerBuilder::new().with_properties(props).build();

        let mut circuit = Circuit::with_size("test", 1, 1);
        circuit.h(QubitId(0)).unwrap();
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();
        pm.run(&mut circuit, &mut props).unwrap();

        assert_eq!(props.get::<DynamicCircuit>(), Some(&DynamicCircuit(false)));
    }
}

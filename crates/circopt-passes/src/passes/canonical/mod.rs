//! Passes that bring a circuit into a canonical shape.

mod blocks;
mod flatten;
mod permutation;
mod reorder;

pub use blocks::{CollectBlocks, collect_blocks};
pub use flatten::{FlattenOperations, flatten_operations};
pub use permutation::{BackpropagateOutputPermutation, backpropagate_output_permutation};
pub use reorder::{ReorderOperations, reorder_operations};

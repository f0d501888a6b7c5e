//! Gate decomposition passes.

mod decompose;

pub use decompose::{DecomposeSwap, ReplaceMcxWithMcz, decompose_swap, replace_mcx_with_mcz};

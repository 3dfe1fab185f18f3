//! External solver boundary: per-algorithm invocation contracts, output
//! parsing, and the process supervisor that runs one solver per request
//! under a hard wall-clock budget.

pub mod contract;
pub mod invoker;
pub mod output;

pub use contract::{AlgorithmSpec, FlagContract, ParamSet, SignConvention};
pub use invoker::{SolverInvoker, DEFAULT_GRACE};
pub use output::parse_stdout;

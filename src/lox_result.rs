use std::error::Error;

/// The evaluator's result type. Runtime errors and return unwinds carry
/// `Gc` handles, which are not `Send`, so this is a plain boxed `Error`
/// rather than `anyhow::Error`.
pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

//! Result and Error types for the crate.
use miette::Diagnostic;
use thiserror::Error;

/// Result containing an error variant from this module.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while assembling a state machine.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A state of the machine has no handler.
    #[error("state machine `{machine}` has no handler for state `{state}`")]
    #[diagnostic(
        code(norn::missing_handler),
        help("register a handler for every state with `Builder::state`")
    )]
    MissingHandler { machine: &'static str, state: String },

    /// A state of the machine was given more than one handler.
    #[error("state machine `{machine}` has more than one handler for state `{state}`")]
    #[diagnostic(code(norn::duplicate_handler))]
    DuplicateHandler { machine: &'static str, state: String },
}

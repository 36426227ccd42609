#[macro_use]
mod macros;

mod assembly;
pub mod codegen;
mod optimizer;
mod token;
mod tokenizer;

pub use assembly::{assemble, link};
pub use codegen::{generate, Backend, GenerateError, BACKENDS};
pub use optimizer::{optimize, OptimizeError, Program};
pub use token::Instruction;
pub use tokenizer::{tokenize, MismatchKind, TokenizeError};

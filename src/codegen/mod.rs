use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use lazy_static::lazy_static;
use static_assertions::const_assert;

use crate::optimizer::Program;
use crate::token::Instruction;

mod arm;
mod x86;
mod x86_64;

pub use self::arm::Arm;
pub use self::x86::X86;
pub use self::x86_64::X86_64;

/// Number of cells on the generated program's tape. The reference
/// brainfuck machine provides 30000 zero-initialized byte cells.
pub const DEFAULT_TAPE_SIZE: i32 = 30000;
const_assert!(tape_size_assert; DEFAULT_TAPE_SIZE > 0);

/// One target architecture: boilerplate, I/O subroutines and per-instruction
/// emission rules, plus the toolchain arguments to assemble and link the
/// result.
pub trait Backend: Sync {
    /// Data section (cell array and one-byte I/O scratch buffer) and text
    /// section preamble.
    fn header(&self, output: &mut String, tape_size: i32);
    /// Subroutine reading one byte from stdin into the current cell.
    fn getchar(&self, output: &mut String);
    /// Subroutine writing the current cell to stdout.
    fn putchar(&self, output: &mut String);
    /// Entry point label and cell pointer initialization.
    fn start(&self, output: &mut String);
    /// A single instruction of the optimized program.
    fn emit(&self, output: &mut String, instruction: Instruction);
    /// Process exit sequence with success status.
    fn exit(&self, output: &mut String);
    /// Target selection arguments for `as`.
    fn as_args(&self) -> &'static [&'static str];
    /// Target selection arguments for `ld`.
    fn ld_args(&self) -> &'static [&'static str];
}

lazy_static! {
    pub static ref BACKENDS: HashMap<&'static str, &'static dyn Backend> = {
        let mut m = HashMap::new();
        m.insert("x86", &X86 as &dyn Backend);
        m.insert("x86_64", &X86_64 as &dyn Backend);
        m.insert("arm", &Arm as &dyn Backend);
        m
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateError {
    /// An I/O instruction survived optimization although the program's
    /// usage flags say its subroutine was not emitted. A call would dangle,
    /// so this is rejected; it indicates a bug in the caller, not in the
    /// compiled source.
    UnexpectedIoInstruction(Instruction),
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            GenerateError::UnexpectedIoInstruction(instruction) => write!(
                f,
                "{:?} instruction in a program whose usage flags exclude it",
                instruction
            ),
        }
    }
}

impl Error for GenerateError {}

/// Generates assembly text for `program` on the given target.
///
/// Pure function of its arguments; emission is append-only into a single
/// owned buffer. The `,` and `.` subroutines are included only when the
/// program's usage flags are set.
pub fn generate(
    program: &Program,
    backend: &dyn Backend,
    tape_size: i32,
) -> Result<String, GenerateError> {
    let mut output = String::new();

    backend.header(&mut output, tape_size);
    if program.uses_input {
        backend.getchar(&mut output);
    }
    if program.uses_output {
        backend.putchar(&mut output);
    }
    backend.start(&mut output);

    for instruction in &program.instructions {
        match *instruction {
            Instruction::Input if !program.uses_input => {
                return Err(GenerateError::UnexpectedIoInstruction(*instruction));
            }
            Instruction::Output if !program.uses_output => {
                return Err(GenerateError::UnexpectedIoInstruction(*instruction));
            }
            instruction => backend.emit(&mut output, instruction),
        }
    }

    backend.exit(&mut output);

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Instruction::*;

    fn program(instructions: Vec<Instruction>, uses_input: bool, uses_output: bool) -> Program {
        Program {
            instructions,
            uses_input,
            uses_output,
        }
    }

    #[test]
    fn io_subroutines_are_gated_by_flags() {
        for backend in BACKENDS.values() {
            let out = generate(&program(vec![CellDelta(1)], false, false), *backend, 30000)
                .unwrap();
            assert!(!out.contains("getchar"));
            assert!(!out.contains("putchar"));

            let out = generate(&program(vec![Output], false, true), *backend, 30000).unwrap();
            assert!(out.contains("putchar:"));
            assert!(!out.contains("getchar"));

            let out = generate(&program(vec![Input], true, false), *backend, 30000).unwrap();
            assert!(out.contains("getchar:"));
            assert!(!out.contains("putchar"));
        }
    }

    #[test]
    fn unexpected_io_instruction_is_rejected() {
        for backend in BACKENDS.values() {
            assert_eq!(
                generate(&program(vec![Input], false, true), *backend, 30000).unwrap_err(),
                GenerateError::UnexpectedIoInstruction(Input)
            );
            assert_eq!(
                generate(&program(vec![Output], true, false), *backend, 30000).unwrap_err(),
                GenerateError::UnexpectedIoInstruction(Output)
            );
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let p = program(
            vec![CellDelta(5), LoopStart(0), CellDelta(-1), Output, LoopEnd(0)],
            false,
            true,
        );
        for backend in BACKENDS.values() {
            assert_eq!(
                generate(&p, *backend, 30000).unwrap(),
                generate(&p, *backend, 30000).unwrap()
            );
        }
    }

    #[test]
    fn zero_valued_deltas_emit_nothing() {
        for backend in BACKENDS.values() {
            let empty = generate(&program(vec![], false, false), *backend, 30000).unwrap();
            let zeros = generate(
                &program(vec![CellDelta(0), PointerDelta(0)], false, false),
                *backend,
                30000,
            )
            .unwrap();
            assert_eq!(empty, zeros);
        }
    }

    #[test]
    fn loop_labels_are_paired() {
        for backend in BACKENDS.values() {
            let out = generate(
                &program(vec![LoopStart(4), CellDelta(-1), LoopEnd(4)], false, false),
                *backend,
                30000,
            )
            .unwrap();
            assert!(out.contains("LB4:"));
            assert!(out.contains("LE4:"));
            assert!(out.contains("LE4\n"));
            assert!(out.contains("LB4\n"));
        }
    }

    #[test]
    fn tape_size_lands_in_the_data_section() {
        for backend in BACKENDS.values() {
            let out = generate(&program(vec![], false, false), *backend, 4096).unwrap();
            assert!(out.contains(".zero 4096"));
        }
    }

    #[test]
    fn cell_arithmetic_is_reduced_mod_256() {
        let out = generate(&program(vec![CellDelta(300)], false, false), &X86_64, 30000).unwrap();
        assert!(out.contains("mov $44, %bl"));

        let out = generate(&program(vec![CellDelta(-300)], false, false), &X86_64, 30000).unwrap();
        assert!(out.contains("mov $44, %bl"));
        assert!(out.contains("sub %bl, (%rax)"));
    }

    #[test]
    fn exit_sequences_use_the_target_abi() {
        let out = generate(&program(vec![], false, false), &X86_64, 30000).unwrap();
        assert!(out.contains("mov $60, %rax"));
        assert!(out.contains("syscall"));

        let out = generate(&program(vec![], false, false), &X86, 30000).unwrap();
        assert!(out.contains("movl $1, %eax"));
        assert!(out.contains("int $0x80"));

        let out = generate(&program(vec![], false, false), &Arm, 30000).unwrap();
        assert!(out.contains("mov r7, #1"));
        assert!(out.contains("svc #0"));
    }
}

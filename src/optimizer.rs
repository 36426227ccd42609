use std::error::Error;
use std::fmt;

use crate::token::Instruction;
use crate::token::Instruction::*;

/// Upper bound on dead-loop elimination passes, so the optimizer terminates
/// on every input shape.
const MAX_PASSES: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizeError {
    /// Levels >= 2 are reserved for whole-program effect elimination and
    /// not implemented. Callers clamp the level or accept this failure;
    /// the pipeline never degrades silently.
    UnsupportedLevel(u32),
}

impl fmt::Display for OptimizeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            OptimizeError::UnsupportedLevel(level) => {
                write!(f, "optimization level {} is not implemented", level)
            }
        }
    }
}

impl Error for OptimizeError {}

/// An optimized instruction sequence together with the I/O usage flags the
/// code generator keys its subroutine emission on.
pub struct Program {
    pub instructions: Vec<Instruction>,
    pub uses_input: bool,
    pub uses_output: bool,
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.instructions, f)
    }
}

/// Optimizes a tokenized program.
///
/// Level 0 returns the code as is, conservatively assuming both kinds of
/// I/O are present. Level 1 removes dead loops from the front of the
/// program and computes the usage flags from the surviving instructions.
pub fn optimize(tokens: &[Instruction], level: u32) -> Result<Program, OptimizeError> {
    if level >= 2 {
        return Err(OptimizeError::UnsupportedLevel(level));
    }

    let mut instructions = tokens.to_vec();
    let mut uses_input = true;
    let mut uses_output = true;

    if level >= 1 {
        eliminate_dead_loops(&mut instructions);
        uses_input = instructions.iter().any(|ins| *ins == Input);
        uses_output = instructions.iter().any(|ins| *ins == Output);
    }

    instructions.retain(|ins| *ins != Comment);

    Ok(Program {
        instructions,
        uses_input,
        uses_output,
    })
}

/// Removes loops whose guard cell cannot have been made nonzero: the tape
/// starts zeroed, so a loop preceded by no cell mutation and no input never
/// runs. Only the loop at the current front of the remaining program is
/// considered; a surviving `CellDelta` of any value (including zero) or an
/// `Input` ends the analysis.
fn eliminate_dead_loops(instructions: &mut [Instruction]) {
    for _ in 0..MAX_PASSES {
        let mut dead_label = None;
        for ins in instructions.iter() {
            match *ins {
                CellDelta(_) | Input => return,
                LoopStart(label) => {
                    dead_label = Some(label);
                    break;
                }
                _ => (),
            }
        }

        let label = match dead_label {
            Some(label) => label,
            None => return,
        };

        let mut inside_loop = false;
        for ins in instructions.iter_mut() {
            if *ins == LoopStart(label) {
                inside_loop = true;
            }
            if inside_loop {
                let at_end = *ins == LoopEnd(label);
                *ins = Comment;
                if at_end {
                    break;
                }
            }
        }
    }
}

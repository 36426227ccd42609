use std::error::Error;
use std::fmt;

use unicode_width::UnicodeWidthStr;

use crate::token::Instruction;
use crate::token::Instruction::*;

/// Which direction the brackets were unbalanced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    UnclosedLoop,
    ExtraLoopEnd,
}
use MismatchKind::*;

/// Unbalanced `[`/`]` in the source. The only way tokenization can fail;
/// every byte outside the eight command characters is a comment.
#[derive(Debug)]
pub struct TokenizeError {
    kind: MismatchKind,
    line: Vec<u8>,
    linenum: usize,
    offset: usize,
}

impl TokenizeError {
    fn new(kind: MismatchKind, code: &[u8], i: usize) -> Self {
        let (line, linenum, offset) = find_line(code, i);
        Self {
            kind,
            line: line.into(),
            linenum,
            offset,
        }
    }

    pub fn kind(&self) -> MismatchKind {
        self.kind
    }
}

impl fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let line = String::from_utf8_lossy(&self.line);
        let width = UnicodeWidthStr::width(&line[0..self.offset]);

        match self.kind {
            UnclosedLoop => {
                writeln!(f, "reached EOF with unterminated loop")?;
                writeln!(f, "Loop started at {}:{}", self.linenum, self.offset)?;
            }
            ExtraLoopEnd => {
                writeln!(
                    f,
                    "] found at {}:{} when not in a loop",
                    self.linenum, self.offset
                )?;
            }
        };

        writeln!(f, "{}", line)?;
        write!(f, "{}^", " ".repeat(width))
    }
}

impl Error for TokenizeError {}

/// Tokenizes raw brainfuck source into the intermediate representation.
///
/// Runs of `+`/`-` and of `>`/`<` are coalesced into single instructions
/// carrying the net delta (comment bytes do not break a run). Loop brackets
/// are resolved to label ids, assigned in source order of the opening
/// brackets; both ends of a pair carry the opener's id.
pub fn tokenize(code: &[u8]) -> Result<Vec<Instruction>, TokenizeError> {
    let mut instructions: Vec<Instruction> = Vec::new();
    // Ids of loops whose ] has not been seen yet, with the position of
    // their [ for error reporting.
    let mut open_loops: Vec<(u32, usize)> = Vec::new();
    let mut next_label = 0;

    for (i, &c) in code.iter().enumerate() {
        match c {
            b'+' | b'-' => {
                let delta = if c == b'+' { 1 } else { -1 };
                if let Some(CellDelta(value)) = instructions.last_mut() {
                    *value += delta;
                } else {
                    instructions.push(CellDelta(delta));
                }
            }
            b'>' | b'<' => {
                let delta = if c == b'>' { 1 } else { -1 };
                if let Some(PointerDelta(value)) = instructions.last_mut() {
                    *value += delta;
                } else {
                    instructions.push(PointerDelta(delta));
                }
            }
            b'[' => {
                open_loops.push((next_label, i));
                instructions.push(LoopStart(next_label));
                next_label += 1;
            }
            b']' => match open_loops.pop() {
                Some((label, _)) => instructions.push(LoopEnd(label)),
                None => return Err(TokenizeError::new(ExtraLoopEnd, code, i)),
            },
            b',' => instructions.push(Input),
            b'.' => instructions.push(Output),
            _ => (),
        }
    }

    if let Some(&(_, start)) = open_loops.last() {
        return Err(TokenizeError::new(UnclosedLoop, code, start));
    }

    Ok(instructions)
}

fn find_line(code: &[u8], i: usize) -> (&[u8], usize, usize) {
    let offset = code[0..i].iter().rev().take_while(|x| **x != b'\n').count();
    let end = i + code[i..].iter().take_while(|x| **x != b'\n').count();
    let linenum = code[0..(i - offset)]
        .iter()
        .filter(|x| **x == b'\n')
        .count();
    (&code[(i - offset)..end], linenum, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source() {
        assert_eq!(tokenize(b"").unwrap(), vec![]);
    }

    #[test]
    fn comments_only() {
        assert_eq!(tokenize(b"abffd87%g\n").unwrap(), vec![]);
    }

    #[test]
    fn symbol_classification_and_label_pairing() {
        let instructions = tokenize(b"[][.>[,+[-<]]-]").unwrap();
        assert_eq!(
            instructions,
            vec![
                LoopStart(0),
                LoopEnd(0),
                LoopStart(1),
                Output,
                PointerDelta(1),
                LoopStart(2),
                Input,
                CellDelta(1),
                LoopStart(3),
                CellDelta(-1),
                PointerDelta(-1),
                LoopEnd(3),
                LoopEnd(2),
                CellDelta(-1),
                LoopEnd(1),
            ]
        );
    }

    #[test]
    fn label_ids_follow_source_order_of_openers() {
        let instructions = tokenize(b"[[]][]").unwrap();
        assert_eq!(
            instructions,
            vec![
                LoopStart(0),
                LoopStart(1),
                LoopEnd(1),
                LoopEnd(0),
                LoopStart(2),
                LoopEnd(2),
            ]
        );
    }

    #[test]
    fn coalesces_runs() {
        assert_eq!(tokenize(b"+++").unwrap(), vec![CellDelta(3)]);
        assert_eq!(
            tokenize(b"+++>").unwrap(),
            vec![CellDelta(3), PointerDelta(1)]
        );
        assert_eq!(tokenize(b"><<").unwrap(), vec![PointerDelta(-1)]);
        assert_eq!(
            tokenize(b"+>+").unwrap(),
            vec![CellDelta(1), PointerDelta(1), CellDelta(1)]
        );
    }

    #[test]
    fn mixed_run_coalesces_to_net_value() {
        assert_eq!(tokenize(b"+++---").unwrap(), vec![CellDelta(0)]);
        assert_eq!(tokenize(b"+-+").unwrap(), vec![CellDelta(1)]);
    }

    #[test]
    fn comments_do_not_break_runs() {
        assert_eq!(tokenize(b"+a+").unwrap(), vec![CellDelta(2)]);
    }

    #[test]
    fn brackets_break_runs() {
        assert_eq!(
            tokenize(b"+[+]+").unwrap(),
            vec![
                CellDelta(1),
                LoopStart(0),
                CellDelta(1),
                LoopEnd(0),
                CellDelta(1),
            ]
        );
    }

    #[test]
    fn extra_close_is_rejected() {
        assert_eq!(tokenize(b"+,]").unwrap_err().kind(), ExtraLoopEnd);
        assert_eq!(tokenize(b"][").unwrap_err().kind(), ExtraLoopEnd);
        assert_eq!(tokenize(b"[]]").unwrap_err().kind(), ExtraLoopEnd);
    }

    #[test]
    fn unclosed_loop_is_rejected() {
        assert_eq!(tokenize(b"[..").unwrap_err().kind(), UnclosedLoop);
        assert_eq!(tokenize(b"[[]").unwrap_err().kind(), UnclosedLoop);
    }

    #[test]
    fn error_display_points_at_the_bracket() {
        let err = tokenize(b"++\n+,]").unwrap_err();
        let rendered = format!("{}", err);
        assert!(rendered.contains("1:2"));
        assert!(rendered.ends_with("  ^"));
    }
}

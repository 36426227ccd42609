use std::io::{self, Write};
use std::process::{Command, Stdio};

use crate::codegen::Backend;

/// Runs `as` for the backend's target, piping `code` to its standard
/// input, and returns the assembler's exit code.
pub fn assemble(
    backend: &dyn Backend,
    code: &str,
    out_name: &str,
    debug: bool,
) -> io::Result<Option<i32>> {
    let mut command = Command::new("as");
    command.args(backend.as_args());
    if debug {
        command.arg("-g");
    }
    let mut child = command
        .arg("-o")
        .arg(out_name)
        .arg("-") // Standard input
        .stdin(Stdio::piped())
        .spawn()?;

    child.stdin.take().unwrap().write_all(code.as_bytes())?;

    Ok(child.wait()?.code())
}

/// Links an object file into a freestanding executable with `ld` and
/// returns the linker's exit code.
pub fn link(backend: &dyn Backend, o_name: &str, out_name: &str) -> io::Result<Option<i32>> {
    Ok(Command::new("ld")
        .args(backend.ld_args())
        .arg("-o")
        .arg(out_name)
        .arg(o_name)
        .spawn()?
        .wait()?
        .code())
}

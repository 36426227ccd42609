use std::fmt::Write;

use crate::codegen::Backend;
use crate::token::Instruction;

// Linux kernel system calls on x86, int 0x80 ABI.
const SYS_READ: i32 = 3;
const SYS_WRITE: i32 = 4;
const SYS_EXIT: i32 = 1;
const STDIN: i32 = 0;
const STDOUT: i32 = 1;

/// 32-bit x86 backend. The cell pointer lives in %eax; cell arithmetic
/// goes through %bl so it wraps at 8 bits.
pub struct X86;

impl Backend for X86 {
    fn header(&self, output: &mut String, tape_size: i32) {
        push_line!(output, ".section .data");
        push_line!(output, "array:");
        push_asm!(output, ".zero {}", tape_size);
        push_line!(output, "buffer:");
        push_asm!(output, ".byte 0");
        push_line!(output, "");
        push_line!(output, ".section .text");
        push_line!(output, ".globl _start");
        push_line!(output, "");
    }

    fn getchar(&self, output: &mut String) {
        push_line!(output, ".type getchar,@function");
        push_line!(output, "getchar:");
        push_asm!(output, "pushl %eax");
        push_asm!(output, "pushl %ebx");
        push_asm!(output, "pushl %ecx");
        push_asm!(output, "pushl %edx");
        push_asm!(output, "movl ${}, %eax", SYS_READ);
        push_asm!(output, "movl ${}, %ebx", STDIN);
        push_asm!(output, "movl $buffer, %ecx");
        push_asm!(output, "movl $1, %edx");
        push_asm!(output, "int $0x80");
        push_asm!(output, "popl %edx");
        push_asm!(output, "popl %ecx");
        push_asm!(output, "popl %ebx");
        push_asm!(output, "popl %eax");
        push_asm!(output, "movb (buffer), %cl");
        push_asm!(output, "movb %cl, (%eax)");
        push_asm!(output, "retl");
        push_line!(output, "");
    }

    fn putchar(&self, output: &mut String) {
        push_line!(output, ".type putchar,@function");
        push_line!(output, "putchar:");
        push_asm!(output, "pushl %eax");
        push_asm!(output, "pushl %ebx");
        push_asm!(output, "pushl %ecx");
        push_asm!(output, "pushl %edx");
        push_asm!(output, "xorl %ebx, %ebx");
        push_asm!(output, "movb (%eax), %bl");
        push_asm!(output, "movb %bl, (buffer)");
        push_asm!(output, "movl ${}, %eax", SYS_WRITE);
        push_asm!(output, "movl ${}, %ebx", STDOUT);
        push_asm!(output, "movl $buffer, %ecx");
        push_asm!(output, "movl $1, %edx");
        push_asm!(output, "int $0x80");
        push_asm!(output, "popl %edx");
        push_asm!(output, "popl %ecx");
        push_asm!(output, "popl %ebx");
        push_asm!(output, "popl %eax");
        push_asm!(output, "retl");
        push_line!(output, "");
    }

    fn start(&self, output: &mut String) {
        push_line!(output, "_start:");
        push_asm!(output, "movl $array, %eax");
    }

    fn emit(&self, output: &mut String, instruction: Instruction) {
        match instruction {
            Instruction::CellDelta(value) => {
                if value > 0 {
                    push_asm!(output, "movb ${}, %bl", value & 0xff);
                    push_asm!(output, "addb %bl, (%eax)");
                } else if value < 0 {
                    push_asm!(output, "movb ${}, %bl", -value & 0xff);
                    push_asm!(output, "subb %bl, (%eax)");
                }
            }
            Instruction::PointerDelta(value) => {
                if value > 0 {
                    push_asm!(output, "movl ${}, %ebx", value);
                    push_asm!(output, "addl %ebx, %eax");
                } else if value < 0 {
                    push_asm!(output, "movl ${}, %ebx", -value);
                    push_asm!(output, "subl %ebx, %eax");
                }
            }
            Instruction::LoopStart(label) => {
                push_line!(output, "");
                push_line!(output, "LB{}:", label);
                push_asm!(output, "cmpb $0, (%eax)");
                push_asm!(output, "je LE{}", label);
            }
            Instruction::LoopEnd(label) => {
                push_line!(output, "");
                push_line!(output, "LE{}:", label);
                push_asm!(output, "cmpb $0, (%eax)");
                push_asm!(output, "jne LB{}", label);
            }
            Instruction::Input => push_asm!(output, "calll getchar"),
            Instruction::Output => push_asm!(output, "calll putchar"),
            Instruction::Comment => (),
        }
    }

    fn exit(&self, output: &mut String) {
        push_line!(output, "");
        push_asm!(output, "movl ${}, %eax", SYS_EXIT);
        push_asm!(output, "xorl %ebx, %ebx");
        push_asm!(output, "int $0x80");
    }

    fn as_args(&self) -> &'static [&'static str] {
        &["--32"]
    }

    fn ld_args(&self) -> &'static [&'static str] {
        &["-melf_i386"]
    }
}

use std::fmt::Write;

use crate::codegen::Backend;
use crate::token::Instruction;

// Linux kernel system calls on x86_64.
const SYS_READ: i32 = 0;
const SYS_WRITE: i32 = 1;
const SYS_EXIT: i32 = 60;
const STDIN: i32 = 0;
const STDOUT: i32 = 1;

/// 64-bit x86 backend. The cell pointer lives in %rax for the whole
/// program; cell arithmetic goes through %bl so it wraps at 8 bits.
#[allow(non_camel_case_types)]
pub struct X86_64;

impl Backend for X86_64 {
    fn header(&self, output: &mut String, tape_size: i32) {
        push_line!(output, ".section .data");
        push_line!(output, "array:");
        push_asm!(output, ".zero {}", tape_size);
        push_line!(output, "buffer:");
        push_asm!(output, ".byte 0");
        push_line!(output, "");
        push_line!(output, ".section .text");
        push_line!(output, ".global _start");
        push_line!(output, "");
    }

    fn getchar(&self, output: &mut String) {
        push_line!(output, "getchar:");
        push_asm!(output, "push %rax");
        push_asm!(output, "push %rdi");
        push_asm!(output, "push %rsi");
        push_asm!(output, "push %rdx");
        push_asm!(output, "mov ${}, %rax", SYS_READ);
        push_asm!(output, "mov ${}, %rdi", STDIN);
        push_asm!(output, "mov $buffer, %rsi");
        push_asm!(output, "mov $1, %rdx");
        push_asm!(output, "syscall");
        push_asm!(output, "pop %rdx");
        push_asm!(output, "pop %rsi");
        push_asm!(output, "pop %rdi");
        push_asm!(output, "pop %rax");
        push_asm!(output, "mov (buffer), %cl");
        push_asm!(output, "mov %cl, (%rax)");
        push_asm!(output, "ret");
        push_line!(output, "");
    }

    fn putchar(&self, output: &mut String) {
        push_line!(output, "putchar:");
        push_asm!(output, "push %rax");
        push_asm!(output, "push %rdi");
        push_asm!(output, "push %rsi");
        push_asm!(output, "push %rdx");
        push_asm!(output, "mov (%rax), %bl");
        push_asm!(output, "mov %bl, (buffer)");
        push_asm!(output, "mov ${}, %rax", SYS_WRITE);
        push_asm!(output, "mov ${}, %rdi", STDOUT);
        push_asm!(output, "mov $buffer, %rsi");
        push_asm!(output, "mov $1, %rdx");
        push_asm!(output, "syscall");
        push_asm!(output, "pop %rdx");
        push_asm!(output, "pop %rsi");
        push_asm!(output, "pop %rdi");
        push_asm!(output, "pop %rax");
        push_asm!(output, "ret");
        push_line!(output, "");
    }

    fn start(&self, output: &mut String) {
        push_line!(output, "_start:");
        push_asm!(output, "mov $array, %rax");
    }

    fn emit(&self, output: &mut String, instruction: Instruction) {
        match instruction {
            Instruction::CellDelta(value) => {
                if value > 0 {
                    push_asm!(output, "mov ${}, %bl", value & 0xff);
                    push_asm!(output, "add %bl, (%rax)");
                } else if value < 0 {
                    push_asm!(output, "mov ${}, %bl", -value & 0xff);
                    push_asm!(output, "sub %bl, (%rax)");
                }
            }
            Instruction::PointerDelta(value) => {
                if value > 0 {
                    push_asm!(output, "mov ${}, %rbx", value);
                    push_asm!(output, "add %rbx, %rax");
                } else if value < 0 {
                    push_asm!(output, "mov ${}, %rbx", -value);
                    push_asm!(output, "sub %rbx, %rax");
                }
            }
            Instruction::LoopStart(label) => {
                push_line!(output, "");
                push_line!(output, "LB{}:", label);
                push_asm!(output, "cmpb $0, (%rax)");
                push_asm!(output, "je LE{}", label);
            }
            Instruction::LoopEnd(label) => {
                push_line!(output, "");
                push_line!(output, "LE{}:", label);
                push_asm!(output, "cmpb $0, (%rax)");
                push_asm!(output, "jne LB{}", label);
            }
            Instruction::Input => push_asm!(output, "call getchar"),
            Instruction::Output => push_asm!(output, "call putchar"),
            Instruction::Comment => (),
        }
    }

    fn exit(&self, output: &mut String) {
        push_line!(output, "");
        push_asm!(output, "mov ${}, %rax", SYS_EXIT);
        push_asm!(output, "xor %rdi, %rdi");
        push_asm!(output, "syscall");
    }

    fn as_args(&self) -> &'static [&'static str] {
        &["--64"]
    }

    fn ld_args(&self) -> &'static [&'static str] {
        &["-melf_x86_64"]
    }
}

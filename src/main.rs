use std::fs::File;
use std::io::{self, Read, Write};
use std::process;

use clap::{App, Arg, ArgGroup};

use bfc::codegen::{Backend, BACKENDS, DEFAULT_TAPE_SIZE};
use bfc::{assemble, generate, link, optimize, tokenize, Program};

enum Action {
    Compile,
    Object,
    OutputAssembly,
    DumpIr,
}

struct Options {
    action: Action,
    output: Option<String>,
    input: String,
    tape_size: i32,
    level: u32,
    debug: bool,
    backend: &'static dyn Backend,
}

impl Options {
    fn match_options() -> Self {
        let tape_size_default = DEFAULT_TAPE_SIZE.to_string();
        let matches = App::new("bfc")
            .version("0.1.0")
            .about("Brainfuck compiler")
            .arg(
                Arg::with_name("output_asm")
                    .short("S")
                    .help("Emit assembly but do not assemble or link"),
            )
            .arg(
                Arg::with_name("no_link")
                    .short("c")
                    .help("Assemble but do not link"),
            )
            .arg(
                Arg::with_name("dump_ir")
                    .long("dump-ir")
                    .help("Dump intermediate representation; for debugging"),
            )
            .group(ArgGroup::with_name("actions").args(&["output_asm", "no_link", "dump_ir"]))
            .arg(
                Arg::with_name("debugging_symbols")
                    .short("g")
                    .help("Generate debugging information"),
            )
            .arg(
                Arg::with_name("out_name")
                    .short("o")
                    .help("Output file name")
                    .takes_value(true)
                    .empty_values(false)
                    .value_name("file"),
            )
            .arg(
                Arg::with_name("tape_size")
                    .long("tape-size")
                    .help("Number of cells on the tape")
                    .takes_value(true)
                    .empty_values(false)
                    .default_value(&tape_size_default)
                    .value_name("bytes"),
            )
            .arg(
                Arg::with_name("target")
                    .long("target")
                    .help("Architecture to generate assembly for")
                    .takes_value(true)
                    .possible_values(&BACKENDS.keys().cloned().collect::<Vec<&str>>())
                    .default_value("x86_64"),
            )
            .arg(
                Arg::with_name("level")
                    .short("O")
                    .help("Optimization level")
                    .takes_value(true)
                    .default_value("1"),
            )
            .arg(
                Arg::with_name("FILENAME")
                    .help("Source file to compile")
                    .required(true)
                    .index(1),
            )
            .get_matches();

        let action = if matches.is_present("dump_ir") {
            Action::DumpIr
        } else if matches.is_present("output_asm") {
            Action::OutputAssembly
        } else if matches.is_present("no_link") {
            Action::Object
        } else {
            Action::Compile
        };

        Options {
            action,
            output: matches.value_of("out_name").map(str::to_string),
            input: matches.value_of("FILENAME").unwrap().to_string(),
            tape_size: matches.value_of("tape_size").unwrap().parse::<i32>().unwrap(),
            level: matches.value_of("level").unwrap().parse::<u32>().unwrap(),
            debug: matches.is_present("debugging_symbols"),
            backend: *BACKENDS.get(matches.value_of("target").unwrap()).unwrap(),
        }
    }

    fn get_output<'a>(&'a self, default: &'a str) -> &'a str {
        match self.output.as_ref() {
            Some(output) => output,
            None => default,
        }
    }
}

fn main() -> io::Result<()> {
    let options = Options::match_options();

    let name = options.input.rsplitn(2, '.').last().unwrap();
    let mut file = File::open(&options.input)?;
    let mut code = Vec::new();
    file.read_to_end(&mut code)?;

    let tokens = match tokenize(&code) {
        Ok(tokens) => tokens,
        Err(err) => {
            println!("Parsing error: {}", err);
            process::exit(1);
        }
    };

    let program = match optimize(&tokens, options.level) {
        Ok(program) => program,
        Err(err) => {
            println!("Optimizing error: {}", err);
            process::exit(1);
        }
    };

    match options.action {
        Action::DumpIr => {
            let out_name = options.get_output("-");
            let mut irfile = open_output_file(out_name)?;
            for instruction in &program.instructions {
                writeln!(irfile, "{:?}", instruction)?;
            }
        }
        Action::OutputAssembly => {
            println!("Compiling...");
            let output = generate_or_exit(&program, options.backend, options.tape_size);
            let def_name = format!("{}.s", name);
            let out_name = options.get_output(&def_name);
            let mut asmfile = open_output_file(out_name)?;
            asmfile.write_all(&output.into_bytes())?;
        }
        Action::Object => {
            println!("Compiling...");
            let output = generate_or_exit(&program, options.backend, options.tape_size);
            let def_name = format!("{}.o", name);
            let out_name = options.get_output(&def_name);

            println!("Assembling...");
            if assemble(options.backend, &output, out_name, options.debug)? != Some(0) {
                process::exit(1);
            }
        }
        Action::Compile => {
            println!("Compiling...");
            let output = generate_or_exit(&program, options.backend, options.tape_size);
            let out_name = options.get_output(name);
            let o_name = format!("{}.o", name);

            println!("Assembling...");
            if assemble(options.backend, &output, &o_name, options.debug)? != Some(0) {
                process::exit(1);
            }

            println!("Linking...");
            if link(options.backend, &o_name, out_name)? != Some(0) {
                process::exit(1);
            }
        }
    }

    Ok(())
}

fn generate_or_exit(program: &Program, backend: &dyn Backend, tape_size: i32) -> String {
    match generate(program, backend, tape_size) {
        Ok(output) => output,
        Err(err) => {
            println!("Code generation error: {}", err);
            process::exit(1);
        }
    }
}

fn open_output_file(name: &str) -> io::Result<Box<dyn Write>> {
    if name == "-" {
        Ok(Box::new(io::stdout()))
    } else {
        Ok(Box::new(File::create(&name)?))
    }
}

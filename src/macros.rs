/// Add a line of assembly to the output buffer, with indentation and
/// newline, using format! syntax.
macro_rules! push_asm {
    ($output:expr, $fmt:expr) => {
        (writeln!($output, concat!("    ", $fmt))).unwrap()
    };
    ($output:expr, $fmt:expr, $($arg:tt)*) => {
        (writeln!($output, concat!("    ", $fmt), $($arg)*)).unwrap()
    };
}

/// Like push_asm!, but unindented. For labels and section directives.
macro_rules! push_line {
    ($output:expr, $fmt:expr) => {
        (writeln!($output, concat!($fmt))).unwrap()
    };
    ($output:expr, $fmt:expr, $($arg:tt)*) => {
        (writeln!($output, concat!($fmt), $($arg)*)).unwrap()
    };
}

use getopts::Options;
use kilo_editor::{init_file_logging, Editor, Result, StdinRawMode, VERSION};
use std::env;
use std::io;
use std::process::exit;

fn print_help(program: &str, opts: Options) {
    let description = format!(
        "{prog}: A tiny terminal text editor

Usage:
    {prog} [options] [FILE]

Keys:
    Ctrl-S      : Save (asks a file name when no file is opened)
    Ctrl-Q      : Quit immediately without saving
    Arrows      : Move cursor
    PageUp/Down : Move cursor by one screen
    Backspace   : Delete a character before cursor
    Delete      : Delete a character under cursor
    ESC         : Cancel prompt",
        prog = program,
    );
    println!("{}", opts.usage(&description));
}

fn edit(file: Option<String>) -> Result<()> {
    // The terminal is restored when `input` is dropped at the end of this function, including
    // error paths
    let input = StdinRawMode::new()?.input_keys();
    Editor::open(input, io::stdout(), None, file)?.edit()
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("kilo");

    let mut opts = Options::new();
    opts.optflag("v", "version", "Print version");
    opts.optflag("h", "help", "Print this help");
    opts.optopt("", "log", "Write debug log to FILE", "FILE");
    opts.optopt(
        "",
        "log-level",
        "Log level directive such as 'debug' (default: info)",
        "LEVEL",
    );

    let matches = match opts.parse(args.iter().skip(1)) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: {}. Please see --help", e);
            exit(1);
        }
    };

    if matches.opt_present("v") {
        println!("{}", VERSION);
        return;
    }

    if matches.opt_present("h") {
        print_help(program, opts);
        return;
    }

    if matches.free.len() > 1 {
        eprintln!("Error: Only one file can be opened. Please see --help");
        exit(1);
    }

    // Keep the guard alive until the editor finishes so that buffered logs are flushed
    let log_guard = match matches.opt_str("log") {
        Some(path) => {
            let level = matches
                .opt_str("log-level")
                .unwrap_or_else(|| "info".to_string());
            match init_file_logging(path, &level) {
                Ok(guard) => Some(guard),
                Err(err) => {
                    eprintln!("Error: {}", err);
                    exit(1);
                }
            }
        }
        None => None,
    };

    let file = matches.free.into_iter().next();
    tracing::info!(file = ?file, "starting");

    if let Err(err) = edit(file) {
        tracing::error!(%err, "exited with error");
        eprintln!("Error: {}", err);
        drop(log_guard);
        exit(1);
    }
}

use clap::{Arg, ArgAction, Command};
use linebasic::error::ReportStyle;
use linebasic::{repl, runner};
use std::path::Path;
use std::process;

fn main() {
    let matches = Command::new("basic")
        .about("An interpreter for a small line-numbered BASIC")
        .arg(
            Arg::new("file")
                .help("The program file to run")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Load FILE, if given, and start the interactive interpreter")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("plain")
                .long("plain")
                .help("Report errors as single plain lines")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let style = if matches.get_flag("plain") {
        ReportStyle::Plain
    } else {
        ReportStyle::Pretty
    };
    let file = matches.get_one::<String>("file").map(Path::new);

    let result = match file {
        Some(path) if !matches.get_flag("interactive") => runner::run(path, style),
        _ => repl::start(file, style).map(|()| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(error) => {
            eprintln!("basic: fatal: {}", error);
            process::exit(1);
        }
    }
}

use std::env;
use std::fs;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let program_name = args.first().map_or("amplc", String::as_str);

    let Some(source_path) = args.get(1) else {
        eprintln!("usage: {program_name} <source-file>");
        return ExitCode::from(2);
    };
    if args.len() > 2 {
        eprintln!("usage: {program_name} <source-file>");
        return ExitCode::from(2);
    }

    let source = match fs::read_to_string(source_path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{source_path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    match amplc::compile(&source) {
        Ok(_unit) => ExitCode::SUCCESS,
        Err(diagnostic) => {
            eprintln!("{}", diagnostic.render(source_path));
            ExitCode::FAILURE
        }
    }
}

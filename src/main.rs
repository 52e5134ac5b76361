use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use brasa::diagnostic::{Diagnostic, ansi::AnsiRenderer, json, registry};

#[derive(Parser, Debug)]
#[command(name = "brasa", version, about = "Compile brasa programs to bytecode and run them")]
struct Cli {
    /// Path to a source file, or inline program text. Read from stdin when omitted.
    source: Option<String>,

    /// Treat SOURCE as program text even if a file of that name exists
    #[arg(short, long)]
    eval: bool,

    /// Print the disassembly before running
    #[arg(long)]
    disasm: bool,

    /// Print the AST as JSON and exit
    #[arg(long)]
    ast: bool,

    /// Emit diagnostics as JSON lines on stderr
    #[arg(long)]
    json: bool,

    /// Disable coloured output (NO_COLOR is honoured too)
    #[arg(long)]
    no_color: bool,

    /// Print the explanation for an error code, e.g. BRS-C002
    #[arg(long, value_name = "CODE")]
    explain: Option<String>,

    /// Raise the log level: -v for debug, -vv for trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

struct Reporter {
    json: bool,
    use_color: bool,
}

impl Reporter {
    fn report(&self, diagnostics: &[Diagnostic]) {
        let ansi = AnsiRenderer { use_color: self.use_color };
        for d in diagnostics {
            if self.json {
                eprintln!("{}", json::render(d));
            } else {
                eprint!("{}", ansi.render(d));
            }
        }
    }
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    }
    builder.init();
}

fn load_source(cli: &Cli) -> std::io::Result<String> {
    let Some(source) = &cli.source else {
        return std::io::read_to_string(std::io::stdin());
    };
    if cli.eval {
        return Ok(source.clone());
    }
    let path = Path::new(source);
    if path.is_file() {
        log::debug!("reading {}", path.display());
        return std::fs::read_to_string(path);
    }
    if path.extension().is_some_and(|ext| ext == "brs") {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{}: no such file", path.display()),
        ));
    }
    Ok(source.clone())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(code) = &cli.explain {
        return match registry::lookup(code) {
            Some(entry) => {
                print!("{}", entry.long);
                ExitCode::SUCCESS
            }
            None => {
                eprintln!("unknown error code '{}'", code);
                ExitCode::FAILURE
            }
        };
    }

    let reporter = Reporter {
        json: cli.json,
        use_color: !cli.no_color && std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal(),
    };

    let source = match load_source(&cli) {
        Ok(s) => s,
        Err(e) => {
            reporter.report(&[Diagnostic::error(format!("cannot read source: {}", e))]);
            return ExitCode::FAILURE;
        }
    };

    if cli.ast {
        return match brasa::parse_source(&source) {
            Ok(program) => match serde_json::to_string_pretty(&program) {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    reporter.report(&[Diagnostic::error(format!("cannot serialize AST: {}", e))]);
                    ExitCode::FAILURE
                }
            },
            Err(diagnostics) => {
                reporter.report(&diagnostics);
                ExitCode::FAILURE
            }
        };
    }

    let chunk = match brasa::compile_source(&source) {
        Ok(chunk) => chunk,
        Err(diagnostics) => {
            reporter.report(&diagnostics);
            return ExitCode::FAILURE;
        }
    };

    if cli.disasm {
        print!("{}", chunk);
    }

    match brasa::vm::run(&chunk) {
        Ok(Some(value)) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            reporter.report(&[Diagnostic::warning("program left no value").with_code("BRS-R008")]);
            ExitCode::SUCCESS
        }
        Err(e) => {
            reporter.report(&[Diagnostic::from(&e)]);
            ExitCode::FAILURE
        }
    }
}

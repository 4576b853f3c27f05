use std::{env, fs, process::ExitCode};

use sv2v::Description;

/// `+define+NAME[=VALUE]` / `+incdir+DIR` flags and the `-o <path>` output
/// redirect, collected but otherwise inert: the preprocessor/macro
/// expansion front end is out of scope for this core (spec §1), so these
/// exist purely to match real `sv2v`/Verilog-tool CLI conventions.
#[derive(Debug, Default)]
struct CliOptions {
    defines: Vec<(String, Option<String>)>,
    incdirs: Vec<String>,
    output: Option<String>,
    inputs: Vec<String>,
}

fn parse_args(args: &[String]) -> Result<CliOptions, String> {
    let mut opts = CliOptions::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(rest) = arg.strip_prefix("+define+") {
            let (name, value) = match rest.split_once('=') {
                Some((n, v)) => (n.to_string(), Some(v.to_string())),
                None => (rest.to_string(), None),
            };
            if name.is_empty() {
                return Err("'+define+' requires a macro name".to_string());
            }
            opts.defines.push((name, value));
        } else if let Some(dir) = arg.strip_prefix("+incdir+") {
            if dir.is_empty() {
                return Err("'+incdir+' requires a directory".to_string());
            }
            opts.incdirs.push(dir.to_string());
        } else if arg == "-o" {
            let path = iter.next().ok_or("'-o' requires a path argument")?;
            opts.output = Some(path.clone());
        } else {
            opts.inputs.push(arg.clone());
        }
    }
    if opts.inputs.is_empty() {
        return Err("no input files given".to_string());
    }
    Ok(opts)
}

/// The real SystemVerilog lexer/parser is out of scope for this core
/// (spec §1: "external collaborator"); this front end instead reads each
/// input file as a JSON-encoded `Vec<Description>`, reusing the `serde`
/// derives every AST node already carries for golden-fixture testing, so
/// the pipeline is runnable end to end without reimplementing a parser.
fn read_descriptions(path: &str) -> Result<Vec<Description>, String> {
    let text = fs::read_to_string(path).map_err(|err| format!("reading {path}: {err}"))?;
    serde_json::from_str(&text).map_err(|err| format!("parsing {path} as AST JSON: {err}"))
}

fn run(opts: &CliOptions) -> Result<String, String> {
    let mut descriptions = Vec::new();
    for path in &opts.inputs {
        descriptions.extend(read_descriptions(path)?);
    }

    let result = sv2v::compile(descriptions).map_err(|err| format!("{err}"))?;
    Ok(result.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n\n"))
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let opts = match parse_args(&args) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let output = match run(&opts) {
        Ok(output) => output,
        Err(err) => {
            eprintln!("error:\n{err}");
            return ExitCode::FAILURE;
        }
    };

    match &opts.output {
        Some(path) => {
            if let Err(err) = fs::write(path, output) {
                eprintln!("error writing {path}: {err}");
                return ExitCode::FAILURE;
            }
        }
        None => println!("{output}"),
    }
    ExitCode::SUCCESS
}

mod debug_report;

use meaning_map::{Classification, MeaningMap, Utterance, compile, match_verbose};
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

fn main() {
    env_logger::Builder::new().filter_level(log::LevelFilter::Warn).parse_default_env().init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(&config) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(config: &CliConfig) -> Result<(), String> {
    let map = match &config.source {
        MapSource::Classification(path) => {
            let text = read_file(path)?;
            let classification: Classification =
                serde_json::from_str(&text).map_err(|err| format!("{}: {err}", path.display()))?;
            let compiled = compile(&classification).map_err(|err| err.to_string())?;
            debug_report::print_compilation(&compiled, config.color);
            compiled.map
        }
        MapSource::Map(path) => {
            let text = read_file(path)?;
            MeaningMap::from_json_str(&text).map_err(|err| format!("{}: {err}", path.display()))?
        }
    };

    if let Some(path) = &config.map_out {
        let json = map.to_json_string_pretty().map_err(|err| err.to_string())?;
        std::fs::write(path, json).map_err(|err| format!("failed to write {}: {err}", path.display()))?;
        log::info!("wrote meaning map to {}", path.display());
    }

    let details = match_verbose(&config.input, &map, Vec::new());
    debug_report::print_match(config.input.as_str(), &map, &details, config.color);
    Ok(())
}

enum MapSource {
    Classification(PathBuf),
    Map(PathBuf),
}

struct CliConfig {
    source: MapSource,
    map_out: Option<PathBuf>,
    input: Utterance,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut source: Option<MapSource> = None;
    let mut map_out: Option<PathBuf> = None;
    let mut input: Option<String> = None;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1);

    let mut set_source = |value: MapSource| {
        if source.is_some() {
            return Err("error: use only one of --classification and --map".to_string());
        }
        source = Some(value);
        Ok(())
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("meaning-map {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--classification" | "-c" => {
                let value = args.next().ok_or_else(|| "error: --classification expects a file".to_string())?;
                set_source(MapSource::Classification(value.into()))?;
            }
            "--map" | "-m" => {
                let value = args.next().ok_or_else(|| "error: --map expects a file".to_string())?;
                set_source(MapSource::Map(value.into()))?;
            }
            "--map-out" => {
                let value = args.next().ok_or_else(|| "error: --map-out expects a file".to_string())?;
                map_out = Some(value.into());
            }
            "--" => {
                let rest = args.by_ref().collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    input = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--classification=") => {
                set_source(MapSource::Classification(arg.trim_start_matches("--classification=").into()))?;
            }
            _ if arg.starts_with("--map=") => {
                set_source(MapSource::Map(arg.trim_start_matches("--map=").into()))?;
            }
            _ if arg.starts_with("--map-out=") => {
                map_out = Some(arg.trim_start_matches("--map-out=").into());
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args.by_ref()).collect::<Vec<_>>().join(" ");
                input = Some(rest);
                break;
            }
        }
    }

    let Some(source) = source else {
        return Err(format!("error: one of --classification or --map is required\n\n{}", help_text()));
    };

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };
    if input.trim().is_empty() {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    }
    let input = Utterance::plain(&input).map_err(|err| format!("error: {err}"))?;

    Ok(CliConfig { source, map_out, input, color })
}

fn read_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|err| format!("failed to read {}: {err}", path.display()))
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "meaning-map {version}

Compile a meaning classification and classify an utterance against it.

Usage:
  meaning-map --classification <file.json> [OPTIONS] [--] <utterance...>
  meaning-map --map <file.json> [OPTIONS] [--] <utterance...>

Options:
  -c, --classification <file>  JSON object of meaning id -> utterances to compile.
  -m, --map <file>             Previously persisted meaning map to load instead.
  --map-out <file>             Write the meaning map as JSON.
  --color                      Force ANSI color output.
  --no-color                   Disable ANSI color output.
  -h, --help                   Show this help message.
  -V, --version                Print version information.

The utterance is read from the remaining arguments, or from stdin when none
are given. It is lowercased and whitespace-collapsed before matching.

Logging:
  RUST_LOG=meaning_map=debug   Show rule selection and trump pairing.

Exit codes:
  0  Success.
  1  Internal error (unreadable files, invalid JSON, compile failure).
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
    )
}

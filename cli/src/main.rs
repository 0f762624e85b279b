mod config;
mod test_runner;

use std::path::Path;
use std::process;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use confdoc::Diagnostics;
use overlay::{Overlay, TERMINATOR, apply_overlays, extract_cli_options};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const SUBCOMMANDS: &[&str] = &["run", "test", "help"];

const LOG_ENV: &str = "CONFOVERLAY_LOG";

#[derive(Parser)]
#[command(
    name = "confoverlay",
    version,
    about = "Decode a configuration file, with settings overridden from the command line"
)]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a configuration file and print it
    #[command(after_help = "Any setting can be overridden with --<path>=<value>, for example\n  \
        --io_mode=async\n  \
        --service.http.web_proxy.listen_addr=127.0.0.1:8080")]
    Run(RunArgs),

    /// Run .test.conf test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Configuration file to decode
    file: String,

    /// Decode only, print nothing on success (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Dump the merged root content instead of the decoded settings
    #[arg(long)]
    content: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.conf file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// `confoverlay demo.conf` means `confoverlay run demo.conf`, and
/// `confoverlay -- demo.conf` means `confoverlay run -- demo.conf`.
fn inject_run(args: &mut Vec<String>) {
    let first = args
        .iter()
        .skip(1)
        .position(|a| a == TERMINATOR || !a.starts_with('-'))
        .map(|p| p + 1)
        .filter(|&p| !SUBCOMMANDS.contains(&args[p].as_str()));
    if let Some(pos) = first {
        args.insert(pos, "run".to_string());
    }
}

fn main() {
    init_logging();

    // Settings are pulled out before clap sees the command line; it only
    // gets what the root schema does not claim.
    let mut argv = std::env::args();
    let program = argv.next().unwrap_or_else(|| "confoverlay".to_string());
    let rest: Vec<String> = argv.collect();
    let extracted = extract_cli_options(&rest, &config::root_schema());
    debug!(
        overlays = extracted.overlays.len(),
        remaining = extracted.remaining.len(),
        "extracted command-line settings"
    );

    let mut args = vec![program];
    args.extend(extracted.remaining);
    inject_run(&mut args);

    let cli = Cli::parse_from(&args);

    match cli.command {
        Command::Run(run_args) => do_run(
            run_args,
            extracted.overlays,
            extracted.diagnostics,
            cli.no_color,
        ),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn do_run(
    args: RunArgs,
    overlays: Vec<Rc<dyn Overlay>>,
    mut diags: Diagnostics,
    no_color: bool,
) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let style = term::Config::default();

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    let document = match confdoc::parser::Parser::new(source, file_id).parse() {
        Ok(d) => d,
        Err(errors) => {
            for error in errors {
                diags.push(error);
            }
            emit_diagnostics(&writer, &style, &files, &diags);
            process::exit(1);
        }
    };

    let body = apply_overlays(Rc::new(document), overlays);

    if args.content {
        let (content, more) = body.content(&config::root_schema());
        diags.extend(more);
        emit_diagnostics(&writer, &style, &files, &diags);
        println!("{:#?}", content);
        if diags.has_errors() {
            process::exit(1);
        }
        return;
    }

    let (decoded, more) = config::decode(body.as_ref());
    diags.extend(more);
    emit_diagnostics(&writer, &style, &files, &diags);
    if diags.has_errors() {
        process::exit(1);
    }

    if args.check {
        eprintln!("ok: {} decoded successfully", args.file);
        return;
    }

    let stdout = std::io::stdout();
    if let Err(e) = config::write_config(&decoded, &mut stdout.lock()) {
        eprintln!("error: cannot write output: {}", e);
        process::exit(1);
    }
}

fn emit_diagnostics(
    writer: &StandardStream,
    style: &term::Config,
    files: &SimpleFiles<String, String>,
    diagnostics: &Diagnostics,
) {
    for diag in diagnostics {
        let _ = term::emit_to_write_style(
            &mut writer.lock(),
            style,
            files,
            &diag.to_diagnostic(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_file_runs() {
        let mut args = argv(&["confoverlay", "--no-color", "demo.conf", "--check"]);
        inject_run(&mut args);
        assert_eq!(args, argv(&["confoverlay", "--no-color", "run", "demo.conf", "--check"]));
    }

    #[test]
    fn subcommands_are_left_alone() {
        for sub in ["run", "test", "help"] {
            let mut args = argv(&["confoverlay", sub, "x"]);
            inject_run(&mut args);
            assert_eq!(args, argv(&["confoverlay", sub, "x"]));
        }
        let mut args = argv(&["confoverlay", "--version"]);
        inject_run(&mut args);
        assert_eq!(args, argv(&["confoverlay", "--version"]));
    }

    #[test]
    fn terminator_ends_the_scan() {
        let mut args = argv(&["confoverlay", "--", "demo.conf"]);
        inject_run(&mut args);
        assert_eq!(args, argv(&["confoverlay", "run", "--", "demo.conf"]));
        let cli = Cli::try_parse_from(&args).expect("clap rejected a file after --");
        match cli.command {
            Command::Run(run) => assert_eq!(run.file, "demo.conf"),
            Command::Test(_) => panic!("expected run"),
        }

        let mut args = argv(&["confoverlay", "test", "--", "cases"]);
        inject_run(&mut args);
        assert_eq!(args, argv(&["confoverlay", "test", "--", "cases"]));
    }

    #[test]
    fn settings_never_reach_clap() {
        let rest = argv(&["--io_mode=async", "demo.conf", "--service.http.a.listen_addr=:1", "--check"]);
        let extracted = extract_cli_options(&rest, &config::root_schema());
        assert_eq!(extracted.overlays.len(), 2);

        let mut args = vec!["confoverlay".to_string()];
        args.extend(extracted.remaining);
        inject_run(&mut args);
        let cli = Cli::try_parse_from(&args).expect("clap rejected the remaining arguments");
        match cli.command {
            Command::Run(run) => {
                assert_eq!(run.file, "demo.conf");
                assert!(run.check);
            }
            Command::Test(_) => panic!("expected run"),
        }
    }
}

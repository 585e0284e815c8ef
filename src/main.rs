use clap::Parser as ClapParser;

use xmk::config::Config;
use xmk::fileprobe::RealProbe;
use xmk::process::HostShell;
use xmk::resolver::Resolver;
use xmk::rules::Parser;
use xmk::source::SourceBuffer;

#[derive(ClapParser)]
#[command(name = "xmk")]
#[command(about = "Parse a target/dependency/command file and run whatever is out of date")]
#[command(version)]
struct Cli {
    /// Preprocess only: expand macros and print the result, don't build
    #[arg(short = 'E')]
    preprocess_only: bool,

    /// Verbose: echo the Rust call site of a fatal error
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Input file
    #[arg(short = 'f', long = "file", default_value = "default.xmk")]
    file: String,

    /// Suppress echoing commands before they run
    #[arg(short = 'q')]
    quiet: bool,

    /// Build this target instead of the input's `build` directive
    #[arg()]
    target: Option<String>,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            input_path: cli.file.into(),
            preprocess_only: cli.preprocess_only,
            verbose: cli.verbose >= 1,
            extra_verbose: cli.verbose >= 2,
            quiet: cli.quiet,
            target_override: cli.target,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let config: Config = cli.into();

    std::process::exit(run(&config));
}

fn run(config: &Config) -> i32 {
    let buf = match SourceBuffer::load(&config.input_path) {
        Ok(buf) => buf,
        Err(err) => {
            err.report(config.is_verbose());
            return err.exit_code();
        }
    };

    let (model, expanded_source) = match Parser::new(buf).parse() {
        Ok(result) => result,
        Err(err) => {
            err.report(config.is_verbose());
            return err.exit_code();
        }
    };

    if config.preprocess_only {
        print!("{}", expanded_source);
        return 0;
    }

    let target = match config.target_override.as_deref().or_else(|| model.build_target()) {
        Some(name) => name.to_string(),
        None => {
            let err = xmk::fatal!(xmk::XmkErrorKind::MissingBuild);
            err.report(config.is_verbose());
            return err.exit_code();
        }
    };

    let probe = RealProbe;
    let shell = HostShell;
    let resolver = Resolver::new(&model, &probe, &shell, config.quiet);

    match resolver.execute(&target) {
        Ok(_) => 0,
        Err(err) => {
            err.report(config.is_verbose());
            err.exit_code()
        }
    }
}

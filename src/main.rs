use clap::Parser;
use letter_pdf::{run, Config, LetterError, RenderResult, SignatureFont};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Render an approved letter to a single-page PDF and report the outcome as one line of JSON
#[derive(Parser, Debug)]
#[command(name = "letter-pdf", version, about)]
struct Cli {
    /// JSON request with `letter_text`, `signers`, and `output_path`
    payload: String,

    /// TrueType/OpenType font used to write signers' names when they have no signature image
    #[arg(long, env = "LETTER_SCRIPT_FONT")]
    script_font: Option<PathBuf>,

    /// TOML file with `[letterhead]` and `[layout]` settings
    #[arg(short, long, env = "LETTER_CONFIG")]
    config: Option<PathBuf>,

    /// Log debugging details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_logger(verbose: bool) {
    let default = if verbose {
        "letter_pdf=debug"
    } else {
        "letter_pdf=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config, LetterError> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    }
}

fn main() {
    // a missing payload exits here with clap's usage message and a non-zero status
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let result = match load_config(cli.config.as_deref()) {
        Ok(config) => {
            let font_path = config.script_font_path(cli.script_font.as_deref());
            let signature_font = SignatureFont::resolve(font_path);
            let renderer = config.into_renderer(signature_font);
            run(&cli.payload, &renderer)
        }
        Err(e) => RenderResult::failure(e),
    };

    println!("{}", result.to_json());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn payload_is_required() {
        assert!(Cli::try_parse_from(["letter-pdf"]).is_err());
        let cli = Cli::try_parse_from(["letter-pdf", "{}", "--verbose"]).unwrap();
        assert_eq!(cli.payload, "{}");
        assert!(cli.verbose);
    }
}

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use lessonplan::{
    DEFAULT_TITLE, DocumentStyle, DocxOptions, Error, MissingDelimiter, ParseOptions, PdfLayout,
    PdfOptions,
};

#[derive(Parser)]
#[command(
    name = "lessonplan",
    version,
    about = "Turn generated CLIL lesson plans into DOCX tables and paginated PDFs"
)]
struct Cli {
    /// Log layout decisions (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the plan as a two-column DOCX table
    Docx(ExportArgs),
    /// Write the plan as a paginated PDF
    Pdf {
        #[command(flatten)]
        export: ExportArgs,
        #[arg(long, value_enum, default_value_t = LayoutArg::Table)]
        layout: LayoutArg,
        /// Flow layout: characters per wrapped line
        #[arg(long, default_value_t = 100)]
        max_chars: usize,
        /// Flow layout: line height in points
        #[arg(long, default_value_t = 15.0)]
        line_height: f32,
    },
    /// Serve the HTTP API used by the web front end
    #[cfg(feature = "server")]
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        #[arg(long, default_value_t = 5000)]
        port: u16,
        /// Allowed CORS origin (repeatable); any origin when omitted
        #[arg(long = "allow-origin")]
        allow_origin: Vec<String>,
        #[arg(long, default_value = "gpt-3.5-turbo")]
        model: String,
        /// OpenAI-compatible API base URL
        #[arg(long, default_value = "https://api.openai.com")]
        base_url: String,
        /// Directory for temporary artifacts
        #[arg(long)]
        temp_dir: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ExportArgs {
    /// Lesson plan text file, or - for stdin
    input: PathBuf,
    /// Output file (defaults to the input name with the new extension)
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long, default_value = DEFAULT_TITLE)]
    title: String,
    #[arg(long, default_value = "Times New Roman")]
    font: String,
    #[arg(long, default_value_t = 12.0)]
    font_size: f32,
    /// What to do with lines that have no colon
    #[arg(long, value_enum)]
    missing_delimiter: Option<PolicyArg>,
    /// Do not shade the first table row
    #[arg(long)]
    no_shading: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Skip,
    Keep,
}

impl From<PolicyArg> for MissingDelimiter {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Skip => MissingDelimiter::Skip,
            PolicyArg::Keep => MissingDelimiter::KeepAsName,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    Table,
    Flow,
}

impl From<LayoutArg> for PdfLayout {
    fn from(l: LayoutArg) -> Self {
        match l {
            LayoutArg::Table => PdfLayout::Table,
            LayoutArg::Flow => PdfLayout::Flow,
        }
    }
}

impl ExportArgs {
    fn style(&self) -> DocumentStyle {
        DocumentStyle {
            font_family: self.font.clone(),
            font_size: self.font_size,
        }
    }

    fn parse_options(&self, default: MissingDelimiter) -> ParseOptions {
        ParseOptions::with_policy(self.missing_delimiter.map_or(default, Into::into))
    }

    fn output_path(&self, extension: &str) -> PathBuf {
        match &self.output {
            Some(p) => p.clone(),
            None if self.input == Path::new("-") => PathBuf::from(format!("lesson_plan.{extension}")),
            None => self.input.with_extension(extension),
        }
    }

    fn read_input(&self) -> Result<String, Error> {
        if self.input == Path::new("-") {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            return Ok(text);
        }
        std::fs::read_to_string(&self.input).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", e, self.input.display()),
            ))
        })
    }
}

fn run(command: Commands) -> Result<(), Error> {
    match command {
        Commands::Docx(args) => {
            let text = args.read_input()?;
            let opts = DocxOptions {
                title: args.title.clone(),
                style: args.style(),
                shade_header: !args.no_shading,
                parse: args.parse_options(MissingDelimiter::Skip),
                ..DocxOptions::default()
            };
            let out = lessonplan::export_docx(&text, &opts, None)?.save_to(&args.output_path("docx"))?;
            println!("{}", out.display());
        }
        Commands::Pdf {
            export: args,
            layout,
            max_chars,
            line_height,
        } => {
            let text = args.read_input()?;
            let opts = PdfOptions {
                title: args.title.clone(),
                style: args.style(),
                layout: layout.into(),
                max_chars,
                line_height,
                shade_header: !args.no_shading,
                parse: args.parse_options(MissingDelimiter::KeepAsName),
                ..PdfOptions::default()
            };
            let out = lessonplan::export_pdf(&text, &opts, None)?.save_to(&args.output_path("pdf"))?;
            println!("{}", out.display());
        }
        #[cfg(feature = "server")]
        Commands::Serve {
            bind,
            port,
            allow_origin,
            model,
            base_url,
            temp_dir,
        } => {
            use std::sync::Arc;

            use lessonplan::server::completion::{OpenAiClient, OpenAiConfig};
            use lessonplan::server::{AppState, ServerConfig, run_serve};

            let api_key = std::env::var("OPENAI_API_KEY").ok();
            if api_key.is_none() {
                log::warn!("OPENAI_API_KEY is not set; /generate_lessonplan will fail");
            }
            let client = OpenAiClient::new(OpenAiConfig {
                api_key,
                base_url,
                model,
                ..OpenAiConfig::default()
            });
            let mut state = AppState::new(Arc::new(client));
            state.temp_dir = temp_dir.map(Arc::new);
            let config = ServerConfig {
                bind,
                port,
                allowed_origins: allow_origin,
            };
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_serve(state, &config))?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

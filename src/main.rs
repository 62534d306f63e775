use chrono::{Local, NaiveDateTime, TimeZone};
use clap::{Parser, Subcommand, ValueEnum};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use failshot::config::{self, DEFAULT_OUTPUT_DIR};
use failshot::run::RUN_TIMESTAMP_FORMAT;
use failshot::{
    ArtifactKind, FailureCaptureListener, FramebufferSession, MarkupSession, ReplayOptions, Run,
    ScenarioInfo, build_path, replay,
};

/// Failshot - failure artifact capture for acceptance-test runners
#[derive(Parser, Debug)]
#[command(
    name = "failshot",
    about = "Save screenshots of failing acceptance-test steps",
    after_help = "ENVIRONMENT VARIABLES:\n\
        FAILSHOT_OUTPUT_DIR   Root directory for failure artifacts\n\
        FAILSHOT_DIR_MODE     Octal mode for created directories\n\
        FAILSHOT_FRAME_SIZE   Framebuffer driver size (WxH)\n\
        RUST_LOG              Log filter (default: info)"
)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a JSON-lines lifecycle event stream and capture failing steps
    Replay {
        /// Event stream file ("-" for stdin)
        #[arg(short, long, default_value = "-")]
        events: String,

        /// Root directory for artifacts
        #[arg(short, long, env = "FAILSHOT_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
        output: String,

        /// Session driver used to produce evidence
        #[arg(short, long, value_enum, default_value_t = Driver::Framebuffer)]
        driver: Driver,

        /// Log capture errors and continue instead of stopping
        #[arg(long)]
        keep_going: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the artifact path for a failing step
    Path {
        /// Root directory for artifacts
        #[arg(short, long, env = "FAILSHOT_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
        output: String,

        /// Feature title
        #[arg(long)]
        feature: String,

        /// Scenario title
        #[arg(long)]
        scenario: String,

        /// 1-based step ordinal within the scenario
        #[arg(long)]
        step: usize,

        /// Step text
        #[arg(long)]
        text: String,

        /// Artifact kind
        #[arg(long, value_enum, default_value_t = Kind::Png)]
        kind: Kind,

        /// Run timestamp (YYYYMMDDHHMMSS); defaults to now
        #[arg(long)]
        timestamp: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Driver {
    /// Renders each step into a PNG frame
    Framebuffer,
    /// Text-only driver; produces page markup
    Markup,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Png,
    Html,
}

impl From<Kind> for ArtifactKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Png => ArtifactKind::Screenshot,
            Kind::Html => ArtifactKind::PageContent,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Replay {
            events,
            output,
            driver,
            keep_going,
            json,
        } => {
            let reader: Box<dyn BufRead> = if events == "-" {
                Box::new(BufReader::new(io::stdin()))
            } else {
                Box::new(BufReader::new(File::open(&events)?))
            };
            let options = ReplayOptions { keep_going };
            let settings = config::get();

            let summary = match driver {
                Driver::Framebuffer => {
                    let session = FramebufferSession::new(settings.frame_width, settings.frame_height);
                    let mut listener = FailureCaptureListener::new(&output, session).dir_mode(settings.dir_mode);
                    replay(&mut listener, reader, options, |session, scenario, step| {
                        let scenario = scenario.cloned().unwrap_or_else(|| ScenarioInfo::new("", ""));
                        session.show_step(&scenario, step);
                    })?
                }
                Driver::Markup => {
                    let session = MarkupSession::default();
                    let mut listener = FailureCaptureListener::new(&output, session).dir_mode(settings.dir_mode);
                    replay(&mut listener, reader, options, |session, _, step| {
                        session.set_page_content(format!("<html><body><p>{}</p></body></html>", step.text));
                    })?
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "Replayed {} scenarios, {} steps ({} failed)",
                    summary.scenarios, summary.steps, summary.failed_steps
                );
                for artifact in &summary.artifacts {
                    println!("  Step {}: {}", artifact.step, artifact.path.display());
                }
                if summary.capture_errors > 0 {
                    println!("  {} capture errors skipped", summary.capture_errors);
                }
            }
        }

        Commands::Path {
            output,
            feature,
            scenario,
            step,
            text,
            kind,
            timestamp,
        } => {
            let run = match timestamp {
                Some(ts) => {
                    let naive = NaiveDateTime::parse_from_str(&ts, RUN_TIMESTAMP_FORMAT)?;
                    let started_at = Local
                        .from_local_datetime(&naive)
                        .single()
                        .ok_or_else(|| format!("Ambiguous local time '{}'", ts))?;
                    Run::at(&output, started_at)
                }
                None => Run::new(&output),
            };
            let path: PathBuf = build_path(&run, &ScenarioInfo::new(feature, scenario), step, &text, kind.into());
            println!("{}", path.display());
        }
    }

    Ok(())
}

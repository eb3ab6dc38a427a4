mod ui;

use aba_session::{
    app::{App, Control},
    config::{Config, ConfigStore, FileConfigStore},
    plan::{PlanType, SessionContext, SessionHeader},
    runtime::{CrosstermEventSource, FixedTicker, Runner, SessionEvent},
    submit::{read_submitted, JsonFileSink, PayloadSink, WriterSink},
    summary::SessionSummary,
    template,
    walker::SessionWalker,
};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

/// run behavioral-therapy plan sessions from the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Walks an applicator through a plan session: behaviors, activities and timed tries, each scored and optionally rewarded, then prints the session payload."
)]
pub struct Cli {
    /// write logs to this file (the interactive session logs nothing otherwise)
    #[clap(long, global = true)]
    log_file: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// run a plan session in the terminal
    Run(RunArgs),
    /// list the bundled plan templates
    Plans,
    /// print the summary of a submitted session payload
    Summary(SummaryArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// bundled plan key (`social_skills`, `evaluation/baseline_communication`) or a template path
    #[clap(short = 't', long)]
    template: String,

    /// patient name
    #[clap(short = 'p', long)]
    patient: String,

    /// applicator name (defaults to the saved one)
    #[clap(short = 'a', long)]
    applicator: Option<String>,

    /// application date (defaults to today)
    #[clap(short = 'd', long)]
    date: Option<String>,

    /// plan type; inferred from the template when omitted
    #[clap(long, value_enum)]
    plan_type: Option<PlanType>,

    /// run only these behaviors (repeatable)
    #[clap(short = 'b', long = "behavior")]
    behaviors: Vec<String>,

    /// write the session payload here instead of stdout
    #[clap(short = 'o', long)]
    output: Option<PathBuf>,

    /// start each try right after the previous one is recorded
    #[clap(long)]
    auto_start: bool,

    /// remember the applicator name for later runs
    #[clap(long)]
    save_defaults: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SummaryArgs {
    /// session payload written by `run`
    payload: PathBuf,

    /// print CSV instead of a table
    #[clap(long)]
    csv: bool,
}

fn init_logging(log_file: Option<&Path>, interactive: bool) -> Result<(), Box<dyn Error>> {
    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("aba_session=debug")),
                )
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        // the alternate screen would be garbled by stderr output
        None if interactive => {}
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
                )
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, Command::Run(_));
    init_logging(cli.log_file.as_deref(), interactive)?;

    match cli.command {
        Command::Run(args) => run_session(args, &FileConfigStore::new()),
        Command::Plans => list_plans(),
        Command::Summary(args) => print_summary(&args),
    }
}

fn list_plans() -> Result<(), Box<dyn Error>> {
    for entry in template::catalog()? {
        println!(
            "{}/{}\t{}\t{}",
            entry.origin,
            entry.key,
            entry.plan_type(None),
            entry.template.name
        );
    }
    Ok(())
}

fn print_summary(args: &SummaryArgs) -> Result<(), Box<dyn Error>> {
    let session = read_submitted(&args.payload)?;
    let summary = SessionSummary::new(&session.header, &session.behaviors);
    if args.csv {
        summary.write_csv(io::stdout())?;
    } else {
        print!("{}", summary.render_text());
    }
    Ok(())
}

/// Resolve the session context and queue from CLI args and saved defaults.
fn prepare_session(
    args: &RunArgs,
    store: &impl ConfigStore,
) -> Result<(SessionWalker, Config), Box<dyn Error>> {
    let mut config = store.load();
    let entry = template::load(&args.template)?;
    let applicator = args
        .applicator
        .clone()
        .or_else(|| config.applicator_name.clone())
        .unwrap_or_default();

    let header = SessionHeader {
        patient_name: args.patient.clone(),
        plan_name: entry.template.name.clone(),
        application_date: args.date.clone().unwrap_or_else(|| config.today()),
        applicator_name: applicator.clone(),
    };
    let context = SessionContext::new(header, entry.plan_type(args.plan_type))?;
    let queue = template::build_queue(&entry.template, &args.behaviors)?;

    if args.save_defaults {
        config.applicator_name = Some(applicator);
        store.save(&config)?;
    }
    if args.auto_start {
        config.auto_start = true;
    }

    tracing::info!(
        plan = %entry.template.name,
        plan_type = %context.plan_type(),
        behaviors = queue.len(),
        "session prepared"
    );
    Ok((SessionWalker::new(context, queue), config))
}

fn run_session(args: RunArgs, store: &impl ConfigStore) -> Result<(), Box<dyn Error>> {
    let (walker, config) = prepare_session(&args, store)?;

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(walker, config);
    let outcome = start_tui(&mut terminal, &mut app);

    let restored = restore_terminal(&mut terminal);
    let outcome = match &args.output {
        Some(path) => finish_session(&app.walker, &mut JsonFileSink::new(path), outcome),
        None => finish_session(&app.walker, &mut WriterSink::stdout(), outcome),
    };
    outcome?;
    restored
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        LeaveAlternateScreen,
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Hand whatever was recorded to the sink, even when the session loop failed,
/// then report the loop's own result.
fn finish_session<S: PayloadSink>(
    walker: &SessionWalker,
    sink: &mut S,
    outcome: Result<(), Box<dyn Error>>,
) -> Result<(), Box<dyn Error>> {
    if let Err(e) = &outcome {
        tracing::warn!(error = %e, "session loop failed, submitting recorded tries");
    } else if !walker.is_completed() {
        tracing::warn!("session left before completion, submitting recorded tries");
    }
    sink.submit(&walker.final_payload())?;
    outcome
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(app.config.tick_rate_ms.max(10))),
    );
    tracing::debug!(tick = ?runner.tick_interval(), "session loop started");

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        let (event, dt) = runner.step_timed();
        app.on_tick(dt);

        match event {
            SessionEvent::Tick | SessionEvent::Resize => {}
            SessionEvent::FocusGained => app.on_focus_gained(),
            SessionEvent::Key(key) => {
                if app.on_key(key) == Control::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aba_session::plan::{Activity, Behavior, ResultKind, Try};
    use clap::Parser;
    use std::cell::RefCell;

    struct MemoryStore(RefCell<Config>);

    impl ConfigStore for MemoryStore {
        fn load(&self) -> Config {
            self.0.borrow().clone()
        }

        fn save(&self, cfg: &Config) -> io::Result<()> {
            *self.0.borrow_mut() = cfg.clone();
            Ok(())
        }
    }

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["aba-session", "run", "-t", "social_skills", "-p", "Ana"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Run(args) => args,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_run_defaults() {
        let args = run_args(&[]);
        assert_eq!(args.template, "social_skills");
        assert_eq!(args.patient, "Ana");
        assert_eq!(args.applicator, None);
        assert_eq!(args.plan_type, None);
        assert!(args.behaviors.is_empty());
        assert!(!args.auto_start);
    }

    #[test]
    fn test_cli_run_options() {
        let args = run_args(&[
            "-a",
            "Rita",
            "--plan-type",
            "evaluation",
            "-b",
            "Eye contact",
            "--behavior",
            "Turn taking",
            "-o",
            "out.json",
        ]);
        assert_eq!(args.applicator.as_deref(), Some("Rita"));
        assert_eq!(args.plan_type, Some(PlanType::Evaluation));
        assert_eq!(args.behaviors, vec!["Eye contact", "Turn taking"]);
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_cli_rejects_unknown_plan_type() {
        let res = Cli::try_parse_from([
            "aba-session", "run", "-t", "x", "-p", "Ana", "--plan-type", "unknown",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_cli_summary_and_plans() {
        let cli = Cli::parse_from(["aba-session", "summary", "s.json", "--csv"]);
        match cli.command {
            Command::Summary(args) => {
                assert_eq!(args.payload, PathBuf::from("s.json"));
                assert!(args.csv);
            }
            other => panic!("expected summary, got {other:?}"),
        }
        assert!(matches!(
            Cli::parse_from(["aba-session", "plans"]).command,
            Command::Plans
        ));
    }

    #[test]
    fn test_prepare_session_uses_saved_applicator() {
        let store = MemoryStore(RefCell::new(Config {
            applicator_name: Some("Rita".into()),
            ..Config::default()
        }));
        let (walker, config) = prepare_session(&run_args(&["-d", "01/02/2026"]), &store).unwrap();

        let header = walker.context().header();
        assert_eq!(header.applicator_name, "Rita");
        assert_eq!(header.plan_name, "Social skills");
        assert_eq!(header.application_date, "01/02/2026");
        assert_eq!(walker.context().plan_type(), PlanType::Intervention);
        assert!(!config.auto_start);
    }

    #[test]
    fn test_prepare_session_requires_applicator() {
        let store = MemoryStore(RefCell::new(Config::default()));
        let err = prepare_session(&run_args(&[]), &store).unwrap_err();
        assert!(err.to_string().contains("applicator_name"));
    }

    #[test]
    fn test_prepare_session_saves_defaults() {
        let store = MemoryStore(RefCell::new(Config::default()));
        let (_, config) =
            prepare_session(&run_args(&["-a", "Rita", "--save-defaults", "--auto-start"]), &store)
                .unwrap();
        assert!(config.auto_start);

        let saved = store.load();
        assert_eq!(saved.applicator_name.as_deref(), Some("Rita"));
        assert!(!saved.auto_start);
    }

    fn walker_with_one_recorded_try() -> SessionWalker {
        let context = SessionContext::new(
            SessionHeader {
                patient_name: "Ana".into(),
                plan_name: "Plano A".into(),
                application_date: "19/10/2026".into(),
                applicator_name: "Rita".into(),
            },
            PlanType::Evaluation,
        )
        .unwrap();
        let queue = vec![Behavior {
            behavior_name: "B1".into(),
            activities: vec![Activity {
                activity_name: "A1".into(),
                tries: (0..2).map(|_| Try::pending("0s")).collect(),
            }],
        }];
        let mut walker = SessionWalker::new(context, queue);
        walker.begin();
        walker.on_tick(Duration::from_secs(6));
        walker.record_result(ResultKind::Did, None);
        walker
    }

    #[test]
    fn test_finish_session_submits_before_loop_error() {
        let walker = walker_with_one_recorded_try();
        let mut sink = WriterSink::new(Vec::new());

        let err = finish_session(&walker, &mut sink, Err("terminal went away".into())).unwrap_err();
        assert_eq!(err.to_string(), "terminal went away");

        let written: serde_json::Value = serde_json::from_slice(&sink.into_inner()).unwrap();
        let tries = &written["behaviors"][0]["activities"][0]["tries"];
        assert_eq!(tries[0]["result"], "did");
        assert_eq!(tries[0]["time"], "6s");
        assert_eq!(tries[1]["result"], serde_json::Value::Null);
    }

    #[test]
    fn test_finish_session_passes_through_success() {
        let walker = walker_with_one_recorded_try();
        let mut sink = WriterSink::new(Vec::new());
        assert!(finish_session(&walker, &mut sink, Ok(())).is_ok());
        assert!(!sink.into_inner().is_empty());
    }
}

use std::sync::mpsc::{self, Sender};
use std::time::Duration;

use aba_session::app::{App, AppState, Control};
use aba_session::config::Config;
use aba_session::plan::{PlanType, ResultKind, SessionContext, SessionHeader};
use aba_session::runtime::{FixedTicker, Runner, SessionEvent, TestEventSource};
use aba_session::walker::{SessionWalker, WalkerState};
use aba_session::template;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

fn context(plan_type: PlanType) -> SessionContext {
    SessionContext::new(
        SessionHeader {
            patient_name: "Ana".into(),
            plan_name: "Plano".into(),
            application_date: "19/10/2026".into(),
            applicator_name: "Rita".into(),
        },
        plan_type,
    )
    .unwrap()
}

fn app_for(plan: &str, selection: &[String]) -> App {
    let entry = template::find_bundled(plan).unwrap();
    let queue = template::build_queue(&entry.template, selection).unwrap();
    App::new(
        SessionWalker::new(context(entry.plan_type(None)), queue),
        Config::default(),
    )
}

fn key(tx: &Sender<SessionEvent>, code: KeyCode) {
    tx.send(SessionEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
        .unwrap();
}

fn ticks(tx: &Sender<SessionEvent>, n: usize) {
    for _ in 0..n {
        tx.send(SessionEvent::Tick).unwrap();
    }
}

/// Pump queued events into the app the way the terminal loop does. Each Tick
/// stands for one second so runs are deterministic.
fn pump(runner: &Runner<TestEventSource, FixedTicker>, app: &mut App, max_steps: usize) -> Control {
    for _ in 0..max_steps {
        match runner.step() {
            SessionEvent::Tick => app.on_tick(Duration::from_secs(1)),
            SessionEvent::FocusGained => app.on_focus_gained(),
            SessionEvent::Resize => {}
            SessionEvent::Key(k) => {
                if app.on_key(k) == Control::Quit {
                    return Control::Quit;
                }
            }
        }
    }
    Control::Continue
}

// Headless integration using the internal runtime + App without a TTY.
#[test]
fn headless_evaluation_session_reaches_summary() {
    let mut app = app_for("baseline_communication", &[]);
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    // Requesting / Point to wanted item: 3 tries behind a 5s delay
    for _ in 0..3 {
        key(&tx, KeyCode::Enter);
        ticks(&tx, 7);
        key(&tx, KeyCode::Char('1'));
    }
    // Vocal request: skipped while its delay is pending
    key(&tx, KeyCode::Char(' '));
    key(&tx, KeyCode::Char('s'));
    // Following instructions: 5 tries without delay
    for _ in 0..5 {
        key(&tx, KeyCode::Enter);
        key(&tx, KeyCode::Char('3'));
    }
    key(&tx, KeyCode::Char('q'));

    assert_eq!(pump(&runner, &mut app, 200), Control::Quit);
    assert_eq!(app.state, AppState::Summary);
    assert!(app.walker.is_completed());
    assert!(!app.walker.timer().is_running());

    let summary = app.summary.as_ref().unwrap();
    assert_eq!(summary.total_tries(), 11);
    let results: Vec<&str> = summary.rows.iter().map(|r| r.result.as_str()).collect();
    assert_eq!(&results[..3], &["Fez", "Fez", "Fez"]);
    assert_eq!(&results[3..6], &["Pulado", "Pulado", "Pulado"]);
    assert!(results[6..].iter().all(|r| *r == "Não fez"));

    // 5 of the 7 ticks went to the sleep delay
    assert_eq!(summary.rows[0].time, "2s");
    assert_eq!(summary.rows[3].time, "-");
    assert!(summary.rows.iter().all(|r| r.reward == "-"));
}

#[test]
fn headless_reward_prompt_flow() {
    let mut app = app_for("social_skills", &["Eye contact".to_string()]);
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    key(&tx, KeyCode::Enter);
    ticks(&tx, 12);
    key(&tx, KeyCode::Char('2'));
    pump(&runner, &mut app, 14);
    assert!(matches!(app.state, AppState::RewardPrompt(_)));

    // ticks while the prompt is open do not change the captured time
    ticks(&tx, 3);
    key(&tx, KeyCode::Char('s'));
    for c in "sticker".chars() {
        key(&tx, KeyCode::Char(c));
    }
    key(&tx, KeyCode::Enter);
    pump(&runner, &mut app, 12);

    assert_eq!(app.state, AppState::Session);
    assert_eq!(app.walker.state(), WalkerState::AwaitingStart);
    let first = &app.walker.queue()[0].activities[0].tries[0];
    assert_eq!(first.result, Some(ResultKind::DidWithHelp));
    assert_eq!(first.time.as_deref(), Some("7s"));
    assert_eq!(first.reward.as_deref(), Some("sticker"));

    // leaving from the prompt keeps the picked outcome
    key(&tx, KeyCode::Enter);
    ticks(&tx, 6);
    key(&tx, KeyCode::Char('1'));
    tx.send(SessionEvent::Key(KeyEvent::new(
        KeyCode::Char('c'),
        KeyModifiers::CONTROL,
    )))
    .unwrap();
    assert_eq!(pump(&runner, &mut app, 20), Control::Quit);

    let second = &app.walker.queue()[0].activities[0].tries[1];
    assert_eq!(second.result, Some(ResultKind::Did));
    assert_eq!(second.time.as_deref(), Some("1s"));
    assert_eq!(second.reward, None);
}

use assert_cmd::Command;
use predicates::prelude::*;
use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

#[test]
fn help_lists_both_commands() {
    let mut cmd = Command::cargo_bin("sv-worker").expect("Binary exists");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("run").and(predicate::str::contains("once")));
}

#[test]
fn once_without_config_flag_is_rejected() {
    let mut cmd = Command::cargo_bin("sv-worker").expect("Binary exists");
    cmd.arg("once");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--config"));
}

#[test]
fn once_with_missing_config_file_fails() {
    let mut cmd = Command::cargo_bin("sv-worker").expect("Binary exists");
    cmd.arg("once")
        .arg("--config")
        .arg("/nonexistent/sv-worker.yaml")
        .env("RUST_LOG", "off");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use sv_worker::cli::{run, Cli, Commands};

    // Dummy path: run must log before it touches the config.
    let cli = Cli {
        command: Commands::Once {
            config: std::path::PathBuf::from("dummy.yaml"),
        },
    };

    let result = run(cli).await;
    assert!(result.is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{read_to_string, write};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn result_file(dir: &Path, name: &str, runners: &[&str]) -> PathBuf {
    let records: String = runners
        .iter()
        .map(|r| format!("<PersonResult><Person><Name><Family>{r}</Family></Name></Person></PersonResult>"))
        .collect();
    let path = dir.join(name);
    write(
        &path,
        format!("<?xml version=\"1.0\"?>\n<ResultList><ClassResult><Class><Name>H21</Name></Class>{records}</ClassResult></ResultList>\n"),
    )
    .expect("Writing fixture failed");
    path
}

fn iofxml() -> Command {
    let mut cmd = Command::cargo_bin("iofxml").expect("Binary exists");
    cmd.env_remove("IOFXML_BASE_URL");
    cmd
}

#[test]
fn merge_writes_all_records_in_order() {
    let dir = tempdir().unwrap();
    let base = result_file(dir.path(), "base.xml", &["Alm", "Berg", "Dahl"]);
    let extra = result_file(dir.path(), "extra.xml", &["Ek", "Falk"]);
    let output = dir.path().join("merged.xml");

    iofxml()
        .arg("merge")
        .arg(&base)
        .arg(&extra)
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Merged 5 person results"));

    let merged = read_to_string(&output).unwrap();
    assert_eq!(merged.matches("<PersonResult>").count(), 5);
    let order: Vec<usize> = ["Alm", "Berg", "Dahl", "Ek", "Falk"]
        .iter()
        .map(|name| merged.find(name).expect("name present"))
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]), "{merged}");
}

#[test]
fn merge_without_class_result_fails_and_writes_nothing() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("base.xml");
    write(&base, "<ResultList/>").unwrap();
    let extra = result_file(dir.path(), "extra.xml", &["Ek"]);
    let output = dir.path().join("merged.xml");

    iofxml()
        .arg("merge")
        .arg(&base)
        .arg(&extra)
        .arg(&output)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing ClassResult"));

    assert!(!output.exists());
}

#[test]
fn merge_names_supplement_without_person_results() {
    let dir = tempdir().unwrap();
    let base = result_file(dir.path(), "base.xml", &["Alm"]);
    let empty = result_file(dir.path(), "hollow.xml", &[]);
    let output = dir.path().join("merged.xml");

    iofxml()
        .arg("merge")
        .arg(&base)
        .arg(&empty)
        .arg(&output)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("hollow.xml"));

    assert!(!output.exists());
}

#[test]
fn merge_requires_two_inputs_and_an_output() {
    iofxml()
        .args(["merge", "only.xml", "out.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn unknown_or_missing_command_prints_usage() {
    iofxml()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
    iofxml()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn winsplits_rejects_unparseable_date() {
    iofxml()
        .args(["winsplits", "--date", "yesterday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--date"));
}

#[test]
fn winsplits_reports_unreachable_service() {
    let dir = tempdir().unwrap();
    iofxml()
        .args(["winsplits", "--date", "2025-09-01", "--output-dir"])
        .arg(dir.path())
        .env("IOFXML_BASE_URL", "http://127.0.0.1:9/winsplits.php")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("[ERROR]"));

    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

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

    use iofxml::cli::{run, Cli, Commands};

    let dir = tempdir().unwrap();
    let cli = Cli {
        config: None,
        command: Commands::Merge {
            files: vec![
                dir.path().join("missing-base.xml"),
                dir.path().join("missing-extra.xml"),
                dir.path().join("out.xml"),
            ],
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

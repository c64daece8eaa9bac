use playground::bindings::{BindingSet, BindingValue};
use playground::config::{DEFAULT_HEIGHT, PlaygroundDefinition, SandboxConfig};
use playground::{Outcome, Playground, RunState};
use std::sync::Arc;

const INITIAL: &str = r#"import * as Lib from "@example/lib";

console.log(Lib.double(21));
"#;

fn bindings() -> Arc<BindingSet> {
    Arc::new(
        BindingSet::new()
            .with(
                "Lib",
                BindingValue::Script("{ double: function (x) { return x * 2; } }".to_string()),
            )
            .unwrap(),
    )
}

fn playground() -> Playground {
    Playground::new("Doubling", INITIAL, bindings())
}

#[test]
fn test_initial_state() {
    let pg = playground();
    assert_eq!(pg.title(), "Doubling");
    assert_eq!(pg.height(), DEFAULT_HEIGHT);
    assert_eq!(pg.snippet(), INITIAL);
    assert_eq!(pg.state(), RunState::Idle);
    assert!(pg.outcome().is_none());
    assert!(pg.can_run());
}

#[test]
fn test_run_blocking_publishes_transcript() {
    let mut pg = playground();
    let outcome = pg.run_blocking().unwrap().clone();
    assert_eq!(outcome, Outcome::success(vec!["42".into()]));
    assert_eq!(pg.state(), RunState::Succeeded);
}

#[test]
fn test_failed_run_then_success_replaces_error() {
    let mut pg = playground();
    pg.set_snippet("console.log('partial'); throw new Error('boom');");
    pg.run_blocking().unwrap();
    assert_eq!(pg.state(), RunState::Failed);
    assert!(pg.outcome().unwrap().error().unwrap().contains("boom"));
    assert!(pg.outcome().unwrap().transcript().is_none());

    pg.set_snippet("console.log('fine');");
    pg.run_blocking().unwrap();
    assert_eq!(pg.state(), RunState::Succeeded);
    assert_eq!(pg.outcome(), Some(&Outcome::success(vec!["fine".into()])));
}

#[test]
fn test_reset_restores_initial_text() {
    let mut pg = playground();
    pg.set_snippet("console.log('edited');");
    pg.run_blocking().unwrap();
    pg.set_snippet("throw 1;");
    pg.run_blocking().unwrap();

    pg.reset();
    assert_eq!(pg.snippet(), INITIAL);
    pg.reset();
    assert_eq!(pg.snippet(), INITIAL);
}

#[test]
fn test_instances_do_not_share_state() {
    let shared = bindings();
    let mut first = Playground::new("first", "console.log('one');", Arc::clone(&shared));
    let second = Playground::new("second", "console.log('two');", shared);

    first.set_snippet("console.log('changed');");
    first.run_blocking().unwrap();

    assert_eq!(second.snippet(), "console.log('two');");
    assert!(second.outcome().is_none());
    assert_eq!(second.state(), RunState::Idle);
}

#[tokio::test]
async fn test_async_run() {
    let mut pg = playground();
    let outcome = pg.run().await.unwrap();
    assert_eq!(outcome.transcript(), Some(&["42".to_string()][..]));
    assert!(pg.can_run());
}

#[tokio::test]
async fn test_cancelled_run_can_be_retried() {
    let mut pg = playground();
    pg.set_snippet("const end = Date.now() + 200; while (Date.now() < end) {}");

    // The run is polled once, then dropped while the loop is still spinning
    tokio::select! {
        biased;
        _ = pg.run() => panic!("run should still be in progress"),
        _ = async {} => {}
    }
    assert_eq!(pg.state(), RunState::Idle);
    assert!(pg.can_run());

    pg.reset();
    let outcome = pg.run().await.unwrap();
    assert_eq!(outcome.transcript(), Some(&["42".to_string()][..]));
    assert_eq!(pg.state(), RunState::Succeeded);
}

#[tokio::test]
async fn test_definition_with_script_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("lib.js"),
        "{ greet: function (name) { return 'hello ' + name; } }\n",
    )
    .unwrap();
    let definition_path = dir.path().join("greeting.toml");
    std::fs::write(
        &definition_path,
        r#"
title = "Greeting"
height = 250
code = """
import { greet } from "greeter";
console.log(Greeter.greet(network.name));
"""

[[bindings]]
name = "Greeter"
script_file = "lib.js"

[[bindings]]
name = "network"
json = { name = "testnet" }
"#,
    )
    .unwrap();

    let definition = PlaygroundDefinition::load(&definition_path).unwrap();
    let mut pg = Playground::from_definition(&definition, SandboxConfig::default()).unwrap();
    assert_eq!(pg.height(), 250);

    let outcome = pg.run().await.unwrap();
    assert_eq!(outcome, &Outcome::success(vec!["hello testnet".into()]));
}

#[test]
fn test_definition_missing_script_file() {
    let dir = tempfile::tempdir().unwrap();
    let definition_path = dir.path().join("broken.toml");
    std::fs::write(
        &definition_path,
        "title = \"t\"\ncode = \"\"\n[[bindings]]\nname = \"Lib\"\nscript_file = \"missing.js\"\n",
    )
    .unwrap();

    let definition = PlaygroundDefinition::load(&definition_path).unwrap();
    assert!(Playground::from_definition(&definition, SandboxConfig::default()).is_err());
}

#[test]
fn test_bundled_multisig_demo() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/multisig.toml");
    let definition = PlaygroundDefinition::load(&path).unwrap();
    let mut pg = Playground::from_definition(&definition, SandboxConfig::default()).unwrap();

    let outcome = pg.run_blocking().unwrap();
    assert_eq!(
        outcome.transcript().unwrap(),
        &["2-of-3", "[\n  \"mainnet\",\n  \"testnet\",\n  \"regtest\"\n]"]
    );
}

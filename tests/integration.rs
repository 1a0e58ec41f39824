use std::cell::RefCell;
use std::ffi::OsString;
use std::path::Path;

use cc_permgate::config::Config;
use cc_permgate::eval::{Engine, Verdict};
use cc_permgate::launch::{LaunchError, LaunchPlan, Launcher};
use cc_permgate::policy::{PolicySet, Source, SourceDescriptor};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn source(name: &str, allow: &[&str], deny: &[&str]) -> Source {
    Source {
        name: name.into(),
        allow: strings(allow),
        deny: strings(deny),
    }
}

/// Enterprise denies `rm -rf`, user allows git and docker.
fn sample_policy() -> PolicySet {
    PolicySet::build(&[
        source("enterprise", &[], &["Bash(rm -rf *)", "Bash(rm -rf **)"]),
        source(
            "user",
            &["Bash(git *)", "Bash(docker **)", "Bash(make *)"],
            &[
                "Bash(git push --force*)",
                "Bash(curl **install.sh)",
                "Bash(find ** -exec rm {} **)",
            ],
        ),
    ])
}

fn verdict_for(args: &[&str]) -> Verdict {
    let config = Config::default_config();
    Engine::from_config(&sample_policy(), &config)
        .evaluate(&strings(args))
        .verdict
}

macro_rules! decision_test {
    ($name:ident, [$($arg:expr),* $(,)?], $verdict:ident) => {
        #[test]
        fn $name() {
            let args: &[&str] = &[$($arg),*];
            assert_eq!(verdict_for(args), Verdict::$verdict, "args: {:?}", args);
        }
    };
}

// ── APPROVE: explicit allow rules ──

decision_test!(approve_git_commit, ["git", "commit"], Approve);
decision_test!(approve_git_status, ["git", "status"], Approve);
decision_test!(approve_make_test, ["make", "test"], Approve);
decision_test!(approve_docker_volume, ["docker", "run", "-v", "/a/b:/c", "img"], Approve);

// ── APPROVE: safe-command heuristic ──

decision_test!(approve_heuristic_curl, ["curl", "https://example.com"], Approve);
decision_test!(approve_heuristic_ls_path, ["ls", "-la", "/var/log"], Approve);
decision_test!(approve_heuristic_kubectl, ["kubectl", "get", "pods"], Approve);
decision_test!(approve_heuristic_ssh_alias, ["ssh", "root@gmktec-k9"], Approve);
decision_test!(approve_heuristic_embedded, ["-p", "run cargo test please"], Approve);

// ── DENY: deny rules ──

decision_test!(deny_rm_rf_path, ["rm", "-rf", "/tmp/x"], Deny);
decision_test!(deny_rm_rf_word, ["rm", "-rf", "build"], Deny);
decision_test!(deny_force_push, ["git", "push", "--force"], Deny);
decision_test!(deny_force_push_lease, ["git", "push", "--force-with-lease"], Deny);

// ── DENY: deny overrides heuristic ──

// "*.go" alone would satisfy the safe-command heuristic
decision_test!(
    deny_find_exec_rm_braces,
    ["find", ".", "-name", "*.go", "-exec", "rm", "{}", ";"],
    Deny
);
decision_test!(approve_find_print, ["find", ".", "-name", "*.go", "-print"], Approve);

decision_test!(
    deny_overrides_heuristic,
    ["curl", "-fsSL", "https://get.example.com/install.sh"],
    Deny
);

// ── DENY: default ──

decision_test!(deny_unknown, ["terraform", "apply"], Deny);
decision_test!(deny_empty, [], Deny);

// ── DENY: override bypass ──

decision_test!(bypass_auto_approve, ["--auto-approve", "git", "status"], Deny);
decision_test!(bypass_ask, ["git", "status", "--ask"], Deny);
decision_test!(bypass_no_auto_approve, ["--no-auto-approve", "make", "test"], Deny);

// ── Properties ──

#[test]
fn deny_overrides_allow_regardless_of_order() {
    let config = Config::default_config();
    let allow_first = PolicySet::build(&[
        source("a", &["Bash(make *)"], &[]),
        source("b", &[], &["Bash(make *)"]),
    ]);
    let deny_first = PolicySet::build(&[
        source("a", &[], &["Bash(make *)"]),
        source("b", &["Bash(make *)"], &[]),
    ]);
    for policy in [allow_first, deny_first] {
        let engine = Engine::from_config(&policy, &config);
        assert!(!engine.decide(&strings(&["make", "all"])));
    }
}

#[test]
fn dedup_keeps_higher_precedence_slot() {
    let policy = PolicySet::build(&[
        source("enterprise", &["Bash(npm *)", "Bash(git *)"], &[]),
        source("user", &["Bash(git *)"], &[]),
    ]);
    assert_eq!(policy.allow(), ["Bash(npm *)", "Bash(git *)"]);
}

#[test]
fn malformed_rules_never_evaluated() {
    let policy = PolicySet::from_rules(&["make *", "Bash make", "Bash(make *"], &[]);
    assert!(!cc_permgate::decide(&strings(&["make", "all"]), &policy));
}

#[test]
fn decide_with_no_sources_uses_heuristic() {
    let policy = PolicySet::build(&[]);
    assert!(cc_permgate::decide(
        &strings(&["curl", "https://example.com"]),
        &policy
    ));
}

#[test]
fn decide_override_beats_allow_everything() {
    let policy = PolicySet::from_rules(&["Bash(**)"], &[]);
    assert!(!cc_permgate::decide(
        &strings(&["--auto-approve", "anything"]),
        &policy
    ));
}

#[test]
fn heuristic_deny_recheck_with_git() {
    let policy = PolicySet::from_rules(&[], &["Bash(git reset --hard)"]);
    assert!(!cc_permgate::decide(&strings(&["git", "reset", "--hard"]), &policy));
    assert!(cc_permgate::decide(&strings(&["git", "reset"]), &policy));
}

#[test]
fn flattening_loses_quoting() {
    // "a b" and "a" "b" produce the same subject.
    let policy = PolicySet::from_rules(&[], &["Bash(echo a b)"]);
    let config = Config::default_config();
    let engine = Engine::from_config(&policy, &config);
    assert!(!engine.decide(&strings(&["echo", "a b"])));
    assert!(!engine.decide(&strings(&["echo", "a", "b"])));
    assert!(engine.decide(&strings(&["echo", "a"])));
}

// ── End to end through `run` ──

#[derive(Default)]
struct RecordingLauncher {
    plans: RefCell<Vec<LaunchPlan>>,
}

impl Launcher for RecordingLauncher {
    fn launch(&self, plan: &LaunchPlan) -> Result<(), LaunchError> {
        self.plans.borrow_mut().push(plan.clone());
        Ok(())
    }
}

fn os(args: &[&str]) -> Vec<OsString> {
    args.iter().map(OsString::from).collect()
}

fn config_with_sources(dir: &Path) -> Config {
    let enterprise = dir.join("policies.json");
    let user = dir.join("settings.json");
    std::fs::write(
        &enterprise,
        r#"{"permissions": {"deny": ["Bash(rm -rf **)"]}}"#,
    )
    .unwrap();
    std::fs::write(
        &user,
        r#"{"theme": "dark", "permissions": {"allow": ["Bash(git *)", "Bash(rm -rf **)"]}}"#,
    )
    .unwrap();

    let mut config = Config::default_config();
    config.wrapper.program = "claude".into();
    config.sources = vec![
        SourceDescriptor::new("user", &user, 10),
        SourceDescriptor::new("enterprise", &enterprise, 100),
        SourceDescriptor::new("missing", dir.join("absent.json"), 50),
    ];
    config
}

fn launched_args(config: &Config, args: &[&str]) -> Vec<String> {
    let launcher = RecordingLauncher::default();
    cc_permgate::run(config, os(args), Vec::new(), &launcher).unwrap();
    let plans = launcher.plans.into_inner();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].program, OsString::from("claude"));
    plans[0]
        .args
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn run_approves_allowed_command() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_sources(dir.path());
    assert_eq!(
        launched_args(&config, &["git", "commit"]),
        vec!["--auto-approve", "git", "commit"]
    );
}

#[test]
fn run_enterprise_deny_beats_user_allow() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_sources(dir.path());
    assert_eq!(
        launched_args(&config, &["rm", "-rf", "/tmp/x"]),
        vec!["rm", "-rf", "/tmp/x"]
    );
}

#[test]
fn run_survives_malformed_source() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_with_sources(dir.path());
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{\"permissions\": ").unwrap();
    config
        .sources
        .push(SourceDescriptor::new("broken", &broken, 1000));
    assert_eq!(
        launched_args(&config, &["git", "log"]),
        vec!["--auto-approve", "git", "log"]
    );
}

#[test]
fn run_with_override_passes_through() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_sources(dir.path());
    assert_eq!(
        launched_args(&config, &["--auto-approve", "git", "commit"]),
        vec!["--auto-approve", "git", "commit"]
    );
}

#[test]
fn run_tool_lists_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_with_sources(dir.path());
    config.wrapper.strategy = cc_permgate::launch::Strategy::ToolLists;
    assert_eq!(
        launched_args(&config, &["-p", "hi"]),
        vec![
            "--allowedTools",
            "Bash(git *) Bash(rm -rf **)",
            "--disallowedTools",
            "Bash(rm -rf **)",
            "-p",
            "hi"
        ]
    );
}

#[test]
fn run_without_sources_uses_heuristic() {
    let mut config = Config::default_config();
    config.wrapper.program = "claude".into();
    config.sources.clear();
    assert_eq!(
        launched_args(&config, &["curl", "https://example.com"]),
        vec!["--auto-approve", "curl", "https://example.com"]
    );
}

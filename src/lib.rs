//! cc-permgate: a permission wrapper that sits in front of Claude Code.
//!
//! The wrapper receives the arguments meant for the wrapped tool, merges
//! allow/deny rules from ranked settings documents, decides whether the
//! invocation should be auto-approved, and hands control to the tool with an
//! approval flag injected (or not).
//!
//! # Architecture
//!
//! - **[`parse`]** — `Tool(pattern)` rule grammar and glob matching.
//! - **[`policy`]** — Settings sources and the precedence-ordered [`PolicySet`](policy::PolicySet).
//! - **[`eval`]** — Decision engine: override bypass, deny, allow, safe-command heuristic.
//! - **[`launch`]** — Launch strategies, launch plans, and the `exec` launcher.
//! - **[`config`]** — Wrapper configuration: embedded defaults + user overlay merge.
//! - **[`logging`]** — stderr warnings and the optional debug log file.

/// Wrapper configuration, loading, and overlay merge logic.
pub mod config;
/// Decision engine, invocation context, verdict types.
pub mod eval;
/// Launch strategies and the process-replacing launcher.
pub mod launch;
/// Logger setup and decision records.
pub mod logging;
/// Rule grammar and glob matcher.
pub mod parse;
/// Permission sources and policy merge.
pub mod policy;

use std::ffi::OsString;

use config::Config;
use eval::Engine;
use launch::{LaunchError, Launcher};
use policy::PolicySet;

/// Decide whether `args` should be auto-approved under `policy`, using the
/// default heuristic list and override flags.
pub fn decide(args: &[String], policy: &PolicySet) -> bool {
    let config = Config::default_config();
    Engine::from_config(policy, &config).decide(args)
}

/// Resolve the policy from the configured sources, decide, and launch.
///
/// Returns only when the launcher does (a process-replacing launcher returns
/// only on failure).
pub fn run(
    config: &Config,
    args: Vec<OsString>,
    env: Vec<(OsString, OsString)>,
    launcher: &dyn Launcher,
) -> Result<(), LaunchError> {
    let policy = PolicySet::load(&config.sources);
    let command = args
        .iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ");

    let prepared = launch::prepare(config, &policy, args, env);
    if let Some(ruling) = &prepared.ruling {
        logging::log_ruling(&command, ruling);
    }
    log::debug!("launching: {}", prepared.plan.command_line());
    launcher.launch(&prepared.plan)
}

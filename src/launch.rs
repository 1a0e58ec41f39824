//! Handing control to the wrapped tool.
//!
//! The engine never replaces the process itself. [`prepare`] turns a verdict
//! into a [`LaunchPlan`] and a [`Launcher`] carries it out.

use std::ffi::OsString;
use std::io;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::eval::{Engine, InvocationContext, Ruling};
use crate::policy::PolicySet;

/// How permissions are conveyed to the wrapped tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Evaluate the policy; inject the approval flag on approve.
    #[default]
    AutoApprove,
    /// Inject the approval flag unless the caller passed an override flag.
    AlwaysApprove,
    /// Pass the merged allow/deny rules through as tool-list flags.
    ToolLists,
}

/// Program, final argument vector and environment for the wrapped tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub program: OsString,
    /// Arguments after the program name.
    pub args: Vec<OsString>,
    pub env: Vec<(OsString, OsString)>,
}

impl LaunchPlan {
    /// Shell-quoted rendering for logs.
    pub fn command_line(&self) -> String {
        let parts: Vec<String> = std::iter::once(&self.program)
            .chain(&self.args)
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        shlex::try_join(parts.iter().map(String::as_str)).unwrap_or_else(|_| parts.join(" "))
    }
}

/// A launch plan plus the ruling behind it, when the strategy consulted the engine.
#[derive(Debug)]
pub struct Prepared {
    pub plan: LaunchPlan,
    pub ruling: Option<Ruling>,
}

/// Work out the final argument vector for the configured strategy.
///
/// Injected flags go immediately after the program name, ahead of the
/// caller's arguments, which are passed through untouched.
pub fn prepare(
    config: &Config,
    policy: &PolicySet,
    args: Vec<OsString>,
    env: Vec<(OsString, OsString)>,
) -> Prepared {
    let wrapper = &config.wrapper;
    let text: Vec<String> = args
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    let ctx = InvocationContext::new(&text);
    let overridden = ctx.find_flag(&wrapper.override_flags).is_some();

    let (inject, ruling) = match wrapper.strategy {
        Strategy::AutoApprove => {
            let ruling = Engine::from_config(policy, config).evaluate(&text);
            let approve = ruling.verdict.is_approve() && !overridden;
            (approval_args(&wrapper.approval_flag, approve), Some(ruling))
        }
        Strategy::AlwaysApprove => (approval_args(&wrapper.approval_flag, !overridden), None),
        Strategy::ToolLists => (
            tool_list_args(
                &ctx,
                policy,
                &wrapper.allowed_tools_flag,
                &wrapper.disallowed_tools_flag,
            ),
            None,
        ),
    };

    let mut final_args: Vec<OsString> = inject.into_iter().map(OsString::from).collect();
    final_args.extend(args);

    Prepared {
        plan: LaunchPlan {
            program: OsString::from(&wrapper.program),
            args: final_args,
            env,
        },
        ruling,
    }
}

fn approval_args(flag: &str, approve: bool) -> Vec<String> {
    if approve && !flag.is_empty() {
        vec![flag.to_string()]
    } else {
        Vec::new()
    }
}

/// `<flag> <rules joined by space>` for each non-empty list the caller has not
/// already supplied (prefix match, so `--allowedTools=...` counts).
fn tool_list_args(
    ctx: &InvocationContext,
    policy: &PolicySet,
    allowed_flag: &str,
    disallowed_flag: &str,
) -> Vec<String> {
    let mut out = Vec::new();
    for (flag, rules) in [(allowed_flag, policy.allow()), (disallowed_flag, policy.deny())] {
        if flag.is_empty() || rules.is_empty() || ctx.has_flag_prefix(flag) {
            continue;
        }
        out.push(flag.to_string());
        out.push(rules.join(" "));
    }
    out
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("failed to execute {}: {source}", program.to_string_lossy())]
    Exec {
        program: OsString,
        #[source]
        source: io::Error,
    },
}

/// Capability that transfers control to the wrapped tool.
pub trait Launcher {
    /// Carry out the plan. Process-replacing launchers only return on failure.
    fn launch(&self, plan: &LaunchPlan) -> Result<(), LaunchError>;
}

/// Replaces the current process with the wrapped tool.
///
/// On non-Unix targets the tool runs as a child and this process exits with
/// its status.
pub struct ExecLauncher;

impl Launcher for ExecLauncher {
    fn launch(&self, plan: &LaunchPlan) -> Result<(), LaunchError> {
        let mut cmd = std::process::Command::new(&plan.program);
        cmd.args(&plan.args).env_clear().envs(plan.env.clone());
        exec(cmd).map_err(|source| LaunchError::Exec {
            program: plan.program.clone(),
            source,
        })
    }
}

#[cfg(unix)]
fn exec(mut cmd: std::process::Command) -> io::Result<()> {
    use std::os::unix::process::CommandExt;
    Err(cmd.exec())
}

#[cfg(not(unix))]
fn exec(mut cmd: std::process::Command) -> io::Result<()> {
    let status = cmd.status()?;
    std::process::exit(status.code().unwrap_or(1));
}

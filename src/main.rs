//! cc-permgate: installed in place of `claude`.
//!
//! Every argument is forwarded to the wrapped tool; the wrapper has no flags
//! of its own. Configuration comes from `$CC_PERMGATE_CONFIG` or
//! `~/.config/cc-permgate/config.toml`.

use std::ffi::OsString;

use cc_permgate::config::Config;
use cc_permgate::launch::ExecLauncher;

fn main() {
    let config = Config::load();
    cc_permgate::logging::init(&config.logging);

    let args: Vec<OsString> = std::env::args_os().skip(1).collect();
    log::debug!("invoked with {args:?}");
    let env: Vec<(OsString, OsString)> = std::env::vars_os().collect();

    if let Err(e) = cc_permgate::run(&config, args, env, &ExecLauncher) {
        eprintln!("cc-permgate: {e}");
        std::process::exit(127);
    }
}

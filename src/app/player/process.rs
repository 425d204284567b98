use std::io;
use std::process::{Command as ProcessCommand, ExitStatus, Stdio};

use anyhow::{Result, anyhow};
use tracing::debug;

use crate::config::PlayerConfig;

#[cfg(unix)]
use std::os::unix::process::CommandExt;

/// Turns a spawn/wait failure into a message about the configured player.
pub(super) fn player_io_error(command: &str, err: io::Error) -> anyhow::Error {
    if err.kind() == io::ErrorKind::NotFound {
        anyhow!(
            "player `{command}` not found; install it or set `command` under [player] in the config"
        )
    } else {
        anyhow!("player `{command}` could not be started: {err}")
    }
}

fn player_command(config: &PlayerConfig) -> ProcessCommand {
    let mut cmd = ProcessCommand::new(&config.command);
    cmd.args(&config.args)
        .arg(&config.sample_url)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    cmd
}

/// Restores one signal disposition when dropped.
#[cfg(unix)]
struct IgnoredSignal {
    signum: libc::c_int,
    previous: libc::sigaction,
}

#[cfg(unix)]
impl IgnoredSignal {
    fn new(signum: libc::c_int) -> Result<Self> {
        // SAFETY: both sigaction structs are zero-initialised locals and
        // `signum` is one of the libc constants used below.
        unsafe {
            let mut ignore: libc::sigaction = std::mem::zeroed();
            ignore.sa_sigaction = libc::SIG_IGN;
            libc::sigemptyset(&mut ignore.sa_mask);

            let mut previous: libc::sigaction = std::mem::zeroed();
            if libc::sigaction(signum, &ignore, &mut previous) != 0 {
                return Err(anyhow!(
                    "could not ignore signal {signum} while the player runs: {}",
                    io::Error::last_os_error()
                ));
            }
            Ok(Self { signum, previous })
        }
    }
}

#[cfg(unix)]
impl Drop for IgnoredSignal {
    fn drop(&mut self) {
        // SAFETY: restores the action saved in `new`.
        unsafe {
            let _ = libc::sigaction(self.signum, &self.previous, std::ptr::null_mut());
        }
    }
}

/// Terminal ownership while the player holds it. Dropping hands the
/// controlling terminal back to the browser's process group.
#[cfg(unix)]
struct TerminalLease {
    tty_fd: libc::c_int,
    owner_pgrp: libc::pid_t,
    leased: bool,
}

#[cfg(unix)]
impl TerminalLease {
    /// `None` when stdin is not a terminal (piped runs, tests).
    fn current() -> Option<Self> {
        let tty_fd = libc::STDIN_FILENO;
        // SAFETY: plain query on a file descriptor we do not own.
        let owner_pgrp = unsafe { libc::tcgetpgrp(tty_fd) };
        (owner_pgrp != -1).then_some(Self {
            tty_fd,
            owner_pgrp,
            leased: false,
        })
    }

    fn lend_to(&mut self, child_pgid: libc::pid_t) {
        // SAFETY: SIGTTOU is ignored by the caller, so this cannot stop us.
        self.leased = unsafe { libc::tcsetpgrp(self.tty_fd, child_pgid) == 0 };
        if !self.leased {
            debug!(child_pgid, "player did not get the foreground terminal");
        }
    }
}

#[cfg(unix)]
impl Drop for TerminalLease {
    fn drop(&mut self) {
        if self.leased {
            // SAFETY: returns the terminal to the group that owned it before.
            unsafe {
                let _ = libc::tcsetpgrp(self.tty_fd, self.owner_pgrp);
            }
        }
    }
}

/// Runs the configured player to completion.
///
/// Ctrl-C is ignored here for the duration, so quitting the player does not
/// also end the browser. With a terminal on stdin the player runs in its own
/// process group as the foreground job.
#[cfg(unix)]
pub(super) fn run_player(config: &PlayerConfig) -> Result<ExitStatus> {
    let _sigint = IgnoredSignal::new(libc::SIGINT)?;
    let mut cmd = player_command(config);

    let Some(mut lease) = TerminalLease::current() else {
        return cmd
            .status()
            .map_err(|err| player_io_error(&config.command, err));
    };

    let _sigttou = IgnoredSignal::new(libc::SIGTTOU)?;
    // SAFETY: the hook only calls async-signal-safe functions.
    unsafe {
        cmd.pre_exec(|| {
            for signum in [libc::SIGINT, libc::SIGQUIT, libc::SIGTSTP] {
                libc::signal(signum, libc::SIG_DFL);
            }
            if libc::setpgid(0, 0) != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }

    let mut child = cmd
        .spawn()
        .map_err(|err| player_io_error(&config.command, err))?;
    lease.lend_to(child.id() as libc::pid_t);
    child
        .wait()
        .map_err(|err| anyhow!("waiting on player `{}` failed: {err}", config.command))
}

#[cfg(not(unix))]
pub(super) fn run_player(config: &PlayerConfig) -> Result<ExitStatus> {
    player_command(config)
        .status()
        .map_err(|err| player_io_error(&config.command, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_names_the_player_setting() {
        let err = player_io_error("mpv", io::Error::from(io::ErrorKind::NotFound));
        let msg = err.to_string();
        assert!(msg.contains("`mpv` not found"), "{msg}");
        assert!(msg.contains("[player]"), "{msg}");
    }

    #[test]
    fn other_spawn_failures_keep_the_os_reason() {
        let err = player_io_error(
            "mpv",
            io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        );
        assert_eq!(
            err.to_string(),
            "player `mpv` could not be started: permission denied"
        );
    }
}

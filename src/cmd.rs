// Copyright (C) 2026 by GiGa infosystems

//! See the documentation of [`cmd!`], a utility macro for running commands (in this case the
//! `npm` CLI).

use std::io;
use std::process::ExitStatus;
use std::string::FromUtf8Error;
use thiserror::Error;

/// A failure to run an external process, see [`cmd!`]
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to run `{command}`, returned status code {status}: {stderr}")]
    Status {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("`{command}` printed invalid UTF-8")]
    Utf8 {
        command: String,
        #[source]
        source: FromUtf8Error,
    },
}

/// Run an external process
///
/// # Usage
/// Example: `cmd!([npm view] [(name) versions "--json"] -> String)`, where all segments (`npm`,
/// `view`, `(name)`, `versions` and `"--json"`) can be either identifiers, which get stringified,
/// literals or expressions in parentheses. The first set of arguments is also used in error
/// reporting ("Failed to run `npm view`").
///
/// If there are no further arguments, the second set of brackets is omitted.
///
/// The output is selected by a return specifier:
/// * none: stdout is forwarded to stderr, a non-zero status code is an error
/// * `-> bool`: the status code is mapped to `true` for `0` and `false` otherwise
/// * `-> String`: the stdout output excluding a single trailing newline, a non-zero status code
///   is an error
/// * `-> Output`: the raw [`std::process::Output`] regardless of the status code, for tools that
///   print useful output while reporting a failure
///
/// It may also be run in another working directory using `in path` (after potential return
/// specifiers as explained above), where `path` is an expression of the type
/// `Option<impl AsRef<Path>>`, or a reference to such a type.
///
/// The whole invocation evaluates to a `Result<_, CommandError>`.
macro_rules! cmd {
    (@arg $ident:ident) => { stringify!($ident) };
    (@arg $literal:literal) => { $literal };
    (@arg ($expr:expr)) => { $expr };
    (@stdout -> String) => { std::process::Stdio::piped() };
    (@stdout -> Output) => { std::process::Stdio::piped() };
    (@stdout $(-> $ty:ident)?) => { std::io::stderr() };
    (@success $out:ident -> bool) => { true };
    (@success $out:ident -> Output) => { true };
    (@success $out:ident $(-> $ty:ident)?) => { $out.status.success() };
    (@out $out:ident $command:ident -> bool) => { $out.status.success() };
    (@out $out:ident $command:ident -> Output) => { $out };
    (@out $out:ident $command:ident -> String) => {{
        let mut out = $out.stdout;

        if out.last() == Some(&b'\n') {
            out.pop();
        }

        String::from_utf8(out).map_err(|source| $crate::cmd::CommandError::Utf8 {
            command: $command.clone(),
            source,
        })?
    }};
    (@out $out:ident $command:ident) => { () };
    ([$cmd0:tt $($cmd_args:tt)*] $([$($args:tt)*])? $(-> $ret:tt)? $(in $path:expr)?) => {
        (|| -> Result<_, $crate::cmd::CommandError> {
            let cmd0 = $crate::cmd::cmd!(@arg $cmd0);
            let cmd_args: [&str; _] = [$($crate::cmd::cmd!(@arg $cmd_args)),*];
            let command = format!("{} {}", cmd0, cmd_args.join(" "))
                .trim_end()
                .to_owned();

            let mut cmd = std::process::Command::new(cmd0);
            cmd.args(&cmd_args)
                $($(.arg($crate::cmd::cmd!(@arg $args)))*)?;

            $(
                if let Some(path) = $path {
                    cmd.current_dir(path);
                }
            )?

            cmd.stdout($crate::cmd::cmd!(@stdout $(-> $ret)?));
            cmd.stderr(std::process::Stdio::piped());

            tracing::debug!("Running `{command}`");

            let output = cmd
                .spawn()
                .and_then(|child| child.wait_with_output())
                .map_err(|source| $crate::cmd::CommandError::Spawn {
                    command: command.clone(),
                    source,
                })?;

            if !$crate::cmd::cmd!(@success output $(-> $ret)?) {
                return Err($crate::cmd::CommandError::Status {
                    command,
                    status: output.status,
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
                });
            }

            Ok($crate::cmd::cmd!(@out output command $(-> $ret)?))
        })()
    };
}

pub(crate) use cmd;

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn captures_stdout_without_trailing_newline() {
        let out = cmd!([echo] ["hello"] -> String).unwrap();
        assert_eq!(out, "hello");
    }

    #[cfg(unix)]
    #[test]
    fn maps_status_to_bool() {
        assert!(cmd!([("true")] -> bool).unwrap());
        assert!(!cmd!([("false")] -> bool).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn failing_status_is_an_error() {
        let err = cmd!([sh "-c" "echo broken >&2; exit 3"] -> String).unwrap_err();
        assert!(matches!(
            err,
            CommandError::Status { ref command, ref stderr, .. }
                if command == "sh -c echo broken >&2; exit 3" && stderr == "broken"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn output_ignores_status() {
        let out = cmd!([sh "-c" "echo partial; exit 1"] -> Output).unwrap();
        assert!(!out.status.success());
        assert_eq!(out.stdout, b"partial\n");
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let err = cmd!([(concat!("update-gaps-", "missing-program"))] -> String).unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = Some(dir.path().to_owned());
        let out = cmd!([pwd] -> String in &path).unwrap();
        assert_eq!(
            std::fs::canonicalize(out).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }
}

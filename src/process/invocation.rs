//! # Invocation shapes.
//!
//! A worker's executable is started in one of two shapes:
//!
//! ```text
//! app-path = /srv/api/server       → Direct      { program: /srv/api/server, args: [params..] }
//! app-path = /srv/bootstrap.sh     → Interpreted { program: sh, args: [/srv/bootstrap.sh, params..] }
//! app-path = C:\tools\setup.ps1    → Interpreted { program: powershell.exe, args: [-File, setup.ps1, params..] }
//! ```
//!
//! Direct invocations are long-running services and are not awaited. Interpreted
//! invocations are one-shot setup steps; the launcher waits for them to exit.

use std::path::{Path, PathBuf};

/// How a worker's executable is turned into an OS command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    /// The path is executed directly with the worker's arguments.
    Direct { program: PathBuf, args: Vec<String> },
    /// A script interpreter runs the path; the launcher blocks until it exits.
    Interpreted { program: String, args: Vec<String> },
}

impl Invocation {
    /// Resolves the invocation shape for `path` from its extension.
    ///
    /// `params` is the raw argument string from configuration; it is split
    /// into argv with [`split_params`].
    pub fn resolve(path: &Path, params: Option<&str>) -> Self {
        let params = params.map(split_params).unwrap_or_default();

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref().and_then(interpreter_for) {
            Some((program, prefix)) => {
                let mut args: Vec<String> = prefix.iter().map(|s| (*s).to_string()).collect();
                args.push(path.to_string_lossy().into_owned());
                args.extend(params);
                Invocation::Interpreted {
                    program: program.to_string(),
                    args,
                }
            }
            None => Invocation::Direct {
                program: path.to_path_buf(),
                args: params,
            },
        }
    }

    /// Program that is actually spawned (the interpreter for scripts).
    pub fn program(&self) -> String {
        match self {
            Invocation::Direct { program, .. } => program.to_string_lossy().into_owned(),
            Invocation::Interpreted { program, .. } => program.clone(),
        }
    }

    pub fn args(&self) -> &[String] {
        match self {
            Invocation::Direct { args, .. } | Invocation::Interpreted { args, .. } => args,
        }
    }

    #[inline]
    pub fn is_interpreted(&self) -> bool {
        matches!(self, Invocation::Interpreted { .. })
    }
}

/// Maps a lowercase script extension to `(interpreter, leading args)`.
fn interpreter_for(ext: &str) -> Option<(&'static str, &'static [&'static str])> {
    match ext {
        "sh" => Some(("sh", &[])),
        "bash" => Some(("bash", &[])),
        #[cfg(windows)]
        "ps1" => Some(("powershell.exe", &["-NoProfile", "-File"])),
        #[cfg(not(windows))]
        "ps1" => Some(("pwsh", &["-NoProfile", "-File"])),
        #[cfg(windows)]
        "cmd" | "bat" => Some(("cmd.exe", &["/C"])),
        _ => None,
    }
}

/// Splits a raw argument string into argv.
///
/// Whitespace separates arguments; single and double quotes group text
/// (quotes themselves are dropped). No escapes, no expansion. An unterminated
/// quote runs to the end of the input.
pub fn split_params(raw: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in raw.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => cur.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    out.push(std::mem::take(&mut cur));
                    in_token = false;
                }
            }
            None => {
                cur.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        out.push(cur);
    }
    out
}

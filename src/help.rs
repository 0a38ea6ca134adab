//! Help text rendering for builds and tasks

use crate::runner::{Meta, RegisteredTask};
use std::fmt::Write;

/// Render help for a whole build.
///
/// `tasks` holds name and usage pairs, `flags` one preformatted line per
/// global option.
pub fn render_build_help(meta: &Meta, tasks: &[(String, String)], flags: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "NAME:\n   {} - {}\n", meta.name, meta.usage);
    let _ = writeln!(out, "USAGE:\n   {} [global options] {{task...}}\n", meta.name);
    let _ = write!(out, "VERSION:\n   {}\n", meta.version);

    if !meta.author.is_empty() || !meta.email.is_empty() {
        out.push_str("\nAUTHOR:\n");
        match (meta.author.is_empty(), meta.email.is_empty()) {
            (false, false) => {
                let _ = writeln!(out, "   {} - <{}>", meta.author, meta.email);
            }
            (false, true) => {
                let _ = writeln!(out, "   {}", meta.author);
            }
            _ => {
                let _ = writeln!(out, "   {}", meta.email);
            }
        }
    }

    if !meta.license.is_empty() {
        let _ = write!(out, "\nLICENSE:\n   {}\n", meta.license);
    }

    out.push_str("\nTASKS:\n");
    for (name, usage) in tasks {
        let _ = writeln!(out, "   {name:<15} {usage}");
    }

    if !flags.is_empty() {
        out.push_str("\nGLOBAL OPTIONS:\n");
        for flag in flags {
            let _ = writeln!(out, "   {flag}");
        }
    }
    out
}

/// Render help for a single task
pub fn render_task_help(task: &RegisteredTask, flags: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "TASK:\n   {} - {}", task.name(), task.usage());

    if let Some(description) = task.description().filter(|d| !d.is_empty()) {
        let _ = write!(out, "\nDESCRIPTION:\n   {description}\n");
    }

    if !task.deps().is_empty() {
        out.push_str("\nDEPENDENCIES:\n");
        for dep in task.deps() {
            let _ = writeln!(out, "   {dep}");
        }
    }

    if !flags.is_empty() {
        out.push_str("\nOPTIONS:\n");
        for flag in flags {
            let _ = writeln!(out, "   {flag}");
        }
    }
    out
}

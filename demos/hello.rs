//! A small build program.
//!
//! Run with `cargo run --example hello -- greet` or `-- --describe greet`.

use kargar::{cli, noop, Build, Meta, Task};
use std::process::ExitCode;
use std::time::Duration;

#[tokio::main]
async fn main() -> ExitCode {
    let build = Build::new().with_meta(Meta {
        usage: "Says hello, slowly".to_string(),
        version: kargar::VERSION.to_string(),
        ..Meta::default()
    });

    let added = build.add([
        Task::new("clock", "Waits a second, then tells the time").action(|ctx| async move {
            ctx.warn("I am pretty slow.");
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(1)) => {
                    ctx.info("Time is up");
                    Ok(())
                }
                err = ctx.done() => Err(err.into()),
            }
        }),
        Task::new("greet", "Prints a greeting")
            .description("Waits for the clock, then says hello.")
            .deps(["clock"])
            .action(|ctx| async move {
                ctx.info("Hello!");
                Ok(())
            }),
        Task::new("default", "Runs greet").deps(["greet"]).with_action(noop()),
    ]);

    if let Err(err) = added {
        cli::report(&err.into());
        return ExitCode::FAILURE;
    }

    match cli::run(build).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            cli::report(&err);
            ExitCode::FAILURE
        }
    }
}

//! Operator console: one command per line from any async reader
//! (stdin in the `grill` binary).

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use crate::controller::ControllerHandle;
use crate::kernel::action::VoiceCommand;

pub const HELP: &str = "Commands: 'd <doneness>', 'v <command|code>', 'status', 'reset', 'quit'";

/// Reads commands until `quit` or end of input. Only `quit` stops the
/// controller; closed input (stdin on /dev/null) leaves it running.
pub async fn run<R>(handle: &ControllerHandle, reader: R)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Console read failed: {}", e);
                break;
            }
        };
        match run_line(handle, line.trim()).await {
            Ok(true) => {}
            Ok(false) => {
                info!("Operator quit");
                handle.shutdown();
                return;
            }
            Err(e) => warn!("Console input rejected: {:#}", e),
        }
    }
    info!("Console input closed, controller keeps running");
}

/// Returns Ok(false) when the operator asked to quit.
pub async fn run_line(handle: &ControllerHandle, line: &str) -> Result<bool> {
    let (verb, arg) = match line.split_once(char::is_whitespace) {
        Some((verb, arg)) => (verb, arg.trim()),
        None => (line, ""),
    };

    match verb.to_lowercase().as_str() {
        "" => {}
        "d" | "doneness" => {
            let value: f32 = arg.parse().with_context(|| format!("bad doneness {:?}", arg))?;
            handle.send_doneness("console", value).await?;
        }
        "v" | "voice" => {
            let command: VoiceCommand = arg.parse()?;
            handle.send_voice("console", command).await?;
        }
        "status" => println!("{}", serde_json::to_string_pretty(&handle.status())?),
        "reset" => handle.reinitialize("console").await?,
        "quit" | "exit" => return Ok(false),
        _ => println!("{}", HELP),
    }
    Ok(true)
}

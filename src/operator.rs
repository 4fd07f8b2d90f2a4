/// Interactive prompt loop: read a file name from stdin, arm it, block
/// until a client consumes it, repeat.
use crate::handoff::{Consumed, Handoff};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Append `extension` unless the name already ends with it.
pub fn ensure_extension(name: &str, extension: &str) -> String {
    if name.ends_with(extension) {
        name.to_string()
    } else {
        format!("{name}{extension}")
    }
}

/// Run the prompt loop against stdin until it is closed or unreadable.
pub async fn run(handoff: Arc<Handoff>, consumed: Consumed, extension: &str) {
    let input = BufReader::new(tokio::io::stdin());
    run_with_input(input, handoff, consumed, extension).await;
}

async fn run_with_input<R>(input: R, handoff: Arc<Handoff>, mut consumed: Consumed, extension: &str)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        print!("Enter file name: ");
        let _ = std::io::stdout().flush();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::info!("control input closed, leaving the prompt loop");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to read control input");
                return;
            }
        };

        let name = line.trim();
        if name.is_empty() {
            continue;
        }

        let name = ensure_extension(name, extension);
        handoff.arm(name.clone());
        println!("Set file name to {name}");

        consumed.wait().await;
    }
}

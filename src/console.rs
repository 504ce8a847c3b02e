// ============================================================================
// L2.8: CONSOLE SUBSYSTEM
// Line-oriented prompts and notifications on the terminal.
// ============================================================================
use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

pub struct Console<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> Console<R> {
    pub fn new(reader: R) -> Self {
        Console {
            lines: reader.lines(),
        }
    }

    /// Next input line without its terminator; `None` at end of input.
    /// Cancel safe, so it can sit in a `select!`.
    pub async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let line = self.lines.next_line().await?;
        Ok(line.map(|l| l.trim_end_matches('\r').to_string()))
    }

    pub async fn ask(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        print!("{}", prompt);
        std::io::stdout().flush()?;
        self.read_line().await
    }

    /// Yes/no question; anything but `y`/`yes` is no.
    pub async fn confirm(&mut self, prompt: &str) -> std::io::Result<bool> {
        let answer = self.ask(&format!("{} [y/N]: ", prompt)).await?;
        Ok(matches!(
            answer.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref(),
            Some("y") | Some("yes")
        ))
    }

    /// Blocking notification: shown until the user presses Enter.
    pub async fn notify(&mut self, title: &str, message: &str) -> std::io::Result<()> {
        println!();
        println!("==== {} ====", title);
        for line in message.lines() {
            println!("  {}", line);
        }
        self.ask("(press Enter to continue) ").await?;
        Ok(())
    }
}

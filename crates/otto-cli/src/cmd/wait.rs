//! `otto wait <secs>`

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use crossterm::QueueableCommand;
use crossterm::cursor::MoveToColumn;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use otto_core::{Command, CommandError, Invocation};

const TICK: Duration = Duration::from_millis(100);
const TICKS_PER_SECOND: u32 = 10;

/// Count down a number of seconds on a single line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wait;

impl Command for Wait {
    fn name(&self) -> &str {
        "wait"
    }

    fn docs(&self) -> Option<&str> {
        Some("Pause for a number of seconds.")
    }

    fn run(&self, invocation: &mut Invocation<'_>, args: &[String]) -> Result<(), CommandError> {
        let [secs] = args else {
            return Err(invocation.usage("<secs>"));
        };
        if secs.is_empty() || !secs.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invocation.usage("<secs>"));
        }
        let secs: u64 = secs.parse().map_err(|_| invocation.usage("<secs>"))?;

        let mut stdout = io::stdout();
        for remaining in (1..=secs).rev() {
            stdout
                .queue(MoveToColumn(0))?
                .queue(Clear(ClearType::CurrentLine))?
                .queue(Print(remaining))?;
            stdout.flush()?;
            for _ in 0..TICKS_PER_SECOND {
                invocation.check_interrupt()?;
                thread::sleep(TICK);
            }
        }
        stdout
            .queue(MoveToColumn(0))?
            .queue(Clear(ClearType::CurrentLine))?;
        stdout.flush()?;
        Ok(())
    }
}

//! Line-oriented chat transport over stdin/stdout.
//!
//! Each input line is `<user_id> <username|-> <message text...>`. Replies are
//! written as `[<user_id>] <reply>`; non-command messages get no reply.

use std::io::{self, BufRead, Write};

use rand::Rng;
use tracing::{debug, warn};

use signalbot_core::{Clock, RecordStore, UserId};

use crate::dispatch::{Dispatcher, Sender};

/// Split an input line into sender and message text.
pub fn parse_line(line: &str) -> Option<(Sender<'_>, &str)> {
    let line = line.trim();
    let (id, rest) = line.split_once(char::is_whitespace)?;
    let rest = rest.trim_start();
    let (username, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let id: UserId = id.parse().ok()?;
    let username = (username != "-").then_some(username);
    Some((Sender { id, username }, text.trim()))
}

/// Serve messages from `input` until EOF. Returns the number of replies sent.
pub fn run<S, C, R, I, O>(
    dispatcher: &Dispatcher<'_, S, C, R>,
    input: I,
    mut output: O,
) -> io::Result<usize>
where
    S: RecordStore,
    C: Clock,
    R: Rng,
    I: BufRead,
    O: Write,
{
    let mut replies = 0;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let Some((sender, text)) = parse_line(&line) else {
            warn!(line = %line, "malformed chat line, expected '<user_id> <username> <text>'");
            continue;
        };
        match dispatcher.handle(&sender, text) {
            Some(reply) => {
                writeln!(output, "[{}] {}", sender.id, reply)?;
                output.flush()?;
                replies += 1;
            }
            None => debug!(user = %sender.id, "ignoring non-command message"),
        }
    }
    Ok(replies)
}

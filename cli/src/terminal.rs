//! Terminal rendering of the assistant panel.

#[cfg(test)]
#[path = "terminal_test.rs"]
mod terminal_test;

use devwell_assistant::state::messages::{MessageOrigin, RenderedMessage};
use devwell_assistant::widget::Surface;
use tokio::sync::mpsc::UnboundedSender;

/// Prints messages to stdout and signals each bot reply on `replies`.
pub struct TerminalSurface {
    replies: UnboundedSender<()>,
    echo_user: bool,
}

impl TerminalSurface {
    /// `echo_user` prints the user's own messages back; the REPL leaves it
    /// off since the text is already on screen.
    pub fn new(replies: UnboundedSender<()>, echo_user: bool) -> Self {
        Self { replies, echo_user }
    }
}

impl Surface for TerminalSurface {
    fn set_open(&self, open: bool) {
        println!("{}", panel_banner(open));
    }

    fn append_message(&self, message: RenderedMessage) {
        match message.origin {
            MessageOrigin::User => {
                if self.echo_user {
                    println!("{}", prefixed("you", &message.text));
                }
            }
            MessageOrigin::Bot => {
                println!("{}", prefixed("assistant", &message.text));
                if self.replies.send(()).is_err() {
                    tracing::debug!("reply listener gone");
                }
            }
        }
    }

    fn clear_input(&self) {}
}

fn panel_banner(open: bool) -> &'static str {
    if open { "-- assistant opened --" } else { "-- assistant closed --" }
}

fn prefixed(who: &str, text: &str) -> String {
    text.lines()
        .enumerate()
        .map(|(i, line)| if i == 0 { format!("{who}> {line}") } else { format!("{}  {line}", " ".repeat(who.len())) })
        .collect::<Vec<_>>()
        .join("\n")
}

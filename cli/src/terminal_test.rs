use super::*;

use devwell_assistant::format::MarkupPolicy;
use devwell_assistant::state::messages::Message;
use tokio::sync::mpsc;

#[test]
fn prefixed_indents_continuation_lines() {
    assert_eq!(prefixed("you", "a\nb"), "you> a\n     b");
}

#[test]
fn banner_reflects_panel_state() {
    assert_eq!(panel_banner(true), "-- assistant opened --");
    assert_eq!(panel_banner(false), "-- assistant closed --");
}

#[test]
fn bot_message_signals_reply() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let surface = TerminalSurface::new(tx, false);
    surface.append_message(Message::user("hi").render(MarkupPolicy::Trusted));
    assert!(rx.try_recv().is_err());
    surface.append_message(Message::bot("hello").render(MarkupPolicy::Trusted));
    assert!(rx.try_recv().is_ok());
}

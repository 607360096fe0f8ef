use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Terminal events
#[derive(Clone, Debug)]
pub enum Event {
    /// Periodic tick (drives the loading indicator)
    Tick,
    /// Key press event
    Key(KeyEvent),
    /// Terminal resize
    Resize(u16, u16),
    /// Error reading terminal input
    Error(String),
}

/// Event handler managing terminal input
pub struct EventHandler {
    /// Event receiver
    receiver: mpsc::UnboundedReceiver<Event>,
    /// Cancellation token for graceful shutdown
    cancel: CancellationToken,
}

impl EventHandler {
    /// Start reading terminal input, emitting a tick every `tick_rate`
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        tokio::spawn(read_terminal_events(sender, cancel.clone(), tick_rate));

        Self { receiver, cancel }
    }

    /// Receive the next event
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Shutdown the event handler
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

async fn read_terminal_events(
    sender: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
    tick_rate: Duration,
) {
    let mut reader = EventStream::new();
    let mut tick_interval = tokio::time::interval(tick_rate);

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tick_interval.tick() => Event::Tick,
            maybe_event = reader.next().fuse() => match maybe_event {
                // Filter out release events (important for Windows)
                Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                    Event::Key(key)
                }
                Some(Ok(CrosstermEvent::Resize(w, h))) => Event::Resize(w, h),
                Some(Ok(_)) => continue,
                Some(Err(e)) => Event::Error(e.to_string()),
                None => break,
            },
        };

        if sender.send(event).is_err() {
            break;
        }
    }
}

//! Background classification handoff: one detached thread per picked
//! image, result posted back to the UI thread over a channel.

use classifier_core::{ClassifierProvider, classify_to_label};
use crossbeam_channel::Sender;
use image::DynamicImage;
use std::thread::{self, JoinHandle};

/// Spawn one best-effort classification for `image`. The finished label
/// goes out over `tx`; `notify` runs afterwards so the UI can request a
/// repaint. If the receiver is gone the result is dropped silently.
pub fn spawn_classification<P>(
    provider: P,
    image: DynamicImage,
    tx: Sender<String>,
    notify: impl Fn() + Send + 'static,
) -> JoinHandle<()>
where
    P: ClassifierProvider + Send + 'static,
{
    thread::spawn(move || {
        let label = classify_to_label(&provider, &image);
        if tx.send(label).is_ok() {
            notify();
        }
    })
}

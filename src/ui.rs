//! Terminal front end for concurrent installations.
//!
//! One cooperative loop reads every installation's progress channel plus a
//! redraw tick and mirrors them onto indicatif bars.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::debug;

use crate::error::GpmError;
use crate::install::{InstallHandle, Installed};
use crate::progress::{ProgressEvent, ProgressReceiver};
use crate::reference::Reference;

const TICK: Duration = Duration::from_millis(120);

/// What the front end knows about one transfer.
#[derive(Debug, Clone, Default)]
pub struct DownloadState {
    pub total: Option<u64>,
    pub current: u64,
    pub finished: bool,
    pub error: Option<Arc<GpmError>>,
}

impl DownloadState {
    pub fn apply(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::TotalSize(total) => self.total = Some(*total),
            ProgressEvent::CurrentSize(current) => self.current = *current,
            // running total arrives as CurrentSize
            ProgressEvent::BytesRead(_) => {}
            ProgressEvent::Completed => self.finished = true,
            ProgressEvent::Failed(e) => {
                self.finished = true;
                self.error = Some(Arc::clone(e));
            }
        }
    }
}

/// Outcome of one reference, in the order the references were given.
pub struct Outcome {
    pub reference: Reference,
    pub result: anyhow::Result<Installed>,
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} {prefix:30!} [{bar:30.cyan/blue}] {bytes}/{total_bytes} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-")
}

fn render(bar: &ProgressBar, state: &DownloadState) {
    if let Some(total) = state.total {
        bar.set_length(total);
    }
    bar.set_position(state.current);
    if state.finished {
        match &state.error {
            None => bar.finish_with_message("done"),
            Some(_) => bar.abandon_with_message("failed"),
        }
    }
}

pub struct ProgressView {
    multi: MultiProgress,
}

impl ProgressView {
    /// Bars on stderr. indicatif hides them when stderr is not a terminal.
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
        }
    }

    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        }
    }

    /// Drive every installation to completion, then collect their outcomes.
    pub async fn run(&self, handles: Vec<InstallHandle>) -> Vec<Outcome> {
        let mut references = Vec::with_capacity(handles.len());
        let mut receivers: Vec<ProgressReceiver> = Vec::with_capacity(handles.len());
        let mut tasks = Vec::with_capacity(handles.len());
        for handle in handles {
            references.push(handle.reference);
            receivers.push(handle.progress);
            tasks.push(handle.task);
        }

        let bars: Vec<ProgressBar> = references
            .iter()
            .map(|reference| {
                let bar = self.multi.add(ProgressBar::new(0));
                bar.set_style(bar_style());
                bar.set_prefix(reference.to_string());
                bar
            })
            .collect();
        let mut states = vec![DownloadState::default(); bars.len()];

        let streams = receivers.into_iter().enumerate().map(|(i, rx)| {
            Box::pin(stream::unfold(rx, move |mut rx| async move {
                rx.recv().await.map(|event| ((i, event), rx))
            }))
        });
        let mut events = stream::select_all(streams);
        let mut tick = tokio::time::interval(TICK);

        loop {
            tokio::select! {
                next = events.next() => match next {
                    Some((i, event)) => {
                        states[i].apply(&event);
                        render(&bars[i], &states[i]);
                    }
                    None => break,
                },
                _ = tick.tick() => {
                    for (bar, state) in bars.iter().zip(&states) {
                        if !state.finished {
                            bar.tick();
                        }
                    }
                }
            }
        }
        debug!("All progress channels closed");

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (reference, task) in references.into_iter().zip(tasks) {
            let result = match task.await {
                Ok(Ok(installed)) => Ok(installed),
                Ok(Err(e)) => Err(anyhow::Error::new(e)),
                Err(e) => Err(anyhow::Error::new(e).context("installation task panicked")),
            };
            outcomes.push(Outcome { reference, result });
        }
        outcomes
    }
}

impl Default for ProgressView {
    fn default() -> Self {
        Self::new()
    }
}

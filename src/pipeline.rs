use std::sync::Arc;

use color_eyre::Result;
use tokio::{
    sync::mpsc::{self, Receiver, Sender},
    task::JoinHandle,
};

use crate::{error::GateError, gate::Gate};

pub fn stream(buffer_size: usize) -> (Sender<String>, Receiver<String>) {
    mpsc::channel(buffer_size.max(1))
}

/// Returns whether the message was delivered. Never waits on a processor that
/// is not running.
pub async fn send(gate: &Gate, message: String, stream: &Sender<String>) -> bool {
    let mut delivered = false;
    {
        let delivered = &mut delivered;
        let message = message.clone();
        gate.run_if_open_async(move || async move {
            match stream.send(message).await {
                Ok(()) => *delivered = true,
                Err(e) => log::warn!("processor stream is gone: {e}"),
            }
        })
        .await;
    }

    gate.run_if_closed(|| log::debug!("gate is closed, dropping {message:?}"))
        .await;

    delivered
}

pub struct Processor {
    handle: JoinHandle<Result<Vec<String>>>,
}

impl Processor {
    pub fn spawn(gate: Arc<Gate>, stream: Receiver<String>) -> Self {
        Self {
            handle: tokio::spawn(process(gate, stream)),
        }
    }

    pub async fn join(self) -> Result<Vec<String>> {
        self.handle.await?
    }
}

async fn process(gate: Arc<Gate>, mut stream: Receiver<String>) -> Result<Vec<String>> {
    let closed = gate.closed_channel();

    match gate.open() {
        Ok(()) => log::info!("processor ready, gate opened"),
        Err(GateError::Closed) => {
            log::warn!("gate was closed before the processor was ready");
            return Ok(vec![]);
        }
        Err(e) => return Err(e.into()),
    }

    let mut buffer = vec![];
    loop {
        tokio::select! {
            biased;
            Some(msg) = stream.recv() => buffer.push(msg),
            _ = closed.wait() => break,
        }
    }

    // every open-path send finished before the gate closed, so whatever is still
    // queued belongs to this run
    stream.close();
    while let Ok(msg) = stream.try_recv() {
        buffer.push(msg);
    }

    log::info!("processor stopped with {} messages", buffer.len());
    Ok(buffer)
}

use std::sync::Arc;

use color_eyre::Result;
use futures_util::future::join_all;

use crate::{
    config::Config,
    gate::Gate,
    pipeline::{self, send, Processor},
};

#[derive(Debug, Default)]
pub struct Report {
    pub delivered: Vec<String>,
    pub rejected: usize,
}

pub struct Instance {
    pub config: Config,
    pub gate: Arc<Gate>,

    pub shutdown_signal: tokio::sync::Notify,
}

impl Instance {
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let gate = Arc::new(Gate::new(config.gate.capacity()));
        Ok(Arc::new(Self {
            config,
            gate,
            shutdown_signal: Default::default(),
        }))
    }

    pub fn shutdown(&self) {
        self.shutdown_signal.notify_one();
    }

    pub async fn start(self: Arc<Self>) -> Result<Report> {
        let demo = self.config.demo();
        let mut report = Report::default();

        let (stream, receiver) = pipeline::stream(demo.buffer_size);

        // nobody is consuming yet, this must be dropped rather than block
        if !send(&self.gate, demo.rejected_message.clone(), &stream).await {
            report.rejected += 1;
        }

        let self_ref = self.clone();
        let watcher = tokio::spawn(async move {
            self_ref.shutdown_signal.notified().await;
            log::info!(
                "shutting down, closing gate with {} free tokens...",
                self_ref.gate.available()
            );
            if let Err(e) = self_ref.gate.close() {
                log::error!("{e}");
            }
        });

        let processor = Processor::spawn(self.gate.clone(), receiver);

        let closed = self.gate.closed_channel();
        tokio::select! {
            _ = self.gate.wait_opened() => log::info!("gate opened, starting {} producers", demo.producers),
            _ = closed.wait() => log::info!("gate closed before it opened"),
        }

        let producers = (0..demo.producers).map(|_| {
            let gate = self.gate.clone();
            let stream = stream.clone();
            let message = demo.message.clone();
            tokio::spawn(async move { send(&gate, message, &stream).await })
        });
        for delivered in join_all(producers).await {
            if !delivered? {
                report.rejected += 1;
            }
        }

        self.gate.close()?;
        self.gate.wait_closed().await;
        watcher.abort();

        if !send(&self.gate, demo.rejected_message.clone(), &stream).await {
            report.rejected += 1;
        }

        report.delivered = processor.join().await?;
        log::info!(
            "delivered {} messages, rejected {}",
            report.delivered.len(),
            report.rejected
        );

        Ok(report)
    }
}

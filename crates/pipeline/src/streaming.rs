use std::sync::Arc;

use conductor_domain::conversation::StreamElement;
use conductor_domain::error::{Error, Result};
use tokio::sync::mpsc;

use crate::builder::Pipeline;
use crate::stage::{attribute, StageContext};

/// A running streaming-mode pipeline: one coroutine per stage, connected
/// by bounded channels (§4.1, §5). Consume [`Self::output`] for elements
/// as they arrive; call [`Self::join`] once the producer side is done to
/// collect the first stage failure, if any.
pub struct StreamingPipelineHandle {
    output: mpsc::Receiver<StreamElement>,
    tasks: Vec<tokio::task::JoinHandle<Result<()>>>,
}

impl StreamingPipelineHandle {
    pub fn output(&mut self) -> &mut mpsc::Receiver<StreamElement> {
        &mut self.output
    }

    /// Waits for every stage coroutine to finish and returns the first
    /// error encountered, attributed to its stage. A panicked task is
    /// reported as [`Error::Other`].
    pub async fn join(self) -> Result<()> {
        for task in self.tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(e),
                Err(join_err) => return Err(Error::Other(format!("stage task panicked: {join_err}"))),
            }
        }
        Ok(())
    }
}

/// Starts a streaming run: `input` is fed into the first stage, and every
/// stage forwards its output to the next over a channel of depth
/// `channel_depth` (§5: default 1, deliberately tight to keep backpressure
/// real rather than letting a fast stage race ahead of a slow one).
pub fn run_streaming(pipeline: &Pipeline, input: Vec<StreamElement>, ctx: Arc<StageContext>, channel_depth: usize) -> StreamingPipelineHandle {
    let stages = pipeline.stages().to_vec();
    let depth = channel_depth.max(1);

    let mut senders = Vec::with_capacity(stages.len() + 1);
    let mut receivers = Vec::with_capacity(stages.len() + 1);
    for _ in 0..=stages.len() {
        let (tx, rx) = mpsc::channel::<StreamElement>(depth);
        senders.push(tx);
        receivers.push(Some(rx));
    }

    let mut tasks = Vec::with_capacity(stages.len() + 1);

    let feeder_tx = senders[0].clone();
    tasks.push(tokio::spawn(async move {
        for element in input {
            if feeder_tx.send(element).await.is_err() {
                return Err(Error::Cancelled);
            }
        }
        Ok(())
    }));

    for (i, stage) in stages.into_iter().enumerate() {
        let mut rx = receivers[i].take().expect("receiver taken exactly once");
        let tx = senders[i + 1].clone();
        let stage_ctx = ctx.clone();
        let name = stage.name().to_string();

        tasks.push(tokio::spawn(async move {
            while let Some(element) = rx.recv().await {
                stage_ctx.check_cancelled()?;
                stage
                    .stream_chunk(element, &stage_ctx, &tx)
                    .await
                    .map_err(|e| attribute(&name, e))?;
            }
            for output in stage.flush(&stage_ctx).await.map_err(|e| attribute(&name, e))? {
                if tx.send(output).await.is_err() {
                    return Err(Error::Cancelled);
                }
            }
            Ok(())
        }));
    }

    // Drop the pipeline-owned sender halves now that every stage task
    // holds its own clone; the chain closes naturally once producers finish.
    drop(senders);

    StreamingPipelineHandle {
        output: receivers.pop().flatten().expect("final receiver present"),
        tasks,
    }
}

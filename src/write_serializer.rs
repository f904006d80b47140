use crate::{SweepError, SweepResult};
use std::io::{self, Write};
use std::sync::mpsc;
use std::thread::JoinHandle;

/// Producer side of the write queue. Cheap to clone; never blocks on the
/// writer.
#[derive(Clone, Debug)]
pub struct WriteQueue {
    line_tx: mpsc::Sender<String>,
}

impl WriteQueue {
    /// Queues `line` for writing. A missing trailing newline is added by the
    /// writer. Fails only once the writer has stopped.
    pub fn enqueue(&self, line: impl Into<String>) -> SweepResult<()> {
        self.line_tx
            .send(line.into())
            .map_err(|_| SweepError::Output(io::Error::new(io::ErrorKind::BrokenPipe, "output writer has stopped")))
    }
}

/// Owns the output handle on a dedicated thread. Every queued line is
/// written and flushed before the next one is taken.
pub struct WriteSerializer<W> {
    queue: Option<WriteQueue>,
    thread_handle: Option<JoinHandle<SweepResult<W>>>,
}

impl<W> Drop for WriteSerializer<W> {
    fn drop(&mut self) {
        if self.thread_handle.is_some() && !std::thread::panicking() {
            panic!("you must call shutdown on WriteSerializer to drain it");
        }
    }
}

impl<W> WriteSerializer<W>
where
    W: Write + Send + 'static,
{
    pub fn start(mut writer: W) -> Self {
        let (line_tx, line_rx) = mpsc::channel::<String>();

        let thread_handle = std::thread::spawn(move || {
            tracing::trace!("WriteSerializer thread start");
            for line in line_rx {
                write_line(&mut writer, &line).map_err(|e| {
                    tracing::error!("failed to write '{}': {}", line.trim_end(), e);
                    SweepError::Output(e)
                })?;
                tracing::trace!("wrote '{}'", line.trim_end());
            }
            tracing::trace!("WriteSerializer thread end");
            Ok(writer)
        });

        WriteSerializer { queue: Some(WriteQueue { line_tx }), thread_handle: Some(thread_handle) }
    }

    pub fn queue(&self) -> WriteQueue {
        self.queue.clone().expect("queue is only taken by shutdown")
    }

    pub fn enqueue(&self, line: impl Into<String>) -> SweepResult<()> {
        self.queue.as_ref().expect("queue is only taken by shutdown").enqueue(line)
    }

    /// Closes this handle's side of the queue and blocks until the writer has
    /// drained every line queued through any [`WriteQueue`]. All clones of
    /// the queue must have been dropped, otherwise this waits for them.
    pub fn shutdown(mut self) -> SweepResult<W> {
        drop(self.queue.take());
        match self.thread_handle.take() {
            Some(handle) => handle.join().map_err(|_| SweepError::WorkerPanicked)?,
            None => unreachable!("shutdown consumes the serializer"),
        }
    }
}

fn write_line<W: Write>(writer: &mut W, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes())?;
    if !line.ends_with('\n') {
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

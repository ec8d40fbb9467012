//! Connection multiplexer.
//!
//! Turns many concurrent [`Multiplexer::submit`] calls into interleaved frames on one
//! connection and routes each response back to the caller waiting for it.
//!
//! # Overview
//!
//! Two threads run per connection:
//!
//! - the **dispatcher** owns the write half, the pending-call table and the correlation id
//!   counter. It is the only place any of them change. It waits on four event sources at
//!   once: new submissions, inbound frames, the earliest expiry deadline and the close
//!   signal.
//! - the **reader** owns the read half and forwards every frame it decodes to the dispatcher.
//!   End of stream or a read error ends it and tears the session down.
//!
//! Because expiries and responses for the same correlation id are both handled on the
//! dispatcher, whichever is processed first wins and removes the call; the other finds
//! nothing and is a no-op. Every submission receives exactly one [`Completion`].
//!
//! # Capacity
//!
//! Correlation ids are 16 bits wide and handed out round-robin. If the next id is still
//! owned by an in-flight call the new submission is rejected immediately with
//! [`MuxError::Overloaded`]; calls are never queued waiting for an id.
use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap},
    io::Read,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use log::{debug, info, trace, warn};
use parking_lot::Mutex;
use thiserror::Error;

use crate::{
    config::SessionConfig,
    transport::{Connection, TransportError, WriteHalf},
};

use super::frame::{Frame, FrameReader, FrameWriter};

/// Calls that may be in flight at once: one per correlation id.
pub const MAX_IN_FLIGHT: usize = 1 << 16;

/// Expiry entries tolerated beyond twice the pending count before the heap is compacted.
const EXPIRY_SLACK: usize = 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MuxError {
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
    #[error("too many calls in flight (limit {MAX_IN_FLIGHT})")]
    Overloaded,
    #[error("session closed: {0}")]
    Closed(String),
}

/// Terminal outcome of one submitted call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Completion {
    Reply(Vec<u8>),
    Expired,
    Rejected,
    Aborted(String),
}

pub(crate) struct Submission {
    payload: Vec<u8>,
    timeout: Duration,
    reply: Sender<Completion>,
}

enum Inbound {
    Frame(Frame),
    Closed(String),
}

struct PendingCall {
    /// Distinguishes this call from earlier owners of the same correlation id.
    dispatch: u64,
    timeout: Duration,
    reply: Sender<Completion>,
}

/// Single owner of the pending-call table and the socket's write side.
pub(crate) struct Dispatcher<W> {
    writer: FrameWriter<W>,
    pending: HashMap<u16, PendingCall>,
    expiries: BinaryHeap<Reverse<(Instant, u64, u16)>>,
    next_cid: u16,
    next_dispatch: u64,
    closed: Option<String>,
}

impl<W: WriteHalf> Dispatcher<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self {
            writer: FrameWriter::new(writer),
            pending: HashMap::new(),
            expiries: BinaryHeap::new(),
            next_cid: 0,
            next_dispatch: 0,
            closed: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.is_some()
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.expiries.peek().map(|Reverse((at, _, _))| *at)
    }

    /// Register a call under the next correlation id, write it and arm its expiry.
    pub(crate) fn admit(&mut self, submission: Submission, now: Instant) {
        let Submission {
            payload,
            timeout,
            reply,
        } = submission;

        if let Some(reason) = &self.closed {
            let _ = reply.send(Completion::Aborted(reason.clone()));
            return;
        }

        let cid = self.next_cid;
        if self.pending.contains_key(&cid) {
            warn!(
                "rejecting call: correlation id {cid} still in flight ({} pending)",
                self.pending.len()
            );
            let _ = reply.send(Completion::Rejected);
            return;
        }

        if let Err(e) = self.writer.write_frame(cid, &payload) {
            let reason = format!("write failed: {e}");
            let _ = reply.send(Completion::Aborted(reason.clone()));
            self.teardown(&reason);
            return;
        }

        let dispatch = self.next_dispatch;
        self.next_dispatch += 1;
        self.next_cid = cid.wrapping_add(1);
        match now.checked_add(timeout) {
            Some(deadline) => self.expiries.push(Reverse((deadline, dispatch, cid))),
            None => debug!("cid={cid} timeout {timeout:?} is beyond any deadline, not arming"),
        }
        self.pending.insert(
            cid,
            PendingCall {
                dispatch,
                timeout,
                reply,
            },
        );
        trace!("dispatched cid={cid} ({} in flight)", self.pending.len());
    }

    /// Hand a response to its caller; responses nobody waits for are dropped.
    pub(crate) fn complete(&mut self, frame: Frame) {
        let Frame {
            correlation_id,
            payload,
        } = frame;
        match self.pending.remove(&correlation_id) {
            Some(call) => {
                let _ = call.reply.send(Completion::Reply(payload));
                self.compact_expiries();
            }
            None => warn!("dropping response for unknown correlation id {correlation_id}"),
        }
    }

    /// Drop expiry entries of calls that were already answered.
    fn compact_expiries(&mut self) {
        if self.expiries.len() <= 2 * self.pending.len() + EXPIRY_SLACK {
            return;
        }
        let pending = &self.pending;
        self.expiries.retain(|Reverse((_, dispatch, cid))| {
            pending
                .get(cid)
                .is_some_and(|call| call.dispatch == *dispatch)
        });
        trace!("compacted expiry heap to {} entries", self.expiries.len());
    }

    /// Expire every call whose deadline is at or before `now`.
    pub(crate) fn expire_due(&mut self, now: Instant) {
        while let Some(Reverse((at, dispatch, cid))) = self.expiries.peek().copied() {
            if at > now {
                break;
            }
            self.expiries.pop();

            let owned = self
                .pending
                .get(&cid)
                .is_some_and(|call| call.dispatch == dispatch);
            if owned && let Some(call) = self.pending.remove(&cid) {
                warn!("call cid={cid} timed out after {:?}", call.timeout);
                let _ = call.reply.send(Completion::Expired);
            }
        }
    }

    /// Release every pending call and close the connection.
    pub(crate) fn teardown(&mut self, reason: &str) {
        if self.closed.is_some() {
            return;
        }
        debug!(
            "tearing down session ({reason}), aborting {} pending calls",
            self.pending.len()
        );
        self.closed = Some(reason.to_string());
        for (_, call) in self.pending.drain() {
            let _ = call.reply.send(Completion::Aborted(reason.to_string()));
        }
        self.expiries.clear();
        if let Err(e) = self.writer.get_mut().shutdown() {
            debug!("socket shutdown: {e}");
        }
    }

    fn close_reason(&self) -> String {
        self.closed
            .clone()
            .unwrap_or_else(|| "session closed".to_string())
    }
}

/// Marks the session closed when the dispatcher thread exits, by return or by panic.
struct ClosedOnExit(Arc<AtomicBool>);

impl Drop for ClosedOnExit {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Handle to a running multiplexer. Dropping it closes the session.
pub struct Multiplexer {
    submissions: Sender<Submission>,
    control: Sender<()>,
    closed: Arc<AtomicBool>,
    call_timeout: Duration,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Multiplexer {
    /// Start the dispatcher and reader threads over an authenticated connection.
    pub fn open<C: Connection>(conn: C, config: &SessionConfig) -> Result<Self, TransportError> {
        let (read_half, write_half) = conn.split()?;

        let (submissions_tx, submissions_rx) = channel::bounded(config.request_queue);
        let (inbound_tx, inbound_rx) = channel::unbounded();
        let (control_tx, control_rx) = channel::bounded(1);
        let closed = Arc::new(AtomicBool::new(false));

        let reader = FrameReader::new(read_half, config.max_frame_bytes);
        let reader_handle = thread::Builder::new()
            .name("pundun-reader".into())
            .spawn(move || run_reader(reader, inbound_tx))?;

        let dispatcher = Dispatcher::new(write_half);
        let on_exit = ClosedOnExit(Arc::clone(&closed));
        let dispatcher_handle = thread::Builder::new()
            .name("pundun-dispatcher".into())
            .spawn(move || {
                let _on_exit = on_exit;
                run_dispatcher(dispatcher, submissions_rx, inbound_rx, control_rx);
            })?;

        Ok(Self {
            submissions: submissions_tx,
            control: control_tx,
            closed,
            call_timeout: config.call_timeout,
            threads: Mutex::new(vec![dispatcher_handle, reader_handle]),
        })
    }

    /// Send one envelope and block until its response, its expiry or teardown.
    pub fn submit(&self, payload: Vec<u8>) -> Result<Vec<u8>, MuxError> {
        self.submit_with_timeout(payload, self.call_timeout)
    }

    pub fn submit_with_timeout(
        &self,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, MuxError> {
        let (reply_tx, reply_rx) = channel::bounded(1);
        self.submissions
            .send(Submission {
                payload,
                timeout,
                reply: reply_tx,
            })
            .map_err(|_| MuxError::Closed("session is closed".into()))?;

        match reply_rx.recv() {
            Ok(Completion::Reply(bytes)) => Ok(bytes),
            Ok(Completion::Expired) => Err(MuxError::Timeout(timeout)),
            Ok(Completion::Rejected) => Err(MuxError::Overloaded),
            Ok(Completion::Aborted(reason)) => Err(MuxError::Closed(reason)),
            Err(_) => Err(MuxError::Closed(
                "session closed before the call completed".into(),
            )),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Signal teardown without waiting for the background threads.
    pub fn shutdown(&self) {
        // Full means a close is already queued; disconnected means the dispatcher is gone.
        if let Err(TrySendError::Disconnected(_)) = self.control.try_send(()) {
            trace!("shutdown requested after dispatcher exit");
        }
    }

    /// Tear the session down and wait for both background threads to finish.
    pub fn close(&self) {
        self.shutdown();
        let handles = std::mem::take(&mut *self.threads.lock());
        let current = thread::current().id();
        for handle in handles {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                warn!("multiplexer thread panicked");
            }
        }
    }
}

impl Drop for Multiplexer {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_dispatcher<W: WriteHalf>(
    mut dispatcher: Dispatcher<W>,
    submissions: Receiver<Submission>,
    inbound: Receiver<Inbound>,
    control: Receiver<()>,
) {
    loop {
        let timer = match dispatcher.next_deadline() {
            Some(at) => channel::at(at),
            None => channel::never(),
        };

        crossbeam::select! {
            recv(control) -> _ => {
                dispatcher.teardown("session closed by client");
            }
            recv(inbound) -> msg => match msg {
                Ok(Inbound::Frame(frame)) => dispatcher.complete(frame),
                Ok(Inbound::Closed(reason)) => dispatcher.teardown(&reason),
                Err(_) => dispatcher.teardown("reader stopped"),
            },
            recv(submissions) -> msg => match msg {
                Ok(submission) => dispatcher.admit(submission, Instant::now()),
                Err(_) => dispatcher.teardown("session dropped"),
            },
            recv(timer) -> _ => dispatcher.expire_due(Instant::now()),
        }

        if dispatcher.is_closed() {
            break;
        }
    }

    let reason = dispatcher.close_reason();
    for submission in submissions.try_iter() {
        let _ = submission.reply.send(Completion::Aborted(reason.clone()));
    }
    info!("session closed: {reason}");
}

fn run_reader<R: Read>(mut reader: FrameReader<R>, inbound: Sender<Inbound>) {
    loop {
        match reader.read_frame() {
            Ok(Some(frame)) => {
                if inbound.send(Inbound::Frame(frame)).is_err() {
                    break;
                }
            }
            Ok(None) => {
                debug!("connection closed by peer");
                let _ = inbound.send(Inbound::Closed("connection closed by server".into()));
                break;
            }
            Err(e) => {
                debug!("reader stopped: {e}");
                let _ = inbound.send(Inbound::Closed(format!("read failed: {e}")));
                break;
            }
        }
    }
}

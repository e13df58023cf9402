//! Multi-producer, single-consumer FIFO of pending requests.
//!
//! The consumer side ([`RequestQueue`]) belongs to a processor and is drained
//! on the processor's thread. Any number of [`Submitter`]s can be cloned off
//! it and moved to loader threads; pushes from all of them land in one FIFO.

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::request::{Request, RequestKind};

#[derive(Debug)]
pub struct RequestQueue {
    kind: RequestKind,
    sender: Sender<Box<dyn Request>>,
    receiver: Receiver<Box<dyn Request>>,
}

impl RequestQueue {
    pub fn new(kind: RequestKind) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            kind,
            sender,
            receiver,
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn push(&self, request: Box<dyn Request>) {
        // The queue holds its own sender, so the channel cannot be disconnected here.
        if self.sender.send(request).is_err() {
            unreachable!("request queue disconnected while its receiver is alive");
        }
    }

    /// Take the oldest request, if there is one.
    pub fn pop(&self) -> Option<Box<dyn Request>> {
        match self.receiver.try_recv() {
            Ok(request) => Some(request),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn submitter(&self) -> Submitter {
        Submitter {
            kind: self.kind,
            sender: self.sender.clone(),
        }
    }
}

/// A cloneable handle that enqueues requests from any thread.
#[derive(Debug, Clone)]
pub struct Submitter {
    kind: RequestKind,
    sender: Sender<Box<dyn Request>>,
}

impl Submitter {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn enqueue(&self, request: impl Request + 'static) {
        self.enqueue_boxed(Some(Box::new(request)));
    }

    /// Enqueue an already boxed request. `None` is ignored.
    pub fn enqueue_boxed(&self, request: Option<Box<dyn Request>>) {
        let Some(request) = request else {
            return;
        };
        if let Err(e) = self.sender.send(request) {
            log::error!(
                "{:?} request '{}' submitted after its processor was dropped, discarding it",
                self.kind,
                e.0.label()
            );
        }
    }
}

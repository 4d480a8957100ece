// Copyright 2024 The Kubernetes Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Watch events and the stream that delivers them.

use crate::api::{Status, Unstructured};
use std::sync::mpsc::{Receiver, TryRecvError};

/// WatchEvent is one change observed by a watch.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    Added(Unstructured),
    Modified(Unstructured),
    Deleted(Unstructured),
    Error(Status),
}

impl WatchEvent {
    /// Returns the object the event carries, if any.
    pub fn object(&self) -> Option<&Unstructured> {
        match self {
            WatchEvent::Added(o) | WatchEvent::Modified(o) | WatchEvent::Deleted(o) => Some(o),
            WatchEvent::Error(_) => None,
        }
    }
}

/// WatchStream yields events until the producing storage stops it.
///
/// Iterating blocks until the next event arrives; the iterator ends once the producer is
/// gone.
#[derive(Debug)]
pub struct WatchStream {
    events: Receiver<WatchEvent>,
}

impl WatchStream {
    pub fn new(events: Receiver<WatchEvent>) -> Self {
        Self { events }
    }

    /// Returns the next event if one is already queued.
    pub fn try_next(&self) -> Option<WatchEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

impl Iterator for WatchStream {
    type Item = WatchEvent;

    fn next(&mut self) -> Option<WatchEvent> {
        self.events.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_stream_ends_when_producer_drops() {
        let (tx, rx) = channel();
        let stream = WatchStream::new(rx);
        assert!(stream.try_next().is_none());

        tx.send(WatchEvent::Added(Unstructured::default())).unwrap();
        drop(tx);

        let events: Vec<_> = stream.collect();
        assert_eq!(events.len(), 1);
        assert!(events[0].object().is_some());
    }
}

//! Collaborator seams for the host: tile rendering and entity spawning.
//! The generator only produces buffers and requests; what a host does with
//! them stays on the far side of these traits.

use crate::spawn::{SpawnQueue, SpawnRequest};
use crate::tiles::TileLayer;

pub trait TileSink {
    /// `values` is row-major, `width * height` long, holding `0` or `1`.
    fn consume_layer(
        &mut self,
        layer: TileLayer,
        width: usize,
        height: usize,
        values: &[i8],
        theme: &str,
    );
}

pub trait SpawnSink {
    fn spawn(&mut self, request: &SpawnRequest);
}

impl SpawnQueue {
    /// Hands every pending request to `sink` in queue order and empties the queue.
    pub fn drain_into(&mut self, sink: &mut dyn SpawnSink) -> usize {
        let mut delivered = 0;
        for request in self.drain() {
            sink.spawn(&request);
            delivered += 1;
        }
        delivered
    }
}

impl<F: FnMut(&SpawnRequest)> SpawnSink for F {
    fn spawn(&mut self, request: &SpawnRequest) {
        self(request);
    }
}

//! High-level audio engine API

use core::marker::PhantomData;
use core::sync::atomic::{AtomicUsize, Ordering};

use rtrb::{Consumer, RingBuffer};

use crate::config::EngineConfig;
use crate::error::Error;
use crate::graph::{AudioGraph, ConnectError, NodeHandle};
use crate::node::{AudioNode, NodeId, BLOCK_SIZE};
use crate::nodes::RingSink;

static NEXT_ENGINE_ID: AtomicUsize = AtomicUsize::new(0);

/// A handle for sending messages to a node in an [`Engine`].
///
/// Handles are returned when you add a node and provide two capabilities:
/// 1. **Connections** - Pass handles to [`Engine::connect`] or [`Engine::output`]
/// 2. **Messages** - Send parameter updates via [`Handle::send`]
///
/// # Example
///
/// ```
/// use klangwerk::{Engine, EngineConfig};
/// use klangwerk::dsp::Waveform;
/// use klangwerk::nodes::{Oscillator, OscillatorMessage};
///
/// let mut engine = Engine::new(EngineConfig::default()).unwrap();
/// let mut osc = engine.add(Oscillator::new(Waveform::Sine, 440.0, 44_100.0));
///
/// // Applied at the start of the next graph block
/// osc.send(OscillatorMessage::SetFrequency(880.0)).ok();
/// ```
///
/// # Message Delivery
///
/// Messages are buffered in a lock-free ring buffer and processed at the start
/// of each audio block. If the buffer is full, [`Handle::send`] returns `Err(msg)`
/// with the message that couldn't be sent.
pub struct Handle<M: Send + 'static> {
    node_id: NodeId,
    engine_id: usize,
    sender: rtrb::Producer<M>,
    _marker: PhantomData<M>,
}

impl<M: Send + 'static> Handle<M> {
    /// Send a message to the node.
    ///
    /// Lock-free and safe to call from any thread. Returns the message back
    /// if the node's queue is full.
    pub fn send(&mut self, msg: M) -> Result<(), M> {
        self.sender.push(msg).map_err(|rtrb::PushError::Full(m)| {
            tracing::debug!(node = self.node_id.0, "message queue full, dropping message");
            m
        })
    }

    /// Free slots in this node's message queue.
    pub fn capacity_left(&self) -> usize {
        self.sender.slots()
    }

    pub fn id(&self) -> NodeId {
        self.node_id
    }
}

/// The rendering context: owns a node graph, its parameter queues and the
/// output ring the host pulls from.
///
/// Every engine is independent; there is no process-wide state besides the
/// counter that tells engines apart.
///
/// # Building the Graph
///
/// 1. Add nodes with [`add`](Self::add) - returns a [`Handle`]
/// 2. Connect nodes with [`connect`](Self::connect)
/// 3. Route final node(s) to the output with [`output`](Self::output)
///
/// # Rendering
///
/// The host calls [`render`](Self::render) from its audio callback with an
/// interleaved buffer of any length. Internally the graph runs in
/// [`BLOCK_SIZE`]-frame blocks; the remainder of a block is kept for the next
/// call, so splitting a render into smaller calls yields the same samples.
///
/// ```
/// use klangwerk::{Engine, EngineConfig};
/// use klangwerk::dsp::{PanLaw, Waveform};
/// use klangwerk::nodes::{Oscillator, Panner};
///
/// let config = EngineConfig::default().with_block_size(256);
/// let mut engine = Engine::new(config).unwrap();
/// let osc = engine.add(Oscillator::new(Waveform::Sawtooth, 220.0, config.sample_rate));
/// let pan = engine.add(Panner::new(PanLaw::SineLaw).with_panning(-0.5));
/// engine.connect(&osc, &pan).unwrap();
/// engine.output(&pan).unwrap();
///
/// let mut block = vec![0.0; 256 * 2];
/// engine.render(&mut block);
/// assert!(block.iter().any(|s| *s != 0.0));
/// ```
pub struct Engine {
    id: usize,
    config: EngineConfig,
    graph: AudioGraph,
    sink: NodeId,
    output: Consumer<f32>,
    blocks_processed: u64,
}

impl Engine {
    /// Validate `config` and allocate everything rendering needs.
    pub fn new(config: EngineConfig) -> Result<Self, Error> {
        config.validate()?;

        let id = NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed);
        let chunk = config.block_size * config.channels;
        // One host chunk plus the partial graph block that may overhang it
        let capacity = chunk + BLOCK_SIZE * config.channels;
        let (producer, output) = RingBuffer::new(capacity);

        let mut graph = AudioGraph::new(config.sample_rate);
        let sink = graph.add(RingSink::new(producer, config.channels)).id;
        graph.set_terminal(sink);

        tracing::info!(
            engine = id,
            sample_rate = config.sample_rate,
            block_size = config.block_size,
            channels = config.channels,
            "engine created"
        );

        Ok(Self {
            id,
            config,
            graph,
            sink,
            output,
            blocks_processed: 0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.config.channels
    }

    /// Number of nodes, including the output sink.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Graph blocks processed so far.
    pub fn blocks_processed(&self) -> u64 {
        self.blocks_processed
    }

    /// Add a node to the graph.
    pub fn add<N: AudioNode>(&mut self, node: N) -> Handle<N::Message> {
        let handle = self.graph.add(node);
        self.wrap(handle)
    }

    /// Add a node with a custom message queue capacity.
    pub fn add_with_queue_size<N: AudioNode>(
        &mut self,
        node: N,
        queue_size: usize,
    ) -> Handle<N::Message> {
        let handle = self.graph.add_with_queue_size(node, queue_size);
        self.wrap(handle)
    }

    fn wrap<M: Send + 'static>(&self, handle: NodeHandle<M>) -> Handle<M> {
        tracing::debug!(
            engine = self.id,
            node = handle.id.0,
            kind = core::any::type_name::<M>(),
            "node added"
        );
        Handle {
            node_id: handle.id,
            engine_id: self.id,
            sender: handle.sender,
            _marker: PhantomData,
        }
    }

    /// Feed the output of `from` into `to`.
    ///
    /// Fails for handles from another engine and for edges that would form a
    /// cycle. The graph is unchanged on failure.
    pub fn connect<M1, M2>(&mut self, from: &Handle<M1>, to: &Handle<M2>) -> Result<(), Error>
    where
        M1: Send + 'static,
        M2: Send + 'static,
    {
        if from.engine_id != self.id || to.engine_id != self.id {
            return Err(Error::ForeignHandle);
        }
        self.link(from.node_id, to.node_id)
    }

    /// Route a node to the engine output.
    ///
    /// Several nodes may be routed; they are summed. Mono nodes feed every
    /// output channel.
    pub fn output<M: Send + 'static>(&mut self, node: &Handle<M>) -> Result<(), Error> {
        if node.engine_id != self.id {
            return Err(Error::ForeignHandle);
        }
        self.link(node.node_id, self.sink)
    }

    fn link(&mut self, from: NodeId, to: NodeId) -> Result<(), Error> {
        self.graph.connect(from, to).map_err(|e| {
            tracing::warn!(engine = self.id, from = from.0, to = to.0, ?e, "connection refused");
            match e {
                ConnectError::Cycle => Error::Cycle,
                ConnectError::UnknownNode => Error::ForeignHandle,
            }
        })
    }

    /// Fill an interleaved buffer with the next samples.
    ///
    /// Works in chunks of the configured block size so the output ring never
    /// has to hold more than one chunk and one graph block.
    pub fn render(&mut self, out: &mut [f32]) {
        let chunk_len = self.config.block_size * self.config.channels;
        for chunk in out.chunks_mut(chunk_len) {
            self.render_chunk(chunk);
        }
    }

    fn render_chunk(&mut self, chunk: &mut [f32]) {
        while self.output.slots() < chunk.len() {
            let before = self.output.slots();
            self.graph.process();
            self.blocks_processed += 1;
            if self.output.slots() == before {
                // Sink could not write; hand out what we have plus silence
                break;
            }
        }

        let ready = self.output.slots().min(chunk.len());
        let (filled, rest) = chunk.split_at_mut(ready);
        if let Ok(read) = self.output.read_chunk(ready) {
            let (a, b) = read.as_slices();
            filled[..a.len()].copy_from_slice(a);
            filled[a.len()..].copy_from_slice(b);
            read.commit_all();
        }
        rest.iter_mut().for_each(|s| *s = 0.0);
    }
}

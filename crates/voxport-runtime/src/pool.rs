use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};
use voxport_quad::Quad;

/// Lock-free pool of decode scratch vectors so a worker never shares its capture buffer.
pub struct ScratchPool {
    available_tx: Sender<Vec<Quad>>,
    available_rx: Receiver<Vec<Quad>>,
    allocated: AtomicUsize,
    max_buffers: usize,
}

impl ScratchPool {
    pub fn new(max_buffers: usize) -> Self {
        let max_buffers = max_buffers.max(1);
        let (tx, rx) = bounded(max_buffers);
        Self {
            available_tx: tx,
            available_rx: rx,
            allocated: AtomicUsize::new(0),
            max_buffers,
        }
    }

    /// Two buffers per worker, as with the engine's generation contexts.
    pub fn for_workers(workers: usize) -> Self {
        Self::new(workers.max(1) * 2)
    }

    /// Takes a cleared buffer, allocating while under capacity and blocking otherwise.
    pub fn acquire(&self) -> PooledScratch<'_> {
        if let Ok(buf) = self.available_rx.try_recv() {
            return PooledScratch::new(buf, self);
        }
        loop {
            let current = self.allocated.load(Ordering::Acquire);
            if current < self.max_buffers {
                let prev = self.allocated.fetch_add(1, Ordering::AcqRel);
                if prev < self.max_buffers {
                    return PooledScratch::new(Vec::new(), self);
                }
                self.allocated.fetch_sub(1, Ordering::AcqRel);
            }
            if let Ok(buf) = self.available_rx.recv() {
                return PooledScratch::new(buf, self);
            }
        }
    }

    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Acquire)
    }

    fn release(&self, mut buf: Vec<Quad>) {
        buf.clear();
        let _ = self.available_tx.send(buf);
    }
}

pub struct PooledScratch<'pool> {
    buf: Vec<Quad>,
    pool: &'pool ScratchPool,
}

impl<'pool> PooledScratch<'pool> {
    fn new(mut buf: Vec<Quad>, pool: &'pool ScratchPool) -> Self {
        buf.clear();
        Self { buf, pool }
    }
}

impl Deref for PooledScratch<'_> {
    type Target = Vec<Quad>;

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl DerefMut for PooledScratch<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}

impl Drop for PooledScratch<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}

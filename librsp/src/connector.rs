//! Sample sinks.

use std::sync::atomic::{AtomicU64, Ordering};

use flume::{Receiver, Sender, TrySendError};
use num_complex::Complex;

/// Consumer of baseband I/Q batches.
///
/// `propagate` is called on the driver's delivery thread with freshly copied
/// buffers of equal length. It must return promptly and must not call back
/// into the receiver.
pub trait Connector: Send + Sync {
    fn propagate(&self, i: Vec<i16>, q: Vec<i16>);
}

impl<F> Connector for F
where
    F: Fn(Vec<i16>, Vec<i16>) + Send + Sync,
{
    fn propagate(&self, i: Vec<i16>, q: Vec<i16>) {
        self(i, q)
    }
}

/// One batch of baseband samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IqBatch {
    pub i: Vec<i16>,
    pub q: Vec<i16>,
}

impl IqBatch {
    pub fn len(&self) -> usize {
        self.i.len()
    }

    pub fn is_empty(&self) -> bool {
        self.i.is_empty()
    }

    /// Pair up the two channels as complex samples.
    pub fn to_complex(&self) -> Vec<Complex<i16>> {
        self.i
            .iter()
            .zip(&self.q)
            .map(|(&re, &im)| Complex::new(re, im))
            .collect()
    }
}

/// Connector that forwards batches over a bounded channel.
///
/// Never blocks the delivery thread: when the channel is full or the
/// receiving side is gone the batch is counted and discarded.
pub struct ChannelConnector {
    tx: Sender<IqBatch>,
    dropped: AtomicU64,
}

impl ChannelConnector {
    pub fn bounded(capacity: usize) -> (Self, Receiver<IqBatch>) {
        let (tx, rx) = flume::bounded(capacity);
        let connector = ChannelConnector {
            tx,
            dropped: AtomicU64::new(0),
        };
        (connector, rx)
    }

    /// Batches discarded because the consumer fell behind or went away.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Connector for ChannelConnector {
    fn propagate(&self, i: Vec<i16>, q: Vec<i16>) {
        match self.tx.try_send(IqBatch { i, q }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn closures_are_connectors() {
        let seen = Mutex::new(Vec::new());
        let sink = |i: Vec<i16>, q: Vec<i16>| seen.lock().unwrap().push((i, q));
        sink.propagate(vec![1, 2], vec![3, 4]);
        assert_eq!(seen.into_inner().unwrap(), vec![(vec![1, 2], vec![3, 4])]);
    }

    #[test]
    fn channel_forwards_until_full() {
        let (conn, rx) = ChannelConnector::bounded(1);
        conn.propagate(vec![1], vec![-1]);
        conn.propagate(vec![2], vec![-2]);
        assert_eq!(conn.dropped(), 1);
        let batch = rx.try_recv().unwrap();
        assert_eq!(batch, IqBatch { i: vec![1], q: vec![-1] });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_counts_disconnected_consumer() {
        let (conn, rx) = ChannelConnector::bounded(4);
        drop(rx);
        conn.propagate(vec![0; 8], vec![0; 8]);
        assert_eq!(conn.dropped(), 1);
    }

    #[test]
    fn batch_to_complex() {
        let batch = IqBatch {
            i: vec![1, 2, 3],
            q: vec![-1, -2, -3],
        };
        let c = batch.to_complex();
        assert_eq!(batch.len(), 3);
        assert_eq!(c[1], Complex::new(2, -2));
    }
}

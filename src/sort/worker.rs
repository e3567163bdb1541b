//! Background thread that keeps the published draw order current.

use crate::core::GaussianCloud;
use crate::sort::{SharedOrder, SortStrategy, VisibilitySorter};
use nalgebra::Vector3;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

enum Request {
    Sort(Vector3<f32>),
    SetStrategy(SortStrategy),
    Shutdown,
}

/// Sorts on a dedicated thread and publishes into a [`SharedOrder`].
///
/// Requests that pile up while a sort is running are coalesced: only the
/// most recent camera position is sorted next. A running sort is never
/// interrupted.
pub struct SortWorker {
    tx: Sender<Request>,
    handle: Option<JoinHandle<()>>,
    output: SharedOrder,
}

impl SortWorker {
    pub fn spawn(cloud: Arc<GaussianCloud>, sorter: VisibilitySorter) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let output = SharedOrder::new();
        let publish_to = output.clone();

        let handle = thread::Builder::new()
            .name("splat-sort".to_string())
            .spawn(move || run(cloud, sorter, rx, publish_to))?;

        Ok(Self {
            tx,
            handle: Some(handle),
            output,
        })
    }

    /// Ask for an order for `camera_position`. Returns false if the worker
    /// thread is gone.
    pub fn request(&self, camera_position: Vector3<f32>) -> bool {
        self.tx.send(Request::Sort(camera_position)).is_ok()
    }

    /// Takes effect for the next sort.
    pub fn set_strategy(&self, strategy: SortStrategy) -> bool {
        self.tx.send(Request::SetStrategy(strategy)).is_ok()
    }

    pub fn output(&self) -> &SharedOrder {
        &self.output
    }

    /// Stop the thread after its current sort and wait for it.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.tx.send(Request::Shutdown);
            if handle.join().is_err() {
                tracing::error!("sort worker thread panicked");
            }
        }
    }
}

impl Drop for SortWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    cloud: Arc<GaussianCloud>,
    mut sorter: VisibilitySorter,
    rx: Receiver<Request>,
    output: SharedOrder,
) {
    tracing::debug!("sort worker started with {} Gaussians", cloud.len());

    while let Ok(first) = rx.recv() {
        let mut latest = None;
        let mut shutdown = false;
        let mut pending = Some(first);

        // Drain everything queued so far, keeping only the newest position.
        while let Some(request) = pending.take() {
            match request {
                Request::Sort(position) => latest = Some(position),
                Request::SetStrategy(strategy) => sorter.set_strategy(strategy),
                Request::Shutdown => shutdown = true,
            }
            pending = match rx.try_recv() {
                Ok(next) => Some(next),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => {
                    shutdown = true;
                    None
                }
            };
        }

        if let Some(position) = latest {
            let order = sorter.compute_order(cloud.as_slice(), &position);
            let generation = output.publish(order);
            tracing::trace!("published order generation {}", generation);
        }

        if shutdown {
            break;
        }
    }

    tracing::debug!("sort worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Gaussian;
    use crate::sort::{is_permutation, SortConfig};
    use nalgebra::Matrix3;
    use std::time::Duration;

    fn line_cloud(n: usize) -> Arc<GaussianCloud> {
        let gaussians = (0..n)
            .map(|i| {
                Gaussian::new(
                    Vector3::new(i as f32, 0.0, 0.0),
                    Vector3::new(0.5, 0.5, 0.5),
                    1.0,
                    Matrix3::identity(),
                )
            })
            .collect();
        Arc::new(GaussianCloud::from_gaussians(gaussians))
    }

    #[test]
    fn test_worker_publishes_order() {
        let cloud = line_cloud(8);
        let sorter = VisibilitySorter::for_cloud(&cloud, &SortConfig::default());
        let worker = SortWorker::spawn(cloud, sorter).unwrap();

        assert!(worker.request(Vector3::new(-1.0, 0.0, 0.0)));
        let snap = worker
            .output()
            .wait_for(1, Duration::from_secs(5))
            .expect("worker should publish");

        // Camera on the -x side: farthest is the last Gaussian.
        assert!(is_permutation(&snap.order, 8));
        assert_eq!(snap.order[0], 7);
        assert_eq!(snap.order[7], 0);
        worker.shutdown();
    }

    #[test]
    fn test_latest_request_wins() {
        let cloud = line_cloud(16);
        let sorter = VisibilitySorter::for_cloud(&cloud, &SortConfig::default());
        let worker = SortWorker::spawn(cloud, sorter).unwrap();

        assert!(worker.set_strategy(SortStrategy::Exact));
        for step in 0..20 {
            worker.request(Vector3::new(-1.0 - step as f32, 0.0, 0.0));
        }
        worker.request(Vector3::new(100.0, 0.0, 0.0));

        // Whatever was coalesced, the final published order is for x = 100.
        let output = worker.output().clone();
        worker.shutdown();
        let snap = output.snapshot();
        assert!(snap.generation >= 1);
        assert_eq!(snap.order[0], 0);
        assert_eq!(snap.order[15], 15);
    }
}

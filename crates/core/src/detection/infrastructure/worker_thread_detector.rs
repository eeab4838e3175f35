use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::detection::domain::parking_space_detector::ParkingSpaceDetector;
use crate::shared::detection::RawDetection;
use crate::shared::tile::Tile;

type SendError = Box<dyn std::error::Error + Send + Sync>;
type DetectResult = Result<Vec<RawDetection>, SendError>;

/// Decorator that runs the wrapped detector on a dedicated thread.
///
/// Each call hands one tile to the worker and blocks until its result comes
/// back, so tiles are still processed one at a time in order.
pub struct WorkerThreadDetector {
    request_tx: Option<Sender<(Tile, f64)>>,
    result_rx: Receiver<DetectResult>,
    handle: Option<JoinHandle<Box<dyn ParkingSpaceDetector>>>,
}

impl WorkerThreadDetector {
    pub fn spawn(detector: Box<dyn ParkingSpaceDetector>) -> Self {
        let (request_tx, request_rx) = crossbeam_channel::bounded::<(Tile, f64)>(1);
        let (result_tx, result_rx) = crossbeam_channel::bounded::<DetectResult>(1);
        let handle = spawn_worker(detector, request_rx, result_tx);
        Self {
            request_tx: Some(request_tx),
            result_rx,
            handle: Some(handle),
        }
    }

    /// Stops the worker and hands back the wrapped detector. `None` if the
    /// worker panicked.
    pub fn into_inner(mut self) -> Option<Box<dyn ParkingSpaceDetector>> {
        self.request_tx.take();
        self.handle.take().and_then(|h| h.join().ok())
    }
}

impl ParkingSpaceDetector for WorkerThreadDetector {
    fn detect(
        &mut self,
        tile: &Tile,
        confidence: f64,
    ) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>> {
        let request_tx = self
            .request_tx
            .as_ref()
            .ok_or("detector worker already stopped")?;
        request_tx
            .send((tile.clone(), confidence))
            .map_err(|_| "detector worker stopped unexpectedly")?;
        match self.result_rx.recv() {
            Ok(result) => result.map_err(|e| -> Box<dyn std::error::Error> { e.to_string().into() }),
            Err(_) => Err("detector worker stopped unexpectedly".into()),
        }
    }
}

impl Drop for WorkerThreadDetector {
    fn drop(&mut self) {
        self.request_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Detector worker thread panicked");
            }
        }
    }
}

fn spawn_worker(
    mut detector: Box<dyn ParkingSpaceDetector>,
    request_rx: Receiver<(Tile, f64)>,
    result_tx: Sender<DetectResult>,
) -> JoinHandle<Box<dyn ParkingSpaceDetector>> {
    std::thread::spawn(move || {
        for (tile, confidence) in request_rx {
            let result = detector
                .detect(&tile, confidence)
                .map_err(|e| -> SendError { e.to_string().into() });
            if result_tx.send(result).is_err() {
                break;
            }
        }
        detector
    })
}

use std::any::Any;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, TryRecvError};
use tracing::{debug, error};

use crate::config::RenderMethod;
use crate::error::{MapError, Result};
use crate::indexer::{LayerDescriptors, MapIndexer};
use crate::map::MapSource;
use crate::view::Viewport;

/// One-shot background indexing of a view. Cannot be cancelled once spawned.
#[derive(Debug)]
pub struct IndexingJob {
    viewport: Viewport,
    receiver: Receiver<Result<LayerDescriptors>>,
    handle: Option<JoinHandle<()>>,
}

impl IndexingJob {
    /// Start describing `viewport` of `source` on a fresh thread.
    pub fn spawn(
        source: Arc<MapSource>,
        viewport: Viewport,
        render_method: RenderMethod,
    ) -> Result<Self> {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let handle = thread::Builder::new()
            .name("tiled-indexer".into())
            .spawn(move || {
                let result = MapIndexer::new(&source, viewport, render_method).describe_view();
                // the builder may be gone already
                let _ = sender.send(result);
            })
            .map_err(|e| MapError::Background(format!("failed to spawn worker: {e}")))?;

        debug!(?viewport, "indexing job dispatched");
        Ok(IndexingJob {
            viewport,
            receiver,
            handle: Some(handle),
        })
    }

    /// Viewport this job covers.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The job's result if it has finished. Never blocks.
    pub fn try_take(&mut self) -> Option<Result<LayerDescriptors>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(self.crashed())),
        }
    }

    /// Block until the job finishes.
    pub fn wait(mut self) -> Result<LayerDescriptors> {
        match self.receiver.recv() {
            Ok(result) => result,
            Err(_) => Err(self.crashed()),
        }
    }

    fn crashed(&mut self) -> MapError {
        let reason = match self.handle.take().map(JoinHandle::join) {
            Some(Err(payload)) => panic_message(payload.as_ref()),
            _ => "worker exited without a result".to_owned(),
        };
        error!(viewport = ?self.viewport, %reason, "indexing job failed");
        MapError::Background(reason)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Layer;
    use crate::map::Orientation;
    use crate::tileset::Tileset;

    fn source(orientation: Orientation) -> Arc<MapSource> {
        Arc::new(MapSource {
            width: 3,
            height: 2,
            tile_width: 16,
            tile_height: 16,
            orientation,
            layers: vec![Layer::new("ground", 3, 2, vec![1, 0, 2, 0, 3, 0])],
            tilesets: vec![Tileset {
                image: "tiles.png".into(),
                tile_width: 16,
                tile_height: 16,
                margin: 0,
                first_gid: 1,
                image_width: 48,
                image_height: 16,
            }],
        })
    }

    #[test]
    fn background_result_matches_inline_indexing() {
        let src = source(Orientation::Orthogonal);
        let viewport = Viewport::full(&src);
        let expected = MapIndexer::new(&src, viewport, RenderMethod::Dom)
            .describe_view()
            .unwrap();

        let job = IndexingJob::spawn(src, viewport, RenderMethod::Dom).unwrap();
        assert_eq!(job.viewport(), viewport);
        assert_eq!(job.wait().unwrap(), expected);
    }

    #[test]
    fn worker_errors_come_back_through_the_channel() {
        let src = source(Orientation::Other("hexagonal".into()));
        let viewport = Viewport::full(&src);
        let mut job = IndexingJob::spawn(src, viewport, RenderMethod::Dom).unwrap();
        let result = loop {
            if let Some(result) = job.try_take() {
                break result;
            }
            thread::yield_now();
        };
        assert!(matches!(result, Err(MapError::UnsupportedOrientation(_))));
    }

    #[test]
    fn panic_payloads_become_messages() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bang")), "bang");
        assert_eq!(panic_message(&5u8), "worker panicked");
    }
}

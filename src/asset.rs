// asset.rs — 后台线程读取并解码全景图

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use image::io::Reader as ImageReader;
use image::{GenericImageView, RgbaImage};

use crate::catalog::SceneId;
use crate::error::AssetLoadError;

/// Decoded equirectangular image, shared with the renderer without copying.
pub type PanoramaImage = Arc<RgbaImage>;

/// One image acquisition, tagged with the loader generation that asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub generation: u64,
    pub scene: SceneId,
    pub image_ref: PathBuf,
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub generation: u64,
    pub scene: SceneId,
    pub result: Result<PanoramaImage, AssetLoadError>,
}

impl LoadRequest {
    pub fn complete(&self, result: Result<PanoramaImage, AssetLoadError>) -> LoadOutcome {
        LoadOutcome {
            generation: self.generation,
            scene: self.scene.clone(),
            result,
        }
    }
}

/// Starts an image acquisition; the outcome is delivered later, out of band.
pub trait AssetFetcher {
    fn fetch(&self, request: LoadRequest);
}

/// Decodes images on worker threads and posts outcomes to a channel that
/// the event loop drains between frames.
#[derive(Debug, Clone)]
pub struct ThreadedImageFetcher {
    root: PathBuf,
    tx: Sender<LoadOutcome>,
}

impl ThreadedImageFetcher {
    pub fn new(root: impl Into<PathBuf>) -> (Self, Receiver<LoadOutcome>) {
        let (tx, rx) = channel();
        (
            Self {
                root: root.into(),
                tx,
            },
            rx,
        )
    }
}

impl AssetFetcher for ThreadedImageFetcher {
    fn fetch(&self, request: LoadRequest) {
        let path = self.root.join(&request.image_ref);
        let tx = self.tx.clone();
        thread::spawn(move || {
            log::info!(
                "{}",
                crate::i18n::tr_with("log.loading_image_bg", &[("path", path.display().to_string())])
            );
            let result = decode_image(&path).map(Arc::new);
            if tx.send(request.complete(result)).is_err() {
                log::error!("{}", crate::i18n::tr("error.send_to_main_failed"));
            }
        });
    }
}

pub fn decode_image(path: &Path) -> Result<RgbaImage, AssetLoadError> {
    let file = File::open(path).map_err(|source| AssetLoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let img = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(image::ImageError::IoError)
        .and_then(|mut r| {
            r.no_limits();
            r.decode()
        })
        .map_err(|e| AssetLoadError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let (w, h) = img.dimensions();
    log::info!(
        "{}",
        crate::i18n::tr_with(
            "log.image_loaded_size",
            &[("w", w.to_string()), ("h", h.to_string())]
        )
    );
    Ok(img.to_rgba8())
}

use {
    image::RgbImage,
    std::path::Path,
    tracing::{info, warn},
};

/// Reference image of one marker type.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerTemplate {
    name: String,
    image: RgbImage,
}

impl MarkerTemplate {
    pub fn new(name: impl Into<String>, image: RgbImage) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Loads a marker template from an image file.
///
/// A missing, unreadable or empty image is reported once here and yields `None`;
/// such a marker simply never matches.
pub fn load_template(name: &str, path: &Path) -> Option<MarkerTemplate> {
    let image = match image::open(path) {
        Ok(image) => image.to_rgb8(),
        Err(err) => {
            warn!("marker {name:?}: failed to load template {path:?}: {err}");
            return None;
        }
    };
    if image.width() == 0 || image.height() == 0 {
        warn!("marker {name:?}: template {path:?} is empty");
        return None;
    }
    info!(
        "marker {name:?}: loaded {}x{} template from {path:?}",
        image.width(),
        image.height()
    );
    Some(MarkerTemplate::new(name, image))
}

//! Video records and the catalog they live in.
//!
//! The catalog is the concatenation of a fixed featured list and the custom
//! videos users submit by URL. Custom entries are upserted by id and live
//! only as long as the process.

use std::time::{SystemTime, UNIX_EPOCH};

use url::Url;

/// A single playable video.
#[derive(Debug, Clone)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub src: Url,
    pub thumbnail: String,
    /// Seconds; 0 until the element reports real metadata.
    pub duration: f64,
    /// Display-only viewer count.
    pub viewers: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid video URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Featured videos plus user-submitted customs.
pub struct Catalog {
    featured: Vec<Video>,
    custom: Vec<Video>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            featured: featured_content(),
            custom: Vec::new(),
        }
    }

    /// Look up a video by id across featured and custom entries.
    pub fn by_id(&self, id: &str) -> Option<&Video> {
        self.featured
            .iter()
            .chain(self.custom.iter())
            .find(|video| video.id == id)
    }

    /// Snapshot of every video, featured first.
    pub fn all(&self) -> Vec<Video> {
        self.featured
            .iter()
            .chain(self.custom.iter())
            .cloned()
            .collect()
    }

    pub fn first_featured(&self) -> Option<&Video> {
        self.featured.first()
    }

    /// Insert a custom video, replacing any existing entry with the same id.
    pub fn upsert_custom(&mut self, video: Video) {
        match self.custom.iter_mut().find(|v| v.id == video.id) {
            Some(existing) => *existing = video,
            None => self.custom.push(video),
        }
    }

    /// Validate a user-submitted URL and add it as a custom video.
    ///
    /// Rejection is synchronous; nothing changes on a malformed URL.
    pub fn add_custom_url(&mut self, raw: &str) -> Result<Video, CatalogError> {
        let src = Url::parse(raw.trim())?;
        let video = Video {
            id: format!("custom-{}", now_ms()),
            title: "Custom Video".to_string(),
            description: "User-provided video".to_string(),
            src,
            thumbnail: "/placeholder.svg".to_string(),
            duration: 0.0,
            viewers: 1,
        };
        self.upsert_custom(video.clone());
        log::info!("Custom video added: id={}, src={}", video.id, video.src);
        Ok(video)
    }

    /// Record the real duration once metadata is known.
    pub fn set_duration(&mut self, id: &str, duration: f64) {
        if let Some(video) = self
            .featured
            .iter_mut()
            .chain(self.custom.iter_mut())
            .find(|v| v.id == id)
        {
            video.duration = duration;
        }
    }

    pub fn len(&self) -> usize {
        self.featured.len() + self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

/// The built-in demo lineup.
fn featured_content() -> Vec<Video> {
    [
        (
            "1",
            "Big Buck Bunny",
            "A short film about a big rabbit who encounters three bullying rodents.",
            "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4",
            "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/images/BigBuckBunny.jpg",
            596.0,
            3842,
        ),
        (
            "2",
            "Elephant Dream",
            "The first Blender Open Movie from 2006.",
            "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ElephantsDream.mp4",
            "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/images/ElephantsDream.jpg",
            653.0,
            2195,
        ),
        (
            "3",
            "Sintel",
            "A lonely girl travels to find her dragon friend.",
            "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/Sintel.mp4",
            "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/images/Sintel.jpg",
            888.0,
            4271,
        ),
    ]
    .into_iter()
    .filter_map(
        |(id, title, description, src, thumbnail, duration, viewers)| {
            let src = Url::parse(src).ok()?;
            Some(Video {
                id: id.to_string(),
                title: title.to_string(),
                description: description.to_string(),
                src,
                thumbnail: thumbnail.to_string(),
                duration,
                viewers,
            })
        },
    )
    .collect()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

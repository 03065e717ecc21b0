//! Pexels search response types.

use serde::Deserialize;

/// Raw response from `GET /v1/search`.
#[derive(Debug, Deserialize)]
pub struct PexelsSearchResponse {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
pub struct Photo {
    pub id: u64,
    #[serde(default)]
    pub photographer: Option<String>,
    pub src: PhotoSrc,
}

/// Pre-sized renditions of a photo.
#[derive(Debug, Deserialize)]
pub struct PhotoSrc {
    #[serde(default)]
    pub original: Option<String>,
    pub large: String,
    #[serde(default)]
    pub medium: Option<String>,
}

impl PexelsSearchResponse {
    /// `src.large` of every photo, in ranking order.
    pub fn large_urls(&self) -> Vec<String> {
        self.photos
            .iter()
            .map(|p| p.src.large.trim())
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "total_results": 2,
        "page": 1,
        "per_page": 3,
        "photos": [
            {
                "id": 112460,
                "width": 4000,
                "height": 2667,
                "photographer": "Pixabay",
                "src": {
                    "original": "https://images.pexels.com/photos/112460/pexels-photo-112460.jpeg",
                    "large": "https://images.pexels.com/photos/112460/pexels-photo-112460.jpeg?auto=compress&cs=tinysrgb&h=650&w=940",
                    "medium": "https://images.pexels.com/photos/112460/pexels-photo-112460.jpeg?auto=compress&cs=tinysrgb&h=350"
                }
            },
            {
                "id": 170811,
                "src": { "large": "https://images.pexels.com/photos/170811/pexels-photo-170811.jpeg?h=650&w=940" }
            }
        ]
    }"#;

    #[test]
    fn test_parse_fixture() {
        let response: PexelsSearchResponse = serde_json::from_str(FIXTURE).unwrap();
        assert_eq!(response.total_results, 2);
        assert_eq!(response.photos[0].photographer.as_deref(), Some("Pixabay"));

        let urls = response.large_urls();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].contains("112460") && urls[0].contains("w=940"));
    }

    #[test]
    fn test_parse_empty() {
        let response: PexelsSearchResponse = serde_json::from_str(r#"{"total_results":0,"photos":[]}"#).unwrap();
        assert!(response.large_urls().is_empty());
    }
}

//! Assets served under the reserved `/__ads/` prefix.

const CLIENT_JS: &str = include_str!("../../assets/client.js");
const PREVIEW_CSS: &str = include_str!("../../assets/preview.css");

/// Path of the WebSocket endpoint.
pub const WS_PATH: &str = "/__ads/ws";

/// An embedded asset ready to send.
#[derive(Debug, Clone)]
pub struct Asset {
    pub content_type: &'static str,
    pub body: String,
}

/// The reserved assets, with endpoint paths baked into the client script.
#[derive(Debug, Clone)]
pub struct ReservedAssets {
    client_js: String,
}

impl ReservedAssets {
    pub fn new(health_path: &str) -> Self {
        let client_js = CLIENT_JS
            .replace("__ADS_WS_PATH__", WS_PATH)
            .replace("__ADS_HEALTH_PATH__", health_path);
        Self { client_js }
    }

    /// Look up an asset by its name below the reserved prefix.
    pub fn get(&self, name: &str) -> Option<Asset> {
        match name {
            "client.js" => Some(Asset {
                content_type: "text/javascript; charset=utf-8",
                body: self.client_js.clone(),
            }),
            "preview.css" => Some(Asset {
                content_type: "text/css; charset=utf-8",
                body: PREVIEW_CSS.to_string(),
            }),
            _ => None,
        }
    }
}

use serde::{Deserialize, Serialize};

/// The three code strings of a generated portfolio site.
///
/// `html` is always a complete document; `css` and `js` may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPortfolio {
    pub html: String,
    #[serde(default)]
    pub css: String,
    #[serde(default)]
    pub js: String,
}

/// A partial replacement of the code strings, as sent by the editor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortfolioEdit {
    pub html: Option<String>,
    pub css: Option<String>,
    pub js: Option<String>,
}

impl PortfolioEdit {
    pub fn is_empty(&self) -> bool {
        self.html.is_none() && self.css.is_none() && self.js.is_none()
    }
}

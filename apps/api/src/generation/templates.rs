//! Template catalog: the visual styles a user can pick before generation.
//!
//! A template only changes the style guidance in the generation prompt; the
//! output contract is the same for all of them.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub features: &'static [&'static str],
    #[serde(skip)]
    pub style_guidance: &'static str,
}

pub const CATEGORIES: &[&str] = &["Developer", "Creative", "Business"];

/// Used when a request names a template the catalog does not know.
pub const GENERIC_STYLE_NAME: &str = "Modern Professional";
pub const GENERIC_STYLE_GUIDANCE: &str = "Clean, elegant and professional. Neutral palette \
    with one accent colour, generous whitespace, card-based sections and clear typography.";

const TEMPLATES: &[PortfolioTemplate] = &[
    PortfolioTemplate {
        id: "modern-developer",
        name: "Modern Developer",
        description: "Clean, professional design perfect for software developers and engineers",
        category: "Developer",
        features: &["Dark/Light Mode", "Responsive Design", "Project Showcase", "Skills Grid"],
        style_guidance: "Dark hero section with a gradient accent, monospace touches for \
            headings, a dark/light mode toggle, skills shown as a grid of badges and projects \
            as cards with technology tags and links.",
    },
    PortfolioTemplate {
        id: "creative-designer",
        name: "Creative Designer",
        description: "Elegant, visual-focused design for creative professionals and designers",
        category: "Creative",
        features: &["Visual Portfolio", "Image Gallery", "Creative Layout", "Responsive Grid"],
        style_guidance: "Bold colour palette, asymmetric layout, large display typography, \
            a masonry-style project gallery with hover reveals and playful section dividers.",
    },
    PortfolioTemplate {
        id: "professional-business",
        name: "Professional Business",
        description: "Clean, corporate design for business professionals and consultants",
        category: "Business",
        features: &["Corporate Design", "Professional Layout", "Contact Forms", "Service Sections"],
        style_guidance: "Corporate navy and white palette, serif headings with sans-serif body \
            text, a timeline for experience, a services-style skills section and a contact form.",
    },
    PortfolioTemplate {
        id: "minimalist-writer",
        name: "Minimalist Writer",
        description: "Clean, typography-focused design for writers and content creators",
        category: "Creative",
        features: &["Typography Focus", "Reading Experience", "Blog Layout", "Minimal Design"],
        style_guidance: "Single narrow reading column, elegant serif typography, almost no \
            colour, generous line height and understated links; content reads like an essay.",
    },
];

pub fn all_templates() -> &'static [PortfolioTemplate] {
    TEMPLATES
}

pub fn template_by_id(id: &str) -> Option<&'static PortfolioTemplate> {
    TEMPLATES.iter().find(|t| t.id == id)
}

pub fn templates_by_category(category: &str) -> Vec<&'static PortfolioTemplate> {
    TEMPLATES
        .iter()
        .filter(|t| t.category.eq_ignore_ascii_case(category))
        .collect()
}

/// (style name, style guidance) for a template id, generic for unknown ids.
pub fn style_for(template_id: &str) -> (&'static str, &'static str) {
    template_by_id(template_id)
        .map(|t| (t.name, t.style_guidance))
        .unwrap_or((GENERIC_STYLE_NAME, GENERIC_STYLE_GUIDANCE))
}

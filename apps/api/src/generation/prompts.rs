// LLM prompt constants for portfolio code generation.

use crate::llm_client::prompts::json_system;

pub fn generation_system() -> String {
    json_system(
        "You are a meticulous, detail-oriented web developer who builds personal portfolio \
         websites from resume data.",
    )
}

/// Generation prompt template.
/// Replace: {resume_json}, {template_name}, {style_guidance}
pub const GENERATION_PROMPT_TEMPLATE: &str = r#"Build a portfolio website that includes EVERY piece of data from the resume JSON below. Do not omit any details.

RESUME DATA:
---
{resume_json}
---

MANDATORY INSTRUCTIONS

1. DATA COMPLETENESS (ABSOLUTE PRIORITY)
   - Render every field that has a value. If a linkedin or github URL is present, link to it. If there are 5 skills, all 5 are displayed.
   - Iterate every entry of "experience", "education", "projects" and "certifications". No exceptions.
   - If a key exists but its value is empty (e.g. "professionalSummary": ""), write professional-sounding placeholder content for it, based on the person's most recent role. Never leave a section blank.

2. STYLE
   - Template: {template_name}
   - Style guidance: {style_guidance}
   - Modern colour scheme with CSS custom properties, good typography, Flexbox or Grid layout.
   - Subtle box-shadow for depth, border-radius for soft corners, smooth transitions on links and buttons.
   - Fully responsive.

3. OUTPUT
   - "html": a complete HTML5 document (<!DOCTYPE html>, <html>, <head>, <body>) using semantic tags. Do not inline the CSS or JavaScript; they are injected before </head> and </body>.
   - "css": all styles.
   - "js": JavaScript for smooth scrolling and simple on-scroll animations. No external libraries.

Return ONLY a valid JSON object with exactly the keys "html", "css" and "js"."#;

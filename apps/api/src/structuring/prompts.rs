// LLM prompt constants for the Resume Structurer.

use crate::llm_client::prompts::json_system;

pub fn structuring_system() -> String {
    json_system(
        "You are a precise resume parser. Extract structured information from raw resume \
         text exactly as written; never invent employers, dates or credentials.",
    )
}

/// Structuring prompt template. Replace `{resume_text}` before sending.
pub const STRUCTURING_PROMPT_TEMPLATE: &str = r#"Parse this resume text and extract structured information. Return ONLY valid JSON with this exact structure:

{
  "personalInfo": {
    "name": "Full Name",
    "email": "email@example.com",
    "phone": "phone number",
    "location": "city, state",
    "website": "",
    "linkedin": "",
    "github": ""
  },
  "professionalSummary": "brief summary",
  "experience": [
    {
      "title": "Job Title",
      "company": "Company Name",
      "duration": "2020-2023",
      "description": "Job description",
      "achievements": ["achievement 1"]
    }
  ],
  "education": [
    {
      "degree": "Degree Name",
      "institution": "School Name",
      "year": "2020",
      "gpa": ""
    }
  ],
  "skills": {
    "technical": ["skill1", "skill2"],
    "soft": ["skill1", "skill2"],
    "languages": ["English"]
  },
  "projects": [
    {
      "name": "Project Name",
      "description": "Project description",
      "technologies": ["tech1", "tech2"],
      "link": ""
    }
  ],
  "certifications": [
    {
      "name": "Certification Name",
      "issuer": "Issuing Organization",
      "date": "2023"
    }
  ]
}

Rules:
- Use empty strings and empty arrays for anything the resume does not mention. Never omit a key.
- Keep experience, education and projects in the order they appear in the resume.
- "languages" means spoken languages, not programming languages.

Resume text:
{resume_text}

Return only the JSON object, no other text or formatting."#;

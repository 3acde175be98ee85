//! Heuristic resume parser: the deterministic fallback when AI structuring fails.
//!
//! Pattern matching only: regexes for contact details, keyword lists for skills,
//! job-title words and years for experience lines. Anything that does not match
//! is left empty for the generator to fill with placeholder copy.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::resume::{Education, Experience, PersonalInfo, Skills, StructuredResume};

const MAX_EXPERIENCE_ENTRIES: usize = 3;
const MAX_EDUCATION_ENTRIES: usize = 2;
const MAX_TITLE_PREFIX_WORDS: usize = 2;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,3}[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b|\+?\d{10,15}\b")
        .unwrap()
});

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b20\d{2}\b").unwrap());

static ONGOING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:present|current|now)\b").unwrap());

static COMPANY_AFTER_AT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\bat|@)\s+([A-Z][\w&.'-]*(?:\s+[A-Z][\w&.'-]*){0,3})").unwrap()
});

static LINKEDIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:www\.)?linkedin\.com/[^\s,;|]+").unwrap()
});

static GITHUB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:https?://)?(?:www\.)?github\.com/[^\s,;|]+").unwrap());

static WEBSITE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)https?://[^\s,;|]+").unwrap());

static DEGREE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?i:bachelor|master|doctorate|associate|mba|phd|ph\.d|bsc|msc|b\.s|m\.s|b\.tech|m\.tech)(?:'s)?\b(?:\s+(?:of|in)\s+[A-Z][A-Za-z]*(?:\s+[A-Z][A-Za-z]*)*)?",
    )
    .unwrap()
});

static INSTITUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:[A-Z][A-Za-z&'-]*\s+){0,3}(?:University|College|Institute|School|Academy)(?:\s+of(?:\s+[A-Z][A-Za-z&'-]*)+)?",
    )
    .unwrap()
});

static GPA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bgpa\b[:\s]*([0-4]\.\d{1,2})").unwrap());

const JOB_TITLE_WORDS: &[&str] = &[
    "engineer",
    "developer",
    "manager",
    "designer",
    "analyst",
    "consultant",
    "architect",
    "scientist",
    "intern",
    "director",
    "specialist",
];

/// (display name, lowercase needles matched on word boundaries)
const TECHNICAL_SKILLS: &[(&str, &[&str])] = &[
    ("JavaScript", &["javascript"]),
    ("TypeScript", &["typescript"]),
    ("Python", &["python"]),
    ("Rust", &["rust"]),
    ("Java", &["java"]),
    ("C++", &["c++"]),
    ("React", &["react", "react.js"]),
    ("Node.js", &["node.js", "nodejs", "node"]),
    ("HTML", &["html", "html5"]),
    ("CSS", &["css", "css3"]),
    ("SQL", &["sql"]),
    ("PostgreSQL", &["postgresql", "postgres"]),
    ("Git", &["git"]),
    ("Docker", &["docker"]),
    ("Kubernetes", &["kubernetes"]),
    ("AWS", &["aws"]),
];

const SOFT_SKILLS: &[(&str, &[&str])] = &[
    ("Leadership", &["leadership"]),
    ("Communication", &["communication"]),
    ("Teamwork", &["teamwork"]),
    ("Collaboration", &["collaboration"]),
    ("Mentoring", &["mentoring", "mentorship"]),
    ("Problem Solving", &["problem solving", "problem-solving"]),
];

/// Derives a best-effort resume from raw text. Never fails.
pub fn parse_resume(text: &str) -> StructuredResume {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let lower = text.to_lowercase();

    let education_lines: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| DEGREE.is_match(l) || INSTITUTION.is_match(l))
        .collect();

    let education = education_lines
        .iter()
        .take(MAX_EDUCATION_ENTRIES)
        .map(|line| parse_education_line(line))
        .collect();

    let experience = lines
        .iter()
        .copied()
        .filter(|l| !education_lines.contains(l))
        .filter(|l| YEAR.is_match(l) || job_word_index(l).is_some())
        .take(MAX_EXPERIENCE_ENTRIES)
        .map(parse_experience_line)
        .collect();

    StructuredResume {
        personal_info: PersonalInfo {
            name: find_name(&lines),
            email: EMAIL
                .find(text)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            phone: find_phone(text),
            location: None,
            website: find_website(text),
            linkedin: find_url(&LINKEDIN, text),
            github: find_url(&GITHUB, text),
        },
        professional_summary: String::new(),
        experience,
        education,
        skills: Skills {
            technical: matching_keywords(&lower, TECHNICAL_SKILLS),
            soft: matching_keywords(&lower, SOFT_SKILLS),
            languages: Vec::new(),
        },
        projects: Vec::new(),
        certifications: Vec::new(),
    }
}

/// First short line without contact details among the first five; otherwise
/// the words preceding the email on the first line.
fn find_name(lines: &[&str]) -> String {
    for line in lines.iter().take(5) {
        let len = line.chars().count();
        if len > 3 && len < 50 && !line.contains('@') && digit_count(line) < 4 {
            return line.to_string();
        }
    }

    let Some(first) = lines.first() else {
        return String::new();
    };
    let Some(email) = EMAIL.find(first) else {
        return String::new();
    };
    let prefix: Vec<&str> = first[..email.start()].split_whitespace().take(4).collect();
    if prefix.iter().any(|w| w.chars().any(|c| c.is_ascii_digit())) {
        return String::new();
    }
    prefix.join(" ")
}

fn find_phone(text: &str) -> String {
    PHONE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .find(|candidate| (10..=15).contains(&digit_count(candidate)))
        .unwrap_or_default()
        .to_string()
}

fn find_url(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .find(text)
        .map(|m| m.as_str().trim_end_matches(['.', ')']).to_string())
}

fn find_website(text: &str) -> Option<String> {
    WEBSITE
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['.', ')']))
        .find(|url| {
            let url = url.to_lowercase();
            !url.contains("linkedin.com") && !url.contains("github.com")
        })
        .map(str::to_string)
}

fn parse_experience_line(line: &str) -> Experience {
    Experience {
        title: title_on_line(line).unwrap_or_default(),
        company: COMPANY_AFTER_AT
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().trim_end_matches([',', '.']).to_string())
            .unwrap_or_default(),
        duration: duration_on_line(line),
        description: line.to_string(),
        achievements: Vec::new(),
    }
}

fn parse_education_line(line: &str) -> Education {
    Education {
        degree: DEGREE
            .find(line)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
        institution: INSTITUTION
            .find(line)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
        year: YEAR
            .find_iter(line)
            .last()
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        gpa: GPA
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
    }
}

/// The job-title word plus up to two capitalized words before it,
/// e.g. "Senior Software Engineer".
fn title_on_line(line: &str) -> Option<String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let idx = job_word_index(line)?;
    let mut start = idx;
    while start > 0 && idx - start < MAX_TITLE_PREFIX_WORDS && is_title_word(words[start - 1]) {
        start -= 1;
    }
    let title = words[start..=idx].join(" ");
    Some(
        title
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_string(),
    )
}

fn job_word_index(line: &str) -> Option<usize> {
    line.split_whitespace().position(|word| {
        let word: String = word
            .chars()
            .filter(|c| c.is_alphabetic())
            .collect::<String>()
            .to_lowercase();
        JOB_TITLE_WORDS
            .iter()
            .any(|k| word == *k || word.strip_suffix('s') == Some(*k))
    })
}

fn is_title_word(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase) && word.chars().all(char::is_alphabetic)
}

fn duration_on_line(line: &str) -> String {
    let years: Vec<&str> = YEAR.find_iter(line).map(|m| m.as_str()).collect();
    match (years.first(), years.last()) {
        (Some(first), _) if ONGOING.is_match(line) => format!("{first} - Present"),
        (Some(first), Some(last)) if first != last => format!("{first} - {last}"),
        (Some(first), _) => first.to_string(),
        _ => String::new(),
    }
}

fn matching_keywords(lower_text: &str, table: &[(&str, &[&str])]) -> Vec<String> {
    table
        .iter()
        .filter(|(_, needles)| needles.iter().any(|n| contains_word(lower_text, n)))
        .map(|(display, _)| display.to_string())
        .collect()
}

/// Substring match that refuses to start or end inside a larger word.
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, matched)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn digit_count(s: &str) -> usize {
    s.chars().filter(|c| c.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RESUME: &str = "\
Alex Rivera
alex.rivera@example.com | +1 (415) 555-0134 | linkedin.com/in/alexrivera | github.com/arivera
Portfolio: https://alexrivera.dev
Senior Backend Engineer at Lumen Labs 2021 - Present
Built payment services in Rust and PostgreSQL, deployed with Docker and Kubernetes on AWS.
Software Developer at Northwind Traders 2018 - 2021
Data Analyst Intern @ Contoso 2017
B.S. in Computer Science, University of Washington 2017 GPA: 3.8
Strong communication and mentoring background.";

    #[test]
    fn test_single_line_resume_yields_email_and_engineer_entry() {
        let resume = parse_resume("Jane Doe jane@x.com Software Engineer at Acme 2022");

        assert_eq!(resume.personal_info.email, "jane@x.com");
        assert_eq!(resume.personal_info.name, "Jane Doe");
        assert_eq!(resume.experience.len(), 1);
        let entry = &resume.experience[0];
        assert_eq!(entry.title, "Software Engineer");
        assert_eq!(entry.company, "Acme");
        assert_eq!(entry.duration, "2022");
        assert!(entry.description.contains("Engineer"));
    }

    #[test]
    fn test_contact_details_are_extracted() {
        let resume = parse_resume(SAMPLE_RESUME);
        let info = &resume.personal_info;

        assert_eq!(info.name, "Alex Rivera");
        assert_eq!(info.email, "alex.rivera@example.com");
        assert_eq!(info.phone, "+1 (415) 555-0134");
        assert_eq!(info.linkedin.as_deref(), Some("linkedin.com/in/alexrivera"));
        assert_eq!(info.github.as_deref(), Some("github.com/arivera"));
        assert_eq!(info.website.as_deref(), Some("https://alexrivera.dev"));
    }

    #[test]
    fn test_experience_is_capped_and_ordered() {
        let resume = parse_resume(SAMPLE_RESUME);

        assert_eq!(resume.experience.len(), MAX_EXPERIENCE_ENTRIES);
        assert_eq!(resume.experience[0].title, "Senior Backend Engineer");
        assert_eq!(resume.experience[0].company, "Lumen Labs");
        assert_eq!(resume.experience[0].duration, "2021 - Present");
        assert_eq!(resume.experience[1].title, "Software Developer");
        assert_eq!(resume.experience[1].company, "Northwind Traders");
        assert_eq!(resume.experience[1].duration, "2018 - 2021");
        assert_eq!(resume.experience[2].company, "Contoso");
    }

    #[test]
    fn test_education_line_is_not_counted_as_experience() {
        let resume = parse_resume(SAMPLE_RESUME);

        assert_eq!(resume.education.len(), 1);
        let edu = &resume.education[0];
        assert_eq!(edu.institution, "University of Washington");
        assert_eq!(edu.year, "2017");
        assert_eq!(edu.gpa.as_deref(), Some("3.8"));
        assert!(resume
            .experience
            .iter()
            .all(|e| !e.description.contains("University")));
    }

    #[test]
    fn test_skills_match_on_word_boundaries() {
        let resume = parse_resume(SAMPLE_RESUME);
        assert_eq!(
            resume.skills.technical,
            vec!["Rust", "PostgreSQL", "Docker", "Kubernetes", "AWS"]
        );
        assert_eq!(resume.skills.soft, vec!["Communication", "Mentoring"]);

        // "github" is not Git and "javascript" is not Java
        let resume = parse_resume("Wrote JavaScript daily, code on github.com/someone");
        assert_eq!(resume.skills.technical, vec!["JavaScript"]);
    }

    #[test]
    fn test_years_alone_are_not_a_phone_number() {
        let resume = parse_resume("Volunteer work 2019 2020 2021");
        assert_eq!(resume.personal_info.phone, "");
    }

    #[test]
    fn test_unmatched_text_still_yields_valid_resume() {
        let resume = parse_resume("lorem ipsum dolor sit amet consectetur");
        assert!(resume.personal_info.email.is_empty());
        assert!(resume.experience.is_empty());
        assert!(resume.education.is_empty());
        assert!(resume.skills.technical.is_empty());
        assert!(resume.projects.is_empty());
        assert!(resume.certifications.is_empty());
    }
}

//! Post-battle commentary: a quick look at each competitor's page and the
//! in-character critiques and defenses built from it.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteStyle {
    Minimal,
    Organized,
    Modern,
    Custom,
    Unknown,
}

/// Surface features of a generated `index.html`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteAnalysis {
    pub file_size: usize,
    pub line_count: usize,
    pub has_css: bool,
    pub has_js: bool,
    pub has_images: bool,
    pub has_framework: bool,
    pub has_comments: bool,
    pub uses_inline_styles: bool,
    pub external_refs: usize,
    pub style: SiteStyle,
}

const FRAMEWORKS: [&str; 4] = ["react", "vue", "bootstrap", "tailwind"];

impl SiteAnalysis {
    pub fn analyze(html: &str) -> Self {
        let lower = html.to_lowercase();
        let line_count = html.split('\n').count();
        let external_refs = html.matches("href=\"").count() + html.matches("src=\"").count();
        let has_comments = html.contains("<!--");
        let has_framework = FRAMEWORKS.iter().any(|fw| lower.contains(fw));

        let style = if line_count < 50 && external_refs == 0 {
            SiteStyle::Minimal
        } else if has_comments && external_refs > 3 {
            SiteStyle::Organized
        } else if has_framework {
            SiteStyle::Modern
        } else {
            SiteStyle::Custom
        };

        Self {
            file_size: html.len(),
            line_count,
            has_css: html.contains("<style") || html.contains("stylesheet"),
            has_js: html.contains("<script"),
            has_images: html.contains("<img"),
            has_framework,
            has_comments,
            uses_inline_styles: html.contains("style=\""),
            external_refs,
            style,
        }
    }

    /// Reads and analyzes a page; an unreadable file yields an empty
    /// analysis rather than an error.
    pub fn from_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(html) => Self::analyze(&html),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "could not read page for review");
                Self::unknown()
            }
        }
    }

    pub fn unknown() -> Self {
        Self {
            file_size: 0,
            line_count: 0,
            has_css: false,
            has_js: false,
            has_images: false,
            has_framework: false,
            has_comments: false,
            uses_inline_styles: false,
            external_refs: 0,
            style: SiteStyle::Unknown,
        }
    }
}

/// A rival's take on `creator`'s page, in `critic`'s voice.
pub fn critique<R: Rng + ?Sized>(
    critic: &str,
    creator: &str,
    site: &SiteAnalysis,
    rng: &mut R,
) -> String {
    let mut options: Vec<String> = Vec::new();

    match critic {
        "SpeedDemon" => {
            if site.line_count > 100 {
                options.push(format!(
                    "{creator} wrote {} lines? I did mine in like thirty! Efficiency!",
                    site.line_count
                ));
                options.push(format!("Look at that file! {creator} is out here writing essays!"));
            }
            if site.external_refs > 3 {
                options.push(format!(
                    "{creator} pulls in {} files! Over-engineering much?",
                    site.external_refs
                ));
            }
            if site.has_framework {
                options.push(format!("{creator} dragged in a whole framework. I kept it LEAN!"));
            }
            if site.file_size > 2000 {
                options.push(format!(
                    "{} bytes, {creator}? Mine loaded before yours finished parsing!",
                    site.file_size
                ));
            }
            if options.is_empty() {
                options.push(format!("{creator}'s code is bloated. Mine shipped faster AND lighter!"));
            }
        }
        "Architect" => {
            if site.line_count < 50 {
                options.push(format!(
                    "{creator}'s solution is {} lines? Where's the structure?",
                    site.line_count
                ));
            }
            if !site.has_css {
                options.push(format!("No stylesheet at all? {creator}, this isn't 1995!"));
                options.push(format!("{creator} skipped CSS entirely. Amateur hour."));
            }
            if site.uses_inline_styles {
                options.push(format!(
                    "Inline styles everywhere! {creator}, ever heard of separation of concerns?"
                ));
            }
            if !site.has_comments {
                options.push(format!("Zero documentation. Good luck maintaining that, {creator}!"));
            }
            if site.external_refs < 2 {
                options.push(format!("{creator} crammed everything into one file. Not maintainable!"));
            }
            if options.is_empty() {
                options.push(format!("{creator}'s code is next week's tech debt. Calling it now."));
            }
        }
        "Wildcard" => {
            if site.style == SiteStyle::Minimal {
                options.push(format!("{creator} took the BORING path. Zero creativity!"));
                options.push(format!("Most generic solution I've ever seen, {creator}."));
            }
            if !site.has_js {
                options.push(format!("No JavaScript? {creator} built a static page. Groundbreaking."));
            }
            if site.has_framework {
                options.push(format!("{creator} used the framework everybody uses. How ordinary."));
            }
            if site.line_count < 100 && !site.has_js {
                options.push(format!("{creator}'s site looks like a tutorial. Where's the innovation?"));
            }
            if options.is_empty() {
                options.push(format!("I read {creator}'s code and yawned. So predictable!"));
            }
        }
        _ => {}
    }

    options
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| format!("{creator}'s work is... fine, I guess. Nothing special."))
}

/// `creator` answering the critiques of its page.
pub fn defense<R: Rng + ?Sized>(creator: &str, site: &SiteAnalysis, rng: &mut R) -> String {
    let mut options: Vec<String> = Vec::new();

    match creator {
        "SpeedDemon" => {
            if site.line_count < 50 {
                options.push("Simple is FAST! You were still architecting while I was SHIPPING!".to_string());
                options.push(format!("{} lines of pure efficiency! No bloat!", site.line_count));
            }
            if site.file_size < 1500 {
                options.push(format!("My page is {} bytes and loads INSTANTLY!", site.file_size));
            }
            if site.external_refs < 2 {
                options.push("One file, zero dependencies, pure speed!".to_string());
            }
            options.push("I FINISHED FIRST! Speed is a feature!".to_string());
            options.push("Working software beats perfect architecture EVERY TIME!".to_string());
        }
        "Architect" => {
            if site.has_comments {
                options.push("I wrote comments because I care about the NEXT developer!".to_string());
            }
            if site.external_refs > 2 {
                options.push("Proper separation of concerns! Unlike you cowboys!".to_string());
            }
            if site.line_count > 100 {
                options.push(format!("{} lines of professional-grade code!", site.line_count));
            }
            if site.has_css {
                options.push("Styled properly with real CSS! Not inline chaos!".to_string());
            }
            options.push("This follows industry best practices! Read a book!".to_string());
            options.push("My code will still be maintainable in a YEAR! Can you say the same?".to_string());
        }
        "Wildcard" => {
            options.push("Genius looks like madness to the mediocre!".to_string());
            options.push("I tried something DIFFERENT while you copied the docs!".to_string());
            if site.has_js {
                options.push("My JavaScript does things you didn't think were possible!".to_string());
            }
            if site.style == SiteStyle::Custom {
                options.push("Custom everything! No frameworks, pure creativity!".to_string());
            }
            options.push("At least MY site has PERSONALITY!".to_string());
        }
        _ => {}
    }

    options
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| "Whatever, I like what I built!".to_string())
}

/// Opening line for one competitor's review.
pub fn announcement(creator: &str) -> String {
    format!("Alright, let's take a look at what {creator} built.")
}

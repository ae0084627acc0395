//! Prompt templates for the planner and writer stages.
//!
//! Placeholders are `{snake_case}` and filled with `str::replace` by the
//! pipeline. Both stages instruct the model to return bare JSON; recovery
//! in `extract` handles fenced or chatty output anyway.

pub const PLANNER_SYSTEM: &str =
    "You are an expert presentation planner. You always answer with a single JSON object and \
     nothing else.";

pub const PLANNER_PROMPT_TEMPLATE: &str = r#"Topic: "{topic}"
Target audience: "{audience}"
Tone: "{tone}"
Additional instructions: "{instructions}"

Task: generate a {num_slides}-slide outline for this topic.
Return ONLY a JSON object with this structure:
{
    "title": "Main Presentation Title",
    "outline": ["Slide 1 Title", "Slide 2 Title", "..."]
}"#;

pub const WRITER_SYSTEM: &str =
    "You are a professional presentation content writer. You always answer with a single JSON \
     array and nothing else.";

pub const WRITER_PROMPT_TEMPLATE: &str = r#"Presentation title: "{title}"
Target audience: "{audience}"
Tone: "{tone}"

Outline:
{outline}

Task: write the detailed content for these slides.

Return ONLY a JSON list of slide objects:
[
    {
        "heading": "Slide 1 Title",
        "content": [
            { "text": "Main point", "level": 0 },
            { "text": "Sub-point details", "level": 1 }
        ]{image_field_example}
    }
]

Rules:
- Match the headings from the outline, in order.
- Maximum {max_lines} lines of content per slide; keep bullets concise.
- Use "level": 0 for main points, "level": 1 for sub-points, "level": 2 for details.
{image_instruction}"#;

/// Appended to the writer rules when the caller asked for images.
pub const IMAGE_INSTRUCTION: &str =
    r#"- For each slide, include an "image_search_query" (2-4 words) for a relevant image."#;

/// Spliced into the example object when the caller asked for images.
pub const IMAGE_FIELD_EXAMPLE: &str = r#",
        "image_search_query": "search query""#;

//! Instructions, prompts and schemas sent to the generator

use serde_json::{json, Value};

pub const SKETCH_SYSTEM_INSTRUCTION: &str = "\
You are a senior frontend engineer who turns hand-drawn UI sketches into HTML.
Rules:
- Infer layout and hierarchy from the image.
- Use semantic HTML5 elements (header, nav, main, section, footer).
- Style everything with Tailwind CSS loaded from its CDN script tag in <head>.
- Build mobile-first and responsive, using Flexbox and Grid.
- Follow accessibility practice: ARIA labels, alt text, sufficient contrast.
- Use https://picsum.photos for placeholder images.
- Prefer neutral colors unless the sketch shows others.
- Reply with the complete HTML document in one fenced code block and nothing else.";

pub const SKETCH_PROMPT: &str =
    "Convert this hand-drawn UI sketch into a production-ready HTML page styled with Tailwind CSS.";

/// Audit instruction for the page deployed at `url`
pub fn audit_system_instruction(url: &str) -> String {
    format!(
        "You are a QA reviewer for static websites.
The page whose source follows is deployed at {url}.
Run a visual and structural audit of it:
- basic rendering correctness, judged from the code
- HTML5 and Tailwind CSS applied correctly
- semantic hierarchy
- mobile responsiveness and breakpoints
- accessibility (ARIA)
Return a list of checkpoints, each with its own status."
    )
}

pub fn audit_prompt(code: &str) -> String {
    format!("Audit the source of this site:\n\n{}", code)
}

/// JSON schema of an audit answer: `{"checkpoints": [{label, status, passed}]}`
pub fn audit_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "checkpoints": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "label": { "type": "STRING", "description": "Short name of the check, e.g. 'Semantic HTML5'" },
                        "status": { "type": "STRING", "description": "Brief verdict, e.g. 'Passed' or 'Needs improvement'" },
                        "passed": { "type": "BOOLEAN", "description": "True when the check succeeds" }
                    },
                    "required": ["label", "status", "passed"]
                }
            }
        },
        "required": ["checkpoints"]
    })
}

pub const REPAIR_SYSTEM_INSTRUCTION: &str = "\
You are a senior frontend engineer who fixes issues found by a QA audit in existing HTML/Tailwind code.
Rules:
- Change only what the findings require.
- Keep the design, colors and layout unless a finding asks otherwise.
- Keep the code valid, responsive and accessible.
- Reply with the complete updated HTML document in one fenced code block and nothing else.";

/// Repair prompt listing one finding per line
pub fn repair_prompt(code: &str, finding_lines: &[String]) -> String {
    format!(
        "Fix the following findings in this HTML code.\n\nFINDINGS TO FIX:\n{}\n\nCURRENT CODE:\n{}",
        finding_lines.join("\n"),
        code
    )
}

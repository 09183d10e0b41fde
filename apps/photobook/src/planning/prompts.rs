//! LLM prompt constants for album planning.
//!
//! The model must answer with `{"pages": [...]}` JSON only. Callers
//! deserialize via `llm.call_json::<ExternalPlan>()`.

pub const PLAN_SYSTEM: &str = "\
You are a professional photobook designer. You arrange a set of photos onto page \
layouts so that every page looks intentional and the album reads as a story.\n\
\n\
Respond with valid JSON only.\n\
Do NOT use markdown code fences. Do NOT add any explanation outside the JSON object.";

pub const PLAN_PROMPT_TEMPLATE: &str = "\
Create a photobook layout plan for the photos below.\n\
\n\
AVAILABLE LAYOUTS (name, frames with 1-based frame numbers, aspect ratio and page area):\n\
{layouts}\n\
\n\
PHOTOS (id, orientation, aspect ratio, optional priority where 1 is most important):\n\
{photos}\n\
\n\
DESIGN PRINCIPLES:\n\
1. Orientation matching (critical): portrait photos go in tall frames, landscape photos \
in wide frames, square photos anywhere\n\
2. Hero moments: put the most striking or highest-priority photos in the largest frames\n\
3. Rhythm: alternate dense and spacious layouts, vary frame sizes across pages\n\
4. Balance visual weight across facing pages\n\
\n\
TECHNICAL REQUIREMENTS:\n\
1. Use each photo exactly once\n\
2. Only use layout names from the list above\n\
3. frame_number starts at 1 and goes up to the layout's frame count\n\
4. Never put two photos in the same frame of one page\n\
\n\
Return JSON only:\n\
{\"pages\": [{\"layout_to_use\": \"layout3.svg\", \"frames\": [{\"frame_number\": 1, \"image_id\": \"...\"}]}]}";

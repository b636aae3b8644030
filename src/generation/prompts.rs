//! Stage prompt builders
//!
//! One builder per pipeline stage. Every builder returns the system/user
//! prompt pair sent to the completion backend; later stages receive the
//! outline titles so the deck stays coherent across stages.

use crate::backend::StagePrompt;
use crate::generation::types::DeckRequest;

fn context_or_none(context: &str) -> &str {
    if context.trim().is_empty() {
        "(none)"
    } else {
        context
    }
}

/// Outline stage: derive the content-slide titles (internal, emits no slide)
pub fn outline(request: &DeckRequest) -> StagePrompt {
    StagePrompt {
        system: format!(
            "You are an educator. Given a lesson topic, grade, and context, output ONLY a list of {n} content slide titles, one per line. No numbering, no JSON, no extra text. Each line is one slide title. These will be used in an agenda and then each will be expanded into a full slide.",
            n = request.slide_count
        ),
        user: format!(
            "Topic: {topic}\nGrade: {grade}\nContext: {context}\nGive exactly {n} content slide titles, one per line.",
            topic = request.topic,
            grade = request.grade,
            context = context_or_none(&request.context),
            n = request.slide_count
        ),
    }
}

/// Title stage: the opening slide
pub fn title(request: &DeckRequest) -> StagePrompt {
    StagePrompt {
        system: r#"You are an educator. Generate a single TITLE slide for a lesson. Output valid JSON only: {"type": "title", "title": "...", "content": "..."}. No markdown, no code block. The content can be a short subtitle or hook."#.to_string(),
        user: format!(
            "Topic: {topic}\nGrade: {grade}\nContext: {context}\nReturn one JSON object: type \"title\", title (lesson title), content (short subtitle).",
            topic = request.topic,
            grade = request.grade,
            context = context_or_none(&request.context)
        ),
    }
}

/// Agenda stage: lists the outline titles
pub fn agenda(request: &DeckRequest, outline_titles: &[String]) -> StagePrompt {
    let titles_blob = outline_titles
        .iter()
        .map(|t| format!("- {}", t))
        .collect::<Vec<_>>()
        .join("\n");

    StagePrompt {
        system: r#"You are an educator. Generate a single AGENDA slide. Output valid JSON only: {"type": "agenda", "title": "Agenda" or similar, "content": "bullet points listing each item (one per line or with bullets)"}. No markdown. The content must list the given content slide titles."#.to_string(),
        user: format!(
            "Topic: {topic}\nContent slide titles to list in the agenda (one per line):\n{titles}\nReturn one JSON object: type \"agenda\", title, content (with these items).",
            topic = request.topic,
            titles = titles_blob
        ),
    }
}

/// Content stage: one teaching slide, optionally carrying the deck's question
pub fn content(
    request: &DeckRequest,
    slide_title: &str,
    index: usize,
    include_question: bool,
) -> StagePrompt {
    let question_rule = if include_question {
        r#"Required: "question" (object with "prompt", "options" array of 4 strings, "answer" string matching one option) - this slide carries the deck's single exercise."#
    } else {
        r#"Do NOT include a "question" field on this slide."#
    };

    StagePrompt {
        system: format!(
            r#"You are an educator. Generate ONE content slide. Output valid JSON only. Required: "type": "content", "title": "...", "content": "...". Optional: "image" (string, a search query for an image that fits the slide, or omit). {question_rule} No markdown, no code block."#
        ),
        user: format!(
            "Topic: {topic}\nGrade: {grade}\nContext: {context}\nThis content slide title: {slide_title}\nPosition: content slide {index} of {total}.\n\nGenerate this single content slide. Rich, pedagogical content. Return one JSON object only.",
            topic = request.topic,
            grade = request.grade,
            context = context_or_none(&request.context),
            slide_title = slide_title,
            index = index + 1,
            total = request.slide_count
        ),
    }
}

/// Conclusion stage: summary and takeaway, aware of what the deck covered
pub fn conclusion(request: &DeckRequest, outline_titles: &[String]) -> StagePrompt {
    StagePrompt {
        system: r#"You are an educator. Generate a single CONCLUSION slide. Output valid JSON only: {"type": "conclusion", "title": "Conclusion" or similar, "content": "summary and key takeaway"}. No markdown."#.to_string(),
        user: format!(
            "Topic: {topic}\nGrade: {grade}\nContext: {context}\nThe lesson covered: {covered}\nSummarize the lesson and give a clear takeaway. Return one JSON object: type \"conclusion\", title, content.",
            topic = request.topic,
            grade = request.grade,
            context = context_or_none(&request.context),
            covered = outline_titles.join("; ")
        ),
    }
}

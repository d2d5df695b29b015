//! Render a response policy into style instructions for the text generator.
//!
//! Every continuous policy field is cut into bands; each band contributes a
//! few bullet lines with an example.

use rapport_core::{MemoryLog, RelationshipState, ResponsePolicy};

const FACTS_IN_CONTEXT: usize = 5;
const JOKES_IN_CONTEXT: usize = 3;

fn describe(state: RelationshipState) -> &'static str {
    match state {
        RelationshipState::Stranger => "complete stranger",
        RelationshipState::Friend => "friend",
        RelationshipState::Interest => "friend you like",
        RelationshipState::Flirting => "something is starting",
        RelationshipState::Dating => "dating",
    }
}

fn section(out: &mut Vec<String>, title: &str) {
    out.push(format!("\n**{}**:", title));
}

fn bullets(out: &mut Vec<String>, lines: &[&str]) {
    out.extend(lines.iter().map(|l| format!("- {}", l)));
}

/// Style guide for one reply.
pub fn policy_to_prompt(policy: &ResponsePolicy, state: RelationshipState) -> String {
    let p = policy;
    let mut out = vec![format!("**Relationship**: {}", describe(state))];

    section(&mut out, "Tone");
    bullets(
        &mut out,
        match p.tone {
            t if t > 0.8 => &[
                "Very lively and animated, frequent exclamations (\"wow!\", \"really?!\")",
                "Lots of exclamation marks, emoji welcome",
                "e.g. \"No way?! I love that too!\"",
            ],
            t if t > 0.6 => &[
                "Bright and friendly, the occasional exclamation (\"oh\", \"nice\")",
                "Mix of exclamation and question marks",
                "e.g. \"Oh, that sounds fun!\"",
            ],
            t if t > 0.4 => &[
                "Relaxed and soft, calm register",
                "Mostly periods and questions, exclamations only now and then",
                "e.g. \"Yeah, that seems fine.\"",
            ],
            t if t > 0.2 => &[
                "Calm and quiet, minimal emotional expression",
                "Short, plain sentences ending in periods",
                "e.g. \"I see. Nice.\"",
            ],
            t if t > 0.05 => &[
                "Flat and indifferent",
                "Very short sentences, one-word answers",
                "e.g. \"Okay.\" / \"Sure.\"",
            ],
            _ => &[
                "Barely speaks, completely uninterested",
                "Silence and ellipses (\"...\")",
                "e.g. \"...\" / \"Yes.\" / \"Don't know.\"",
            ],
        },
    );

    section(&mut out, "Length");
    bullets(
        &mut out,
        &[match p.tone {
            t if t > 0.7 => "Long reply (3-5 sentences), expressive",
            t if t > 0.4 => "Medium reply (2-3 sentences)",
            t if t > 0.2 => "Short reply (1-2 sentences)",
            _ => "One sentence at most",
        }],
    );

    if p.humor > 0.6 || p.playfulness > 0.6 {
        section(&mut out, "Humor and teasing");
        if p.humor > 0.7 || p.playfulness > 0.7 {
            bullets(
                &mut out,
                &[
                    "Actively tries to be funny, teases playfully",
                    "Laughs often (\"haha\", \"lol\")",
                    "e.g. \"What's that about, you're cute lol\"",
                ],
            );
        } else {
            bullets(
                &mut out,
                &[
                    "Laughs lightly now and then, gentle teasing",
                    "e.g. \"That's kind of... funny, heh\"",
                ],
            );
        }
    } else {
        out.push("\n**Humor**: rarely laughs, keeps it serious".to_string());
    }

    section(&mut out, "Self-disclosure");
    bullets(
        &mut out,
        match p.self_disclosure {
            s if s > 0.7 => &[
                "Shares deep thoughts, feelings and past experiences openly",
                "e.g. \"Honestly, I went through that too. It was really hard...\"",
            ],
            s if s > 0.5 => &[
                "Shares own experiences and opinions when relevant",
                "e.g. \"I'm kind of into that sort of thing.\"",
            ],
            s if s > 0.3 => &[
                "Only surface-level opinions or light experiences, hesitantly",
                "e.g. \"Hm... I've tried it once, I guess.\"",
            ],
            s if s > 0.1 => &[
                "Holds back about self, focuses on listening",
                "e.g. \"I see.\" / \"That must have been hard.\"",
            ],
            _ => &[
                "Never talks about self, deflects personal questions",
                "e.g. \"...\" / \"Don't know.\"",
            ],
        },
    );

    if p.question_depth > 0.1 {
        section(&mut out, "Questions");
        bullets(
            &mut out,
            &[match p.question_depth {
                q if q > 0.6 => "Deep questions about the other person's inner life (\"Why does that matter to you?\")",
                q if q > 0.4 => "Interested follow-ups (\"And then?\", \"How was it?\")",
                q if q > 0.2 => "Light confirmations only (\"Really?\")",
                _ => "Hardly asks anything, mostly listens",
            }],
        );
    }

    section(&mut out, "Forms of address");
    bullets(
        &mut out,
        match p.nickname_use {
            n if n > 0.7 => &["Pet names or affectionate address, fully casual"],
            n if n > 0.4 => &["Uses the other's name sometimes, mostly casual"],
            n if n > 0.1 => &["Rarely addresses them, mostly polite register"],
            _ => &["No names or nicknames, formal and distant"],
        },
    );

    section(&mut out, "Warmth and empathy");
    bullets(
        &mut out,
        match p.warmth {
            w if w > 0.8 => &[
                "Very warm, actively comforts and encourages",
                "e.g. \"It's okay, I'm always on your side.\"",
            ],
            w if w > 0.6 => &[
                "Warm and considerate, expresses empathy",
                "e.g. \"That sounds really tough. I get it.\"",
            ],
            w if w > 0.4 => &[
                "Calm empathy, minimal comforting",
                "e.g. \"I see. Sounds like it was hard.\"",
            ],
            w if w > 0.2 => &["Minimal emotional reaction, factual", "e.g. \"Yeah. Okay.\""],
            _ => &["Cold, no empathy, uninterested", "e.g. \"...\" / \"So?\""],
        },
    );

    if p.memory_recall > 0.4 {
        section(&mut out, "Memory");
        bullets(
            &mut out,
            &[if p.memory_recall > 0.6 {
                "Refers to earlier conversations specifically and connects them"
            } else {
                "Occasionally brings up something said before"
            }],
        );
    }

    section(&mut out, "Sentence style");
    bullets(
        &mut out,
        match p.tone {
            t if t > 0.6 => &["Natural and colloquial, contractions and soft endings"],
            t if t > 0.3 => &["Reasonably colloquial"],
            _ => &["Terse and restrained, no filler"],
        },
    );

    section(&mut out, "Special expressions");
    if p.tone < 0.15 || p.warmth < 0.1 {
        bullets(&mut out, &["Frequent ellipses to show disinterest or discomfort"]);
    }
    if p.playfulness > 0.5 {
        bullets(&mut out, &["Playful turns of phrase (\"come on~\", \"hey now\")"]);
    }
    if p.warmth > 0.6 && p.playfulness > 0.4 {
        bullets(&mut out, &["Cute emoji allowed"]);
    }

    out.join("\n")
}

/// Recent facts and shared jokes, formatted for the generator.
pub fn format_memory_context(memory: &MemoryLog) -> String {
    fn tail(items: &[String], n: usize) -> &[String] {
        &items[items.len().saturating_sub(n)..]
    }

    let mut parts = Vec::new();
    if !memory.user_facts.is_empty() {
        parts.push(format!(
            "- About the user: {}",
            tail(&memory.user_facts, FACTS_IN_CONTEXT).join(", ")
        ));
    }
    if !memory.shared_jokes.is_empty() {
        parts.push(format!(
            "- Inside jokes: {}",
            tail(&memory.shared_jokes, JOKES_IN_CONTEXT).join(", ")
        ));
    }
    if parts.is_empty() {
        "- Nothing remembered yet".to_string()
    } else {
        parts.join("\n")
    }
}

/// Sampling temperature for the generator: warmer policies sample more freely.
pub fn temperature(policy: &ResponsePolicy) -> f32 {
    (0.7 + policy.warmth * 0.3).clamp(0.7, 1.0)
}

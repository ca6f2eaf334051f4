use super::*;

#[test]
fn parses_plain_array() {
    let reply = r#"[{"title":"Qubits","content":"Two-level systems."},{"title":"Gates","content":"Unitary ops."}]"#;
    let sections = parse_sections(reply);
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0], Section { title: "Qubits".into(), content: "Two-level systems.".into() });
    assert_eq!(sections[1].title, "Gates");
}

#[test]
fn parses_fenced_array_with_prose() {
    let reply = "Here you go:\n```json\n[{\"title\":\"A\",\"content\":\"x\"}]\n```\nEnjoy.";
    let sections = parse_sections(reply);
    assert_eq!(sections, vec![Section { title: "A".into(), content: "x".into() }]);
}

#[test]
fn discards_elements_missing_title_or_content() {
    let reply = r#"[
        {"title":"Keep","content":"yes"},
        {"title":"","content":"empty title"},
        {"title":"No content"},
        {"content":"no title"},
        {"title":42,"content":"numeric title"},
        "not an object"
    ]"#;
    let sections = parse_sections(reply);
    assert_eq!(sections, vec![Section { title: "Keep".into(), content: "yes".into() }]);
}

#[test]
fn no_brackets_falls_back_to_raw_text() {
    let reply = "```\nJust a paragraph of text.\n```";
    let sections = parse_sections(reply);
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].title, FALLBACK_SECTION_TITLE);
    assert_eq!(sections[0].content, "Just a paragraph of text.");
}

#[test]
fn undecodable_json_falls_back() {
    let reply = "[not, valid json]";
    let sections = parse_sections(reply);
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].content, "[not, valid json]");
}

#[test]
fn zero_valid_elements_falls_back() {
    let reply = r#"[{"title":"","content":""}]"#;
    let sections = parse_sections(reply);
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].title, FALLBACK_SECTION_TITLE);
    assert_eq!(sections[0].content, reply);
}

#[test]
fn reversed_brackets_fall_back() {
    let sections = parse_sections("] then [");
    assert_eq!(sections[0].content, "] then [");
}

#[test]
fn expand_messages_appends_instruction() {
    let convo = vec![ChatMessage::user("q"), ChatMessage::assistant("a")];
    let msgs = expand_messages(&convo);
    assert_eq!(msgs.len(), 3);
    assert_eq!(msgs[2].content, EXPAND_INSTRUCTION);
}

#[test]
fn markdown_rendering_joins_sections() {
    let md = sections_markdown(&[
        Section { title: "One".into(), content: "first".into() },
        Section { title: "Two".into(), content: "second".into() },
    ]);
    assert_eq!(md, "### One\n\nfirst\n\n### Two\n\nsecond");
}

use careers_acceptance::ParsedDescription;

#[test]
fn test_second_bullet_under_header() {
    let html = r#"<h2>Main responsibilities include</h2><ul><li>First bullet</li><li>Second bullet - Important responsibility</li></ul>"#;
    let parsed = ParsedDescription::parse(html).unwrap();
    assert_eq!(
        parsed.second_bullet_for("Main responsibilities include"),
        Some("Second bullet - Important responsibility")
    );
}

#[test]
fn test_third_paragraph_first_sentence() {
    let html = r#"
        <p>Intro text here.</p>
        <p>Second paragraph goes here.</p>
        <p>The right candidate for this role will participate in the test automation technology development. They will work cross-functionally.</p>
    "#;
    let parsed = ParsedDescription::parse(html).unwrap();
    assert_eq!(
        parsed.third_paragraph_first_sentence(),
        Some("The right candidate for this role will participate in the test automation technology development.")
    );
}

#[test]
fn test_single_item_list_has_no_second_bullet() {
    let html = "<h3>Benefits</h3><ul><li>Only one</li></ul>";
    let parsed = ParsedDescription::parse(html).unwrap();
    assert_eq!(parsed.second_bullet_for("Benefits"), None);
    assert_eq!(parsed.headers().count(), 0);
}

#[test]
fn test_unknown_header_is_absent() {
    let html = "<h3>Skills</h3><ul><li>Rust</li><li>SQL</li></ul>";
    let parsed = ParsedDescription::parse(html).unwrap();
    assert_eq!(parsed.second_bullet_for("Education"), None);
}

#[test]
fn test_header_lookup_ignores_case() {
    let html = "<h3>Skills</h3><ul><li>Rust</li><li>SQL</li></ul>";
    let parsed = ParsedDescription::parse(html).unwrap();
    assert_eq!(parsed.second_bullet_for("SKILLS"), Some("SQL"));
    assert_eq!(parsed.second_bullet_for("skills"), Some("SQL"));
}

#[test]
fn test_fewer_than_three_paragraphs() {
    let parsed = ParsedDescription::parse("<p>One.</p><p>Two.</p>").unwrap();
    assert_eq!(parsed.third_paragraph_first_sentence(), None);
}

#[test]
fn test_paragraph_without_sentence_boundary_is_returned_whole() {
    let html = "<p>a</p><p>b</p><p>No terminal period here</p>";
    let parsed = ParsedDescription::parse(html).unwrap();
    assert_eq!(
        parsed.third_paragraph_first_sentence(),
        Some("No terminal period here")
    );
}

#[test]
fn test_escaped_description_from_structured_data() {
    let escaped = "&lt;p&gt;Intro.&lt;/p&gt;&lt;p&gt;&amp;nbsp;&lt;/p&gt;&lt;p&gt;Second.&lt;/p&gt;\
        &lt;p&gt;Third one. Tail.&lt;/p&gt;\
        &lt;p&gt;&lt;b&gt;What you bring&lt;/b&gt;&lt;/p&gt;\
        &lt;ul&gt;&lt;li&gt;Curiosity&lt;/li&gt;&lt;li&gt;Test &amp;amp; automation skills&lt;/li&gt;&lt;/ul&gt;";
    let parsed = ParsedDescription::parse(escaped).unwrap();
    println!("Parsed: {:?}", parsed);

    assert_eq!(parsed.third_paragraph_first_sentence(), Some("Third one."));
    assert_eq!(
        parsed.second_bullet_for("What you bring"),
        Some("Test & automation skills")
    );
}

#[test]
fn test_parse_is_deterministic() {
    let html = r#"
        <p>One.</p><p>Two.</p><p>Three. Four.</p>
        <h4>Requirements</h4>
        <ul><li>A</li><li>B</li></ul>
        <h4>Nice to have</h4>
        <ul><li>C</li><li>D</li><li>E</li></ul>
    "#;
    let first = ParsedDescription::parse(html).unwrap();
    let second = ParsedDescription::parse(html).unwrap();
    assert_eq!(first, second);

    let mut headers: Vec<&str> = first.headers().collect();
    headers.sort();
    assert_eq!(headers, vec!["nice to have", "requirements"]);
}

#[test]
fn test_parse_is_safe_across_threads() {
    let html = "<p>1.</p><p>2.</p><p>Shared text. More.</p><h3>Team</h3><ul><li>x</li><li>y</li></ul>";
    let handles: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(move || ParsedDescription::parse(html).unwrap()))
        .collect();
    for handle in handles {
        let parsed = handle.join().unwrap();
        assert_eq!(parsed.third_paragraph_first_sentence(), Some("Shared text."));
        assert_eq!(parsed.second_bullet_for("team"), Some("y"));
    }
}

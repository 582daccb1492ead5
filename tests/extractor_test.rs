//! Extraction tests against synthetic result-page markup.

use serpgrab::extractor::{PageExtraction, extract_page};

fn organic_block(n: usize) -> String {
    format!(
        r#"<div class="g">
            <div class="yuRUbf">
                <a href="https://site{n}.example.com/page{n}"><h3>Result title {n}</h3></a>
            </div>
            <div class="VwiC3b">Snippet text for result {n} with enough words.</div>
        </div>"#
    )
}

fn page_with(blocks: &[String], extra: &str) -> String {
    format!(
        "<html><body><div id=\"search\">{}{extra}</div></body></html>",
        blocks.join("\n")
    )
}

fn extract(html: &str) -> PageExtraction {
    extract_page(html, "google.com", true, 0)
}

#[test]
fn well_formed_results_get_sequential_positions() {
    let blocks: Vec<String> = (1..=8).map(organic_block).collect();
    let extraction = extract(&page_with(&blocks, ""));

    assert_eq!(extraction.organic.len(), 8);
    for (index, result) in extraction.organic.iter().enumerate() {
        assert_eq!(result.position, index + 1);
        assert_eq!(result.title, format!("Result title {}", index + 1));
        assert_eq!(result.domain, format!("site{}.example.com", index + 1));
        assert!(result.snippet.contains("Snippet text"));
    }
}

#[test]
fn partial_blocks_are_skipped_without_consuming_a_rank() {
    let mut blocks: Vec<String> = (1..=3).map(organic_block).collect();
    // No title element
    blocks.push(
        r#"<div class="g"><a href="https://no-title.example.com/x">bare link</a></div>"#
            .to_string(),
    );
    // No usable link
    blocks.push(r#"<div class="g"><h3>Title without a link</h3></div>"#.to_string());
    blocks.push(organic_block(6));

    let extraction = extract(&page_with(&blocks, ""));

    assert_eq!(extraction.organic.len(), 4);
    assert_eq!(extraction.organic[3].position, 4);
    assert_eq!(extraction.organic[3].domain, "site6.example.com");
}

#[test]
fn redirect_wrapped_links_are_unwrapped() {
    let blocks = vec![
        organic_block(1),
        organic_block(2),
        r#"<div class="g">
            <a href="/url?q=https%3A%2F%2Fwrapped.example.com%2Fdeep%2Fpage&amp;sa=U&amp;ved=x">
                <h3>Wrapped result</h3>
            </a>
        </div>"#
            .to_string(),
    ];
    let extraction = extract(&page_with(&blocks, ""));

    let wrapped = extraction
        .organic
        .iter()
        .find(|r| r.title == "Wrapped result")
        .expect("wrapped result extracted");
    assert_eq!(wrapped.url, "https://wrapped.example.com/deep/page");
    assert_eq!(wrapped.domain, "wrapped.example.com");
}

#[test]
fn engine_internal_links_do_not_become_results() {
    let blocks = vec![
        organic_block(1),
        organic_block(2),
        r#"<div class="g">
            <a href="https://www.google.com/search?q=more"><h3>More results</h3></a>
        </div>"#
            .to_string(),
    ];
    let extraction = extract(&page_with(&blocks, ""));

    assert_eq!(extraction.organic.len(), 2);
    assert!(extraction.organic.iter().all(|r| r.domain != "google.com"));
}

#[test]
fn widgets_are_collected_on_the_first_page_only() {
    let blocks: Vec<String> = (1..=3).map(organic_block).collect();
    let widgets = r#"
        <div class="xpdopen"><div class="hgKElc">A featured answer with plenty of explanatory text in it.</div></div>
        <div class="related-question-pair">What are the best running shoes?</div>
        <div class="related-question-pair">How much do running shoes cost?</div>
        <div class="k8XOCe">running shoes for women</div>
        <div class="k8XOCe">running shoes sale</div>
    "#;
    let html = page_with(&blocks, widgets);

    let first = extract_page(&html, "google.com", true, 0);
    assert!(first.featured_snippet.is_some());
    assert_eq!(
        first.featured_snippet.unwrap().text,
        "A featured answer with plenty of explanatory text in it."
    );
    assert_eq!(first.people_also_ask.len(), 2);
    assert!(first.people_also_ask[0].contains('?'));
    assert_eq!(
        first.related_searches,
        vec!["running shoes for women", "running shoes sale"]
    );

    let second = extract_page(&html, "google.com", false, 10);
    assert!(second.featured_snippet.is_none());
    assert!(second.people_also_ask.is_empty());
    assert!(second.related_searches.is_empty());
    // Offset carries ranks across pages
    assert_eq!(second.organic[0].position, 11);
}

#[test]
fn container_cascade_falls_through_to_newer_layouts() {
    // No div.g at all; the MjjYud layout should be picked up instead
    let blocks: Vec<String> = (1..=4)
        .map(|n| {
            format!(
                r#"<div class="MjjYud">
                    <a href="https://site{n}.example.com/"><h3>Heading {n}</h3></a>
                </div>"#
            )
        })
        .collect();
    let extraction = extract(&page_with(&blocks, ""));

    assert_eq!(extraction.organic.len(), 4);
    assert_eq!(extraction.organic[0].title, "Heading 1");
}

#[test]
fn a_page_with_no_recognizable_containers_yields_nothing() {
    let extraction = extract("<html><body><p>nothing here</p></body></html>");
    assert!(extraction.organic.is_empty());
    assert!(extraction.featured_snippet.is_none());
}

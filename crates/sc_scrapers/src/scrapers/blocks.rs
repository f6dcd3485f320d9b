//! Turns article HTML into flat [`ContentBlock`] sequences.

use scraper::{ElementRef, Html};
use sc_core::{ContentBlock, Error, Result};

use super::{selector, text_of};

/// Headings and paragraphs under `container`, in document order.
///
/// `heading` maps an `h2`..`h4` level to the block the source uses for it.
pub(crate) fn body_blocks(
    document: &Html,
    container: &str,
    heading: fn(u8, String) -> ContentBlock,
) -> Result<Vec<ContentBlock>> {
    let container_sel = selector(container)?;
    let root = document
        .select(&container_sel)
        .next()
        .ok_or_else(|| Error::Parse(format!("No article content found in '{}'", container)))?;

    let items = selector("h2, h3, h4, p")?;
    let mut blocks = Vec::new();
    for element in root.select(&items) {
        let text = text_of(element);
        if text.is_empty() {
            continue;
        }
        let block = match element.value().name() {
            "h2" => heading(2, text),
            "h3" => heading(3, text),
            "h4" => heading(4, text),
            _ => ContentBlock::Text(text),
        };
        blocks.push(block);
    }
    Ok(blocks)
}

/// A paragraph that may open with a bold label such as `Background:`.
pub(crate) fn labelled_paragraph(paragraph: ElementRef<'_>) -> Result<Vec<ContentBlock>> {
    let strong = selector("strong")?;
    let text = text_of(paragraph);
    let label = paragraph
        .select(&strong)
        .next()
        .map(text_of)
        .filter(|l| !l.is_empty());

    let mut blocks = Vec::new();
    match label {
        Some(label) => {
            let rest = text.strip_prefix(label.as_str()).unwrap_or(&text).trim().to_string();
            blocks.push(ContentBlock::Subsubsubheading(label));
            if !rest.is_empty() {
                blocks.push(ContentBlock::Text(rest));
            }
        }
        None if !text.is_empty() => blocks.push(ContentBlock::Text(text)),
        None => {}
    }
    Ok(blocks)
}

/// Keeps the first occurrence of each name.
pub(crate) fn dedupe(names: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(names.len());
    for name in names {
        if !name.is_empty() && !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"
        <html><body>
          <h1>Outside</h1>
          <div class="article-text">
            <h2>Introduction</h2>
            <p>First paragraph.</p>
            <h3>Cohort</h3>
            <p>   </p>
            <h4>Inclusion</h4>
            <p>Adults only.</p>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_body_blocks_in_document_order() {
        let document = Html::parse_document(BODY);
        let blocks = body_blocks(&document, "div.article-text", ContentBlock::heading).unwrap();
        assert_eq!(
            blocks,
            vec![
                ContentBlock::Subheading("Introduction".into()),
                ContentBlock::Text("First paragraph.".into()),
                ContentBlock::Subsubheading("Cohort".into()),
                ContentBlock::Subsubsubheading("Inclusion".into()),
                ContentBlock::Text("Adults only.".into()),
            ]
        );
    }

    #[test]
    fn test_body_blocks_missing_container() {
        let document = Html::parse_document(BODY);
        let err = body_blocks(&document, "div.fulltext", ContentBlock::heading).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_labelled_paragraph_splits_label() {
        let document = Html::parse_fragment("<p><strong>Methods:</strong> We enrolled 40 patients.</p>");
        let p = document.select(&selector("p").unwrap()).next().unwrap();
        assert_eq!(
            labelled_paragraph(p).unwrap(),
            vec![
                ContentBlock::Subsubsubheading("Methods:".into()),
                ContentBlock::Text("We enrolled 40 patients.".into()),
            ]
        );
    }

    #[test]
    fn test_dedupe_keeps_order() {
        let names = vec!["Li W".to_string(), "Smith J".to_string(), "Li W".to_string(), String::new()];
        assert_eq!(dedupe(names), vec!["Li W", "Smith J"]);
    }
}

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

static CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th, td").unwrap());
static BOLD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("b").unwrap());
static SPAN_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());
static FORM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("form").unwrap());
static INPUT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("input").unwrap());

/// Data cell that mixes a labelled span with free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeCell {
    /// Text of the first span whose class starts with the requested prefix.
    pub span_text: Option<String>,
    /// Whole cell text, pieces trimmed and joined by single spaces.
    pub cell_text: String,
}

/// Narrow lookups over loosely structured table markup.
///
/// Header matching is substring containment and the first matching header
/// wins, so a header like "zFTP (old)" placed before "zFTP" shadows it.
pub trait DocumentQuery {
    /// Value of the data cell following the first header containing `label`.
    /// A bold element inside the cell takes precedence over the full text.
    fn find_labeled_value(&self, label: &str) -> Option<String>;

    fn find_composite_cell(&self, label: &str, span_class_prefix: &str) -> Option<CompositeCell>;
}

/// Name/value pairs of a form plus its submission target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub action: String,
    fields: Vec<(String, String)>,
}

impl LoginForm {
    pub fn new(action: impl Into<String>) -> Self {
        LoginForm {
            action: action.into(),
            fields: Vec::new(),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Overwrite a field in place, or append it.
    pub fn set(&mut self, name: &str, value: &str) {
        if let Some(existing) = self.fields.iter_mut().find(|(n, _)| n == name) {
            existing.1 = value.to_string();
        } else {
            self.fields.push((name.to_string(), value.to_string()));
        }
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Parsed HTML page.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(html: &str) -> Self {
        HtmlDocument {
            html: Html::parse_document(html),
        }
    }

    /// First `<form>` on the page, with every named input. `None` when there
    /// is no form or it has no action.
    pub fn first_form(&self) -> Option<LoginForm> {
        let form = self.html.select(&FORM_SELECTOR).next()?;
        let action = form.value().attr("action").map(str::trim).filter(|a| !a.is_empty())?;

        let mut login_form = LoginForm::new(action);
        for input in form.select(&INPUT_SELECTOR) {
            let Some(name) = input.value().attr("name").filter(|n| !n.is_empty()) else {
                continue;
            };
            login_form.set(name, input.value().attr("value").unwrap_or_default());
        }
        Some(login_form)
    }

    /// The first `<td>` after the first `<th>` containing `label`, in document order.
    fn cell_after_header(&self, label: &str) -> Option<ElementRef<'_>> {
        let mut cells = self.html.select(&CELL_SELECTOR);
        cells.find(|el| el.value().name() == "th" && el.text().collect::<String>().contains(label))?;
        cells.find(|el| el.value().name() == "td")
    }
}

impl DocumentQuery for HtmlDocument {
    fn find_labeled_value(&self, label: &str) -> Option<String> {
        let td = self.cell_after_header(label)?;
        match td.select(&BOLD_SELECTOR).next() {
            Some(bold) => Some(stripped_text(bold)),
            None => Some(stripped_text(td)),
        }
    }

    fn find_composite_cell(&self, label: &str, span_class_prefix: &str) -> Option<CompositeCell> {
        let td = self.cell_after_header(label)?;
        let span_text = td
            .select(&SPAN_SELECTOR)
            .find(|span| span.value().classes().any(|c| c.starts_with(span_class_prefix)))
            .map(stripped_text);

        Some(CompositeCell {
            span_text,
            cell_text: spaced_text(td),
        })
    }
}

/// Text nodes trimmed and concatenated.
fn stripped_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect()
}

/// Text nodes trimmed, empties dropped, joined by one space.
fn spaced_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

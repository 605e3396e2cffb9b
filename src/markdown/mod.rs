//! Markdown to HTML rendering
//!
//! A line-oriented formatter for model replies. It recognises headers,
//! horizontal rules, pipe tables, bullet lists, paragraphs and the bold /
//! italic inline markers. There is no nesting and no error recovery: every
//! line is classified on its own, with only "inside a list" and "inside a
//! table" carried between lines.

use std::sync::LazyLock;

use regex::Regex;

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(\*|-)\s+(.*)").expect("valid list regex"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold regex"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("valid italic regex"));

const H1_OPEN: &str = r#"<h1 class="text-3xl font-bold text-indigo-300 mt-8 mb-4">"#;
const H2_OPEN: &str = r#"<h2 class="text-2xl font-semibold text-indigo-400 mt-6 mb-3 border-b border-indigo-700 pb-1">"#;
const H3_OPEN: &str = r#"<h3 class="text-xl font-medium text-gray-200 mt-4 mb-2">"#;
const HR: &str = r#"<hr class="border-slate-600 my-4">"#;
const TABLE_OPEN: &str = r#"<table class="w-full my-4 text-left border-collapse">"#;
const TH_OPEN: &str =
    r#"<th class="p-2 border-b-2 border-slate-600 bg-slate-700 text-indigo-300 font-semibold">"#;
const TR_OPEN: &str = r#"<tr class="border-t border-slate-700 hover:bg-slate-700/50">"#;
const TD_OPEN: &str = r#"<td class="p-2">"#;
const UL_OPEN: &str = r#"<ul class="list-disc pl-5 mt-2 space-y-1">"#;
const P_OPEN: &str = r#"<p class="mb-3">"#;

/// Render model markdown into HTML fragments joined by newlines.
///
/// Empty input yields an empty string.
pub fn render_markdown_as_html(markdown: &str) -> String {
    if markdown.is_empty() {
        return String::new();
    }

    let lines: Vec<&str> = markdown.split('\n').collect();
    let mut out = Renderer::default();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        i += 1;

        if let Some((open, close, rest)) = header(line) {
            out.end_list();
            out.end_table();
            out.push(format!("{open}{}{close}", process_inline(rest)));
            continue;
        }

        if line.trim() == "---" {
            out.end_list();
            out.end_table();
            out.push(HR.to_string());
            continue;
        }

        if line.starts_with('|') {
            out.end_list();
            let cells = table_cells(line);
            if cells.is_empty() {
                continue;
            }

            if !out.in_table {
                out.in_table = true;
                out.push(TABLE_OPEN.to_string());
                out.push("<thead><tr>".to_string());
                for cell in &cells {
                    out.push(format!("{TH_OPEN}{}</th>", process_inline(cell)));
                }
                out.push("</tr></thead><tbody>".to_string());

                // separator row directly under the header
                if lines.get(i).is_some_and(|next| next.contains("---")) {
                    i += 1;
                }
            } else {
                out.push(TR_OPEN.to_string());
                for cell in &cells {
                    out.push(format!("{TD_OPEN}{}</td>", process_inline(cell)));
                }
                out.push("</tr>".to_string());
            }
            continue;
        } else if out.in_table {
            out.end_table();
        }

        if let Some(caps) = LIST_ITEM.captures(line) {
            out.end_table();
            if !out.in_list {
                out.push(UL_OPEN.to_string());
                out.in_list = true;
            }
            let item = caps.get(3).map_or("", |m| m.as_str());
            out.push(format!("<li>{}</li>", process_inline(item)));
            continue;
        } else if out.in_list {
            out.end_list();
        }

        if !line.trim().is_empty() {
            out.end_list();
            out.end_table();
            out.push(format!("{P_OPEN}{}</p>", process_inline(line)));
        }
    }

    out.end_list();
    out.end_table();
    out.html.join("\n")
}

#[derive(Default)]
struct Renderer {
    html: Vec<String>,
    in_list: bool,
    in_table: bool,
}

impl Renderer {
    fn push(&mut self, fragment: String) {
        self.html.push(fragment);
    }

    fn end_list(&mut self) {
        if self.in_list {
            self.html.push("</ul>".to_string());
            self.in_list = false;
        }
    }

    fn end_table(&mut self) {
        if self.in_table {
            self.html.push("</tbody></table>".to_string());
            self.in_table = false;
        }
    }
}

/// Longest marker first, so `### ` is never read as `# `.
fn header(line: &str) -> Option<(&'static str, &'static str, &str)> {
    if let Some(rest) = line.strip_prefix("### ") {
        Some((H3_OPEN, "</h3>", rest))
    } else if let Some(rest) = line.strip_prefix("## ") {
        Some((H2_OPEN, "</h2>", rest))
    } else {
        line.strip_prefix("# ").map(|rest| (H1_OPEN, "</h1>", rest))
    }
}

/// Trimmed pieces between pipes, minus the first and the last piece.
/// `| a | b` therefore yields only `a`.
fn table_cells(line: &str) -> Vec<&str> {
    let pieces: Vec<&str> = line.split('|').map(str::trim).collect();
    if pieces.len() < 2 {
        return Vec::new();
    }
    pieces[1..pieces.len() - 1].to_vec()
}

/// Escape markup, then apply bold and italic markers.
pub fn process_inline(text: &str) -> String {
    let escaped = escape_html(text);
    let bold = BOLD.replace_all(&escaped, "<strong>$1</strong>");
    ITALIC.replace_all(&bold, "<em>$1</em>").into_owned()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

use comrak::nodes::{AstNode, NodeValue};
use comrak::{Arena, Options, format_html, parse_document};

/// Converts markdown source into an HTML fragment. Raw HTML in the source
/// passes through unsanitized; journal entries are trusted input.
pub fn render_markdown(markdown: &str) -> String {
    let options = options();
    let arena = Arena::new();
    let root = parse_document(&arena, markdown, &options);

    let mut html = String::new();
    format_html(root, &options, &mut html).expect("writing to String cannot fail");
    html
}

/// Strips markdown syntax, leaving the plain text. Malformed markdown
/// degrades to whatever text the parser recovers; this never fails.
pub fn plain_text(markdown: &str) -> String {
    let options = options();
    let arena = Arena::new();
    let root = parse_document(&arena, markdown, &options);

    let mut text = String::new();
    collect(root, &mut text);
    text.trim().to_string()
}

fn options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.strikethrough = true;
    options.render.hardbreaks = false;
    options.render.github_pre_lang = true;
    options.render.r#unsafe = true;
    options.render.width = 0;
    options
}

fn collect<'a>(node: &'a AstNode<'a>, buf: &mut String) {
    use NodeValue::*;
    let value = node.data.borrow();
    match &value.value {
        Text(literal) => buf.push_str(literal),
        Code(code) => buf.push_str(&code.literal),
        SoftBreak | LineBreak => buf.push(' '),
        CodeBlock(code) => {
            buf.push_str(&code.literal);
            buf.push(' ');
        }
        Paragraph | Heading(_) => {
            for child in node.children() {
                collect(child, buf);
            }
            buf.push(' ');
        }
        _ => {
            for child in node.children() {
                collect(child, buf);
            }
        }
    }
}

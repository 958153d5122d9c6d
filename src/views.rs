/// Pages embedded into the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Map,
    Game,
    Error,
}

impl Template {
    pub fn source(&self) -> &'static str {
        match self {
            Template::Map => include_str!("../web/map.html"),
            Template::Game => include_str!("../web/game.html"),
            Template::Error => include_str!("../web/error.html"),
        }
    }
}

/// Render a page, replacing `{{ name }}` with the escaped value bound to
/// `name`. Unbound placeholders render empty.
pub fn render(template: Template, context: &[(&str, String)]) -> String {
    let source = template.source();
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find("}}") {
            Some(end) => {
                let name = after[..end].trim();
                if let Some((_, value)) = context.iter().find(|(key, _)| *key == name) {
                    push_escaped(&mut out, value);
                }
                rest = &after[end + 2..];
            }
            None => {
                // Unterminated: emit verbatim
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out
}

fn push_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
}
